use anyhow::{Context, Result};
use tracing::{error, warn};

use traj_stitch::{ReplicateReport, Settings, StitchError, Summary, reconcile_all, reconcile_replicate};

use crate::cli::StitchArgs;
use crate::config::{build_stitch_config, resolve_threads};
use crate::display::{Context as DisplayContext, Progress, UnitRow, print_unit_table, unit_hints};
use crate::util::path::display_name;
use crate::util::text::plural;

use super::report_summary;

const TOTAL_STEPS: u8 = 1;

pub fn run_stitch(args: StitchArgs, settings: &Settings, ctx: DisplayContext) -> Result<Summary> {
    let config = build_stitch_config(&args, settings);
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    if !args.all {
        let description = format!("Stitching {}", display_name(&args.dir));
        progress.step(&description);

        let report = reconcile_replicate(&args.dir, &config)
            .with_context(|| format!("Failed to stitch {}", args.dir.display()))?;
        summary.record_success(&report.exclusions);

        progress.complete_step(&description, &run_lines(&report));
        progress.finish("Stitch", false);
        report_summary(&summary, ctx);
        return Ok(summary);
    }

    let threads = resolve_threads(args.threads, settings);
    let description = format!("Stitching replicates under {}", display_name(&args.dir));
    progress.step(&description);

    let results = reconcile_all(&args.dir, &config, threads)
        .with_context(|| format!("Failed to stitch replicates under {}", args.dir.display()))?;

    let mut substeps = Vec::new();
    let mut rows = Vec::new();
    for result in &results {
        match &result.outcome {
            Ok(report) => {
                summary.record_success(&report.exclusions);
                substeps.push(replicate_line(report));
                rows.push(UnitRow {
                    unit: result.unit.clone(),
                    count: report.total_frames.to_string(),
                    status: replicate_status(report),
                });
            }
            Err(err) => {
                summary.record_failure();
                log_failure(&result.unit, err);
                rows.push(UnitRow {
                    unit: result.unit.clone(),
                    count: "-".to_string(),
                    status: format!("failed ({})", err.category()),
                });
            }
        }
    }

    progress.complete_step(&description, &substeps);
    progress.finish("Stitch", summary.has_failures());

    if ctx.interactive {
        print_unit_table("Replicates", "Frames", &rows);
    }
    report_summary(&summary, ctx);
    Ok(summary)
}

pub(super) fn log_failure(unit: &str, err: &StitchError) {
    error!(unit, category = err.category(), "{err}");
    for hint in unit_hints(err) {
        warn!(unit, "hint: {hint}");
    }
}

fn run_lines(report: &ReplicateReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .runs
        .iter()
        .map(|run| match (run.coords.first_kept, run.coords.last_kept) {
            (Some(first), Some(last)) => format!(
                "{}: kept frames {}..={} ({} dropped)",
                run.name,
                first,
                last,
                run.coords.dropped()
            ),
            _ => format!("{}: nothing kept", run.name),
        })
        .collect();
    lines.extend(report.exclusions.iter().map(|e| format!("excluded: {e}")));
    lines.extend(
        report
            .removed
            .iter()
            .map(|dir| format!("removed {}", display_name(dir))),
    );
    lines.push(format!(
        "{} written, watermark {}",
        plural(report.frames, "frame"),
        report.watermark
    ));
    lines
}

fn replicate_line(report: &ReplicateReport) -> String {
    format!(
        "{}: {} from {}",
        report.name,
        plural(report.frames, "frame"),
        plural(report.runs.len(), "run")
    )
}

fn replicate_status(report: &ReplicateReport) -> String {
    match report.exclusions.len() {
        0 => "ok".to_string(),
        n => format!("ok, {}", plural(n, "exclusion")),
    }
}
