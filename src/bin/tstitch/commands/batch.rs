use anyhow::{Context, Result};

use traj_stitch::{
    JobRange, Settings, Summary, combine_qm_charges, gather_single_points, merge_replicates,
};

use crate::cli::{GatherArgs, MergeArgs, QmChargesArgs};
use crate::config::{build_gather_config, build_merge_config, build_qm_charge_config};
use crate::display::{Context as DisplayContext, Progress, UnitRow, print_kv_table, print_unit_table};
use crate::util::path::display_name;
use crate::util::text::plural;

use super::report_summary;
use super::stitch::log_failure;

pub fn run_merge(args: MergeArgs, settings: &Settings, ctx: DisplayContext) -> Result<Summary> {
    let config = build_merge_config(&args, settings);
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = format!("Merging replicates under {}", display_name(&args.root));
    progress.step(&description);

    let report = merge_replicates(&args.root, &config)
        .with_context(|| format!("Failed to merge replicates under {}", args.root.display()))?;
    summary.processed = report.replicates.len();
    summary.record_exclusions(&report.exclusions);

    let substeps: Vec<String> = report
        .replicates
        .iter()
        .map(|rep| match rep.dropped {
            0 => format!("{}: {}", rep.name, plural(rep.rows, "frame")),
            n => format!("{}: {} ({} dropped)", rep.name, plural(rep.rows, "frame"), n),
        })
        .chain(report.exclusions.iter().filter(|e| e.is_skip()).map(|e| e.to_string()))
        .collect();
    progress.complete_step(&description, &substeps);
    progress.finish("Merge", false);

    if ctx.interactive {
        print_kv_table(
            "Master Dataset",
            &[
                ("Replicates", report.replicates.len().to_string()),
                ("Charge rows", report.rows.to_string()),
                ("Stray headers", report.stray_headers.to_string()),
                ("Coordinates", display_name(&report.coords_path)),
                ("Charges", display_name(&report.charges_path)),
            ],
        );
    }
    report_summary(&summary, ctx);
    Ok(summary)
}

pub fn run_gather(args: GatherArgs, settings: &Settings, ctx: DisplayContext) -> Result<Summary> {
    let config = build_gather_config(&args, settings);
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = "Gathering single-point structures";
    progress.step(description);

    let report = gather_single_points(&args.root, &config)
        .with_context(|| format!("Failed to gather structures under {}", args.root.display()))?;
    summary.processed = report.replicates.len();
    summary.record_exclusions(&report.exclusions);

    let substeps: Vec<String> = report
        .replicates
        .iter()
        .map(|(name, count)| format!("{}: {}", name, plural(*count, "structure")))
        .collect();
    progress.complete_step(description, &substeps);
    progress.finish("Gather", false);

    if ctx.interactive {
        print_kv_table(
            "Geometry Trajectory",
            &[
                ("Replicates", report.replicates.len().to_string()),
                ("Structures", report.total.to_string()),
                ("Output", display_name(&report.output)),
            ],
        );
    }
    report_summary(&summary, ctx);
    Ok(summary)
}

pub fn run_qm_charges(
    args: QmChargesArgs,
    settings: &Settings,
    ctx: DisplayContext,
) -> Result<Summary> {
    let config = build_qm_charge_config(&args, settings);
    let range = JobRange::new(args.first, args.last, args.step)?;
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = format!("Combining charges of {}", plural(range.len(), "job"));
    progress.step(&description);

    let results = combine_qm_charges(&args.root, &range, &config)
        .with_context(|| format!("Failed to combine charges under {}", args.root.display()))?;

    let mut rows = Vec::with_capacity(results.len());
    for result in &results {
        match &result.outcome {
            Ok(report) => {
                summary.record_success(&report.exclusions);
                rows.push(UnitRow {
                    unit: result.unit.clone(),
                    count: report.frames.to_string(),
                    status: if report.exclusions.is_empty() {
                        "ok".to_string()
                    } else {
                        format!("ok, {}", plural(report.exclusions.len(), "exclusion"))
                    },
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

    progress.complete_step(&description, &[]);
    progress.finish("Charge combination", summary.has_failures());

    if ctx.interactive {
        print_unit_table("Replicates", "Jobs", &rows);
    }
    report_summary(&summary, ctx);
    Ok(summary)
}
