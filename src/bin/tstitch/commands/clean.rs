use anyhow::{Context, Result};

use traj_stitch::{Exclusion, Summary, clean_sections};

use crate::cli::CleanArgs;
use crate::display::{Context as DisplayContext, Progress, print_kv_table};
use crate::util::path::{display_name, with_suffix};

use super::report_summary;

pub fn run_clean(args: CleanArgs, ctx: DisplayContext) -> Result<Summary> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| with_suffix(&args.input, "_clean.xyz"));
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = format!("Filtering {}", display_name(&args.input));
    progress.step(&description);

    let report = clean_sections(&args.input, &output, args.atom_count)
        .with_context(|| format!("Failed to clean {}", args.input.display()))?;
    summary.processed = report.kept;
    summary.record_exclusions(&report.exclusions);

    let substeps: Vec<String> = report
        .exclusions
        .iter()
        .filter_map(|e| match e {
            Exclusion::IncompleteSection { line, found, .. } => {
                Some(format!("dropped section at line {line} ({found} lines)"))
            }
            _ => None,
        })
        .collect();
    progress.complete_step(&description, &substeps);
    progress.finish("Clean", false);

    if ctx.interactive {
        print_kv_table(
            "Integrity Filter",
            &[
                ("Atoms per frame", report.atom_count.to_string()),
                ("Sections", report.sections.to_string()),
                ("Kept", report.kept.to_string()),
                ("Incomplete", report.incomplete().to_string()),
                ("Output", display_name(&output)),
            ],
        );
    }
    report_summary(&summary, ctx);
    Ok(summary)
}
