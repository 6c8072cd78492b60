use anyhow::{Context, Result};

use traj_stitch::{Settings, Summary, project_trajectory};

use crate::cli::ProjectArgs;
use crate::config::build_project_config;
use crate::display::{Context as DisplayContext, Progress, print_kv_table};
use crate::util::convert::framing_name;
use crate::util::path::display_name;
use crate::util::text::plural;

use super::report_summary;

pub fn run_project(args: ProjectArgs, settings: &Settings, ctx: DisplayContext) -> Result<Summary> {
    let config = build_project_config(&args, settings);
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = format!(
        "Projecting {} onto {}",
        display_name(&args.coords),
        display_name(&args.template)
    );
    progress.step(&description);

    let report = project_trajectory(&args.coords, &args.template, &args.output, &config)
        .with_context(|| format!("Failed to project {}", args.coords.display()))?;
    summary.processed = report.frames;

    let mut substeps = vec![format!(
        "{} in {} layout",
        plural(report.frames, "frame"),
        framing_name(config.framing)
    )];
    if report.truncated > 0 {
        substeps.push(format!(
            "{} truncated to fit",
            plural(report.truncated, "coordinate")
        ));
    }
    progress.complete_step(&description, &substeps);
    progress.finish("Projection", false);

    if ctx.interactive {
        let first = report
            .outputs
            .first()
            .map(|p| display_name(p))
            .unwrap_or_default();
        print_kv_table(
            "Projection",
            &[
                ("Frames", report.frames.to_string()),
                ("Records", report.records.to_string()),
                ("Truncated", report.truncated.to_string()),
                ("Files", report.outputs.len().to_string()),
                ("First output", first),
            ],
        );
    }
    report_summary(&summary, ctx);
    Ok(summary)
}
