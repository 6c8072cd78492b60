mod batch;
mod clean;
mod project;
mod select;
mod stitch;

use batch::{run_gather, run_merge, run_qm_charges};
use clean::run_clean;
use project::run_project;
use select::run_select;
use stitch::run_stitch;

use anyhow::Result;
use tracing::info;
use traj_stitch::Summary;

use crate::cli::{Cli, Command};
use crate::config::load_settings;
use crate::display::{Context, print_summary};

pub fn dispatch(cli: Cli, ctx: Context) -> Result<Summary> {
    let settings = load_settings(cli.global.config.as_deref())?;

    match cli.command {
        Command::Stitch(args) => run_stitch(args, &settings, ctx),
        Command::Merge(args) => run_merge(args, &settings, ctx),
        Command::Project(args) => run_project(args, &settings, ctx),
        Command::Clean(args) => run_clean(args, ctx),
        Command::Gather(args) => run_gather(args, &settings, ctx),
        Command::QmCharges(args) => run_qm_charges(args, &settings, ctx),
        Command::Select(args) => run_select(args, ctx),
    }
}

/// Prints the end-of-command summary as a table or a log line.
fn report_summary(summary: &Summary, ctx: Context) {
    if ctx.interactive {
        print_summary(summary);
        return;
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        incomplete = summary.incomplete,
        nan_rows = summary.nan_rows,
        failed = summary.failed,
        elapsed = %crate::util::text::seconds(summary.elapsed()),
        "summary"
    );
}
