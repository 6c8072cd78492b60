use std::io::Write;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use traj_stitch::Summary;
use traj_stitch::io::open_template;

use crate::cli::SelectArgs;
use crate::display::{Context as DisplayContext, Progress};
use crate::io::create_output;
use crate::util::convert::parse_residue_list;
use crate::util::path::display_name;

use super::report_summary;

/// Writes one line of space-separated atom indices per residue list.
pub fn run_select(args: SelectArgs, ctx: DisplayContext) -> Result<Summary> {
    let mut summary = Summary::start();
    let mut progress = Progress::new(ctx.interactive, 1);

    let description = format!("Selecting atoms of {}", display_name(&args.template));
    progress.step(&description);

    let template = open_template(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;

    let mut selections = Vec::with_capacity(args.residues.len());
    for list in &args.residues {
        let mut indices = Vec::new();
        for residue in parse_residue_list(list)? {
            let selected = template.select(residue, args.scheme);
            if selected.is_empty() {
                warn!(residue, scheme = %args.scheme, "no atoms selected for residue");
                summary.skipped += 1;
            }
            indices.extend(selected);
        }
        if indices.is_empty() {
            bail!(
                "No {} atoms found for residue list '{}'; verify that the residues exist",
                args.scheme,
                list
            );
        }
        info!(residues = %list, atoms = indices.len(), "selected atoms");
        summary.processed += 1;
        selections.push(indices);
    }

    let mut out = create_output(args.output.as_deref())?;
    for indices in &selections {
        let line = indices
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    progress.complete_step(&description, &[]);
    progress.finish("Selection", false);
    report_summary(&summary, ctx);
    Ok(summary)
}
