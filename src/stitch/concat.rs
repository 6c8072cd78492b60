use super::config::{MergeConfig, NanPolicy};
use super::discover::{discover_replicates, unit_name};
use super::error::Error;
use super::report::Exclusion;
use super::state::ReconcileState;
use crate::io::{AtomicFile, ChargeReader, FrameNumbering, charge, xyz};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the provenance column appended to merged charge rows.
pub const REPLICATE_COLUMN: &str = "replicate";

/// Streams the charge rows of several replicates into one table.
///
/// The first header seen becomes the only header, with a `replicate` column
/// appended. Header rows that reappear later are dropped. Every data row is
/// right-trimmed and tagged with its replicate's name.
pub struct ChargeMerger<W> {
    out: W,
    header: Option<String>,
    nan_policy: NanPolicy,
    rows: usize,
    stray_headers: usize,
    exclusions: Vec<Exclusion>,
}

impl<W: Write> ChargeMerger<W> {
    pub fn new(out: W, nan_policy: NanPolicy) -> Self {
        Self {
            out,
            header: None,
            nan_policy,
            rows: 0,
            stray_headers: 0,
            exclusions: Vec::new(),
        }
    }

    /// Appends one replicate's rows and returns how many were written.
    pub fn push<R: BufRead>(
        &mut self,
        replicate: &str,
        reader: ChargeReader<R>,
    ) -> Result<usize, Error> {
        self.push_with(replicate, reader, |_| Ok(()))
    }

    /// Like [`push`](Self::push), but calls `on_row` once per data row with
    /// whether the row was written. Stray headers are not data rows.
    pub fn push_with<R, F>(
        &mut self,
        replicate: &str,
        reader: ChargeReader<R>,
        mut on_row: F,
    ) -> Result<usize, Error>
    where
        R: BufRead,
        F: FnMut(bool) -> Result<(), Error>,
    {
        let header = reader.header().content();
        match &self.header {
            None => {
                writeln!(self.out, "{header}\t{REPLICATE_COLUMN}")?;
                self.header = Some(header.to_string());
            }
            Some(first) if first != header => {
                warn!(replicate, "charge header differs from the first replicate's; keeping the first");
            }
            Some(_) => {}
        }

        let mut written = 0;
        for row in reader {
            let row = row?;
            let content = row.content();

            if self.header.as_deref() == Some(content) || row.looks_like_header() {
                debug!(replicate, line = row.line, "dropping stray header row");
                self.stray_headers += 1;
                continue;
            }

            if row.has_nan() {
                let dropped = self.nan_policy == NanPolicy::Drop;
                warn!(replicate, line = row.line, dropped, "charge row contains nan");
                self.exclusions.push(Exclusion::NanRow {
                    unit: replicate.to_string(),
                    line: row.line,
                    dropped,
                });
                if dropped {
                    on_row(false)?;
                    continue;
                }
            }

            writeln!(self.out, "{content}\t{replicate}")?;
            on_row(true)?;
            written += 1;
        }

        self.rows += written;
        Ok(written)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn stray_headers(&self) -> usize {
        self.stray_headers
    }

    pub fn finish(self) -> (W, Vec<Exclusion>) {
        (self.out, self.exclusions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedReplicate {
    pub name: String,
    /// Frames written, each with its charge row.
    pub rows: usize,
    /// Frames dropped together with a nan charge row.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub replicates: Vec<MergedReplicate>,
    pub rows: usize,
    pub stray_headers: usize,
    pub coords_path: PathBuf,
    pub charges_path: PathBuf,
    pub exclusions: Vec<Exclusion>,
}

/// Concatenates the reconciled outputs of every replicate under `root`.
///
/// Replicates are visited in name order, so reruns over the same inputs
/// produce identical bytes. Coordinate blocks are copied verbatim in step
/// with the charge rows, so a dropped row takes its frame with it. A
/// replicate whose block and row counts differ fails the merge. Replicates
/// whose last reconciliation failed are left out.
pub fn merge_replicates(root: &Path, config: &MergeConfig) -> Result<MergeReport, Error> {
    let replicates = discover_replicates(root, &config.ignore)?;

    let mut coords_out = AtomicFile::create(root.join(&config.output_coords))?;
    let mut merger = ChargeMerger::new(
        AtomicFile::create(root.join(&config.output_charges))?,
        config.nan_policy,
    );
    let mut merged = Vec::new();
    let mut exclusions = Vec::new();

    for dir in &replicates {
        let name = unit_name(dir);
        let coords = dir.join(&config.coords_name);
        let charges = dir.join(&config.charges_name);

        if let Some(missing) = [&coords, &charges].into_iter().find(|p| !p.is_file()) {
            warn!(replicate = %name, path = %missing.display(), "skipping replicate with missing input");
            exclusions.push(Exclusion::MissingInput {
                path: missing.clone(),
            });
            continue;
        }

        if let Some(reason) = ReconcileState::load(&ReconcileState::path_for(&coords))?
            .and_then(|state| state.failed)
        {
            warn!(replicate = %name, %reason, "skipping replicate whose last reconciliation failed");
            exclusions.push(Exclusion::FailedUnit { unit: name, reason });
            continue;
        }

        let mut blocks = xyz::open(&coords)?.numbering(FrameNumbering::Sequential);
        let mut frames = 0;
        let mut dropped = 0;
        let rows = merger.push_with(&name, charge::open(&charges)?, |written| {
            let block = blocks.next().transpose()?.ok_or_else(|| {
                Error::structural_mismatch(
                    &name,
                    format!("charge row {} has no coordinate frame", frames + 1),
                )
            })?;
            frames += 1;
            if written {
                block.write_to(&mut coords_out)?;
            } else {
                dropped += 1;
            }
            Ok(())
        })?;
        match blocks.next() {
            Some(Ok(_)) => {
                return Err(Error::structural_mismatch(
                    &name,
                    format!("more coordinate frames than the {frames} charge rows"),
                ));
            }
            Some(Err(e)) => return Err(e.into()),
            None => {}
        }

        info!(replicate = %name, rows, dropped, "merged replicate");
        merged.push(MergedReplicate {
            name,
            rows,
            dropped,
        });
    }

    if merged.is_empty() {
        return Err(Error::missing_input(root.join("*").join(&config.charges_name)));
    }

    let rows = merger.rows();
    let stray_headers = merger.stray_headers();
    let (charges_out, nan_rows) = merger.finish();
    exclusions.extend(nan_rows);

    let coords_path = coords_out.commit()?;
    let charges_path = charges_out.commit()?;
    info!(replicates = merged.len(), rows, "committed merged outputs");

    Ok(MergeReport {
        replicates: merged,
        rows,
        stray_headers,
        coords_path,
        charges_path,
        exclusions,
    })
}
