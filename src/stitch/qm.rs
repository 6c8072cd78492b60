use super::config::QmChargeConfig;
use super::discover::{discover_replicates, unit_name};
use super::error::Error;
use super::report::{Exclusion, UnitResult};
use crate::io::{AtomicFile, Format, error::Error as IoError};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Job directories `first, first + step, ...` below `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRange {
    pub first: u64,
    pub last: u64,
    pub step: u64,
}

impl JobRange {
    pub fn new(first: u64, last: u64, step: u64) -> Result<Self, Error> {
        if step == 0 || first >= last {
            return Err(Error::InvalidJobRange { first, last, step });
        }
        Ok(Self { first, last, step })
    }

    pub fn jobs(&self) -> impl Iterator<Item = u64> {
        (self.first..self.last).step_by(self.step.max(1) as usize)
    }

    pub fn len(&self) -> usize {
        self.jobs().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-atom charges of one single-point job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCharges {
    /// Atom labels with their index shifted to start at zero.
    pub labels: Vec<String>,
    pub charges: Vec<String>,
}

/// Parses a two-column `<index> <element>\t<charge>` file.
pub fn read_job_charges<R: BufRead>(reader: R) -> Result<JobCharges, Error> {
    let mut labels = Vec::new();
    let mut charges = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut fields = trimmed.split('\t');
        let (Some(label), Some(charge)) = (fields.next(), fields.next()) else {
            return Err(IoError::parse(
                Format::Charge,
                line_no,
                "expected '<index> <element>' and a charge separated by a tab",
                &line,
            )
            .into());
        };

        let mut parts = label.split_whitespace();
        let index = parts
            .next()
            .and_then(|tok| tok.parse::<i64>().ok())
            .ok_or_else(|| {
                IoError::parse(Format::Charge, line_no, "atom label must start with an index", &line)
            })?;
        let relabelled = std::iter::once((index - 1).to_string())
            .chain(parts.map(str::to_string))
            .collect::<Vec<_>>()
            .join(" ");

        labels.push(relabelled);
        charges.push(charge.trim().to_string());
    }

    Ok(JobCharges { labels, charges })
}

#[derive(Debug, Clone)]
pub struct QmReplicateReport {
    pub name: String,
    pub output: PathBuf,
    pub frames: usize,
    pub exclusions: Vec<Exclusion>,
}

/// Builds one charge table for a replicate from its single-point jobs.
///
/// Job `j` is read from `<replicate>/<j>/<scr_dir>/<charge_file>`. The first
/// job found supplies the header of atom labels; every job adds one row.
pub fn combine_replicate_qm_charges(
    dir: &Path,
    range: &JobRange,
    config: &QmChargeConfig,
) -> Result<QmReplicateReport, Error> {
    let name = unit_name(dir);
    let output = dir.join(&config.output_name);
    let mut out = AtomicFile::create(&output)?;
    let mut header: Option<Vec<String>> = None;
    let mut exclusions = Vec::new();
    let mut frames = 0;

    for job in range.jobs() {
        let path = dir
            .join(job.to_string())
            .join(&config.scr_dir)
            .join(&config.charge_file);
        if !path.is_file() {
            warn!(replicate = %name, job, "missing single-point charges");
            exclusions.push(Exclusion::MissingInput { path });
            continue;
        }

        let job_charges = read_job_charges(BufReader::new(File::open(&path)?))?;
        match &header {
            None => {
                writeln!(out, "{}", job_charges.labels.join("\t"))?;
                header = Some(job_charges.labels);
            }
            Some(labels) if labels.len() != job_charges.charges.len() => {
                return Err(Error::structural_mismatch(
                    format!("{name}/{job}"),
                    format!(
                        "{} charges but the first job has {} atoms",
                        job_charges.charges.len(),
                        labels.len()
                    ),
                ));
            }
            Some(_) => {}
        }

        if job_charges
            .charges
            .iter()
            .any(|c| c.eq_ignore_ascii_case("nan"))
        {
            warn!(replicate = %name, job, "single-point charges contain nan");
            exclusions.push(Exclusion::NanRow {
                unit: format!("{name}/{job}"),
                line: frames + 2,
                dropped: false,
            });
        }
        writeln!(out, "{}", job_charges.charges.join("\t"))?;
        frames += 1;
    }

    if frames == 0 {
        return Err(Error::missing_input(dir.join("*").join(&config.scr_dir)));
    }

    let output = out.commit()?;
    info!(replicate = %name, frames, "combined single-point charges");
    Ok(QmReplicateReport {
        name,
        output,
        frames,
        exclusions,
    })
}

/// Runs [`combine_replicate_qm_charges`] for every replicate under `root`.
pub fn combine_qm_charges(
    root: &Path,
    range: &JobRange,
    config: &QmChargeConfig,
) -> Result<Vec<UnitResult<QmReplicateReport>>, Error> {
    let replicates = discover_replicates(root, &config.ignore)?;
    Ok(replicates
        .iter()
        .map(|dir| UnitResult {
            unit: unit_name(dir),
            outcome: combine_replicate_qm_charges(dir, range, config),
        })
        .collect())
}
