use super::error::Error as StitchError;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A recoverable condition that removed part of a unit's input.
///
/// Exclusions never abort a unit; they are logged when they happen and
/// collected in the unit's report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Exclusion {
    #[error("missing input {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("incomplete section at line {line}: expected {expected} lines, found {found}")]
    IncompleteSection {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("run {run} has no frame beyond watermark {watermark}; dropped")]
    OverlapResolutionFailure { run: String, watermark: u64 },

    #[error("coordinate file {} holds no frames", .path.display())]
    EmptyRun { path: PathBuf },

    /// The unit's last reconciliation failed, so its outputs on disk are stale.
    #[error("{unit} left out: last reconciliation failed ({reason})")]
    FailedUnit { unit: String, reason: String },

    #[error("row at line {line} of {unit} contains nan")]
    NanRow {
        unit: String,
        line: usize,
        dropped: bool,
    },
}

impl Exclusion {
    /// Whether the exclusion removed a whole input (as opposed to a section or row).
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Exclusion::MissingInput { .. }
                | Exclusion::OverlapResolutionFailure { .. }
                | Exclusion::EmptyRun { .. }
                | Exclusion::FailedUnit { .. }
        )
    }
}

/// Outcome of one unit of a batch, tagged with the unit's name.
#[derive(Debug)]
pub struct UnitResult<T> {
    pub unit: String,
    pub outcome: Result<T, StitchError>,
}

/// Running totals for a command that processes many units.
#[derive(Debug, Clone)]
pub struct Summary {
    pub processed: usize,
    pub skipped: usize,
    pub incomplete: usize,
    pub nan_rows: usize,
    pub failed: usize,
    started: Instant,
}

impl Default for Summary {
    fn default() -> Self {
        Self::start()
    }
}

impl Summary {
    pub fn start() -> Self {
        Self {
            processed: 0,
            skipped: 0,
            incomplete: 0,
            nan_rows: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    pub fn record_success(&mut self, exclusions: &[Exclusion]) {
        self.processed += 1;
        self.record_exclusions(exclusions);
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_exclusions(&mut self, exclusions: &[Exclusion]) {
        for exclusion in exclusions {
            match exclusion {
                e if e.is_skip() => self.skipped += 1,
                Exclusion::IncompleteSection { .. } => self.incomplete += 1,
                Exclusion::NanRow { .. } => self.nan_rows += 1,
                _ => {}
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_exclusions_by_kind() {
        let mut summary = Summary::start();
        summary.record_success(&[
            Exclusion::MissingInput {
                path: PathBuf::from("rep3/all_coors.xyz"),
            },
            Exclusion::IncompleteSection {
                line: 10,
                expected: 5,
                found: 3,
            },
            Exclusion::OverlapResolutionFailure {
                run: "scr.2".into(),
                watermark: 7,
            },
        ]);
        summary.record_success(&[
            Exclusion::EmptyRun {
                path: PathBuf::from("rep1/scr.3/coors.xyz"),
            },
            Exclusion::FailedUnit {
                unit: "rep2".into(),
                reason: "structural mismatch".into(),
            },
        ]);
        summary.record_failure();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn nan_rows_are_not_skips() {
        let nan = Exclusion::NanRow {
            unit: "A".into(),
            line: 4,
            dropped: false,
        };
        assert_eq!(nan.to_string(), "row at line 4 of A contains nan");
        assert!(!nan.is_skip());

        let mut summary = Summary::start();
        summary.record_success(&[nan]);
        assert_eq!(summary.nan_rows, 1);
        assert_eq!(summary.skipped, 0);
    }
}
