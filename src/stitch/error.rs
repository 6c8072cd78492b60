//! Error types for reconciliation, merging and projection.
//!
//! Errors here are fatal to the unit that raised them: the unit stops and
//! none of its outputs are committed. Conditions that only exclude part of a
//! unit are reported as [`Exclusion`](super::Exclusion) values instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a data file failed, or its content is malformed.
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    /// Two streams that must line up do not.
    ///
    /// Raised when a charge file holds fewer rows than the coordinate frames
    /// kept for the same run, or when a frame and its template disagree on
    /// the number of atoms.
    #[error("structural mismatch in {unit}: {detail}")]
    StructuralMismatch {
        /// Run or replicate the mismatch was found in.
        unit: String,
        /// Description of the problem.
        detail: String,
    },

    /// A unit has nothing to work on.
    #[error("required input not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    /// A fresh pass would drop frames from runs an earlier pass consumed
    /// and that have since been removed.
    #[error("runs consumed by an earlier pass of {unit} no longer exist: {}", .runs.join(", "))]
    PrunedRuns { unit: String, runs: Vec<String> },

    #[error("invalid job range {first}..{last} by {step}: step must be positive and first below last")]
    InvalidJobRange { first: u64, last: u64, step: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse a settings or state file.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to encode reconciliation state: {0}")]
    StateEncode(#[from] toml::ser::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.into())
    }
}

impl Error {
    /// Creates a [`StructuralMismatch`](Error::StructuralMismatch) error.
    pub fn structural_mismatch(unit: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            unit: unit.into(),
            detail: detail.into(),
        }
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Short label used when tallying failures.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(crate::io::Error::Io { .. }) => "io",
            Error::Io(crate::io::Error::IncompleteBlock { .. }) => "incomplete",
            Error::Io(crate::io::Error::AtomCountMismatch { .. })
            | Error::StructuralMismatch { .. } => "structural-mismatch",
            Error::Io(_) => "parse",
            Error::MissingInput { .. } => "missing-input",
            Error::PrunedRuns { .. } => "pruned-runs",
            Error::InvalidJobRange { .. } | Error::InvalidConfig(_) => "config",
            Error::Toml(_) | Error::StateEncode(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Format;

    #[test]
    fn parse_errors_pass_through_unchanged() {
        let inner = crate::io::Error::parse(Format::Xyz, 4, "expected an atom count", "x");
        let expected = inner.to_string();
        let err = Error::from(inner);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn std_io_errors_are_wrapped() {
        let err = Error::from(std::io::Error::other("disk full"));
        assert!(matches!(err, Error::Io(crate::io::Error::Io { .. })));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn structural_mismatch_names_unit() {
        let err = Error::structural_mismatch("rep1/scr.2", "3 frames but 2 charge rows");
        assert_eq!(
            err.to_string(),
            "structural mismatch in rep1/scr.2: 3 frames but 2 charge rows"
        );
        assert_eq!(err.category(), "structural-mismatch");
    }

    #[test]
    fn pruned_runs_are_listed() {
        let err = Error::PrunedRuns {
            unit: "rep1".into(),
            runs: vec!["scr.1".into(), "scr.2".into()],
        };
        assert_eq!(
            err.to_string(),
            "runs consumed by an earlier pass of rep1 no longer exist: scr.1, scr.2"
        );
    }
}
