use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data at line {line}: {details} -> '{text}'")]
    Parse {
        format: Format,
        line: usize,
        details: String,
        text: String,
    },

    #[error(
        "incomplete {format} block starting at line {line}: expected {expected} lines, found {found}"
    )]
    IncompleteBlock {
        format: Format,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("coordinate token '{token}' at line {line} exceeds the {width}-character field")]
    FieldOverflow {
        line: usize,
        token: String,
        width: usize,
    },

    #[error(
        "frame starting at line {line} has {found} atoms but the template defines {expected}"
    )]
    AtomCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl Error {
    pub fn parse(
        format: Format,
        line: usize,
        details: impl Into<String>,
        text: impl AsRef<str>,
    ) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
            text: text.as_ref().trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    pub fn incomplete(format: Format, line: usize, expected: usize, found: usize) -> Self {
        Self::IncompleteBlock {
            format,
            line,
            expected,
            found,
        }
    }

    /// Line number the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Io { .. } => None,
            Error::Parse { line, .. }
            | Error::IncompleteBlock { line, .. }
            | Error::FieldOverflow { line, .. }
            | Error::AtomCountMismatch { line, .. } => Some(*line),
        }
    }
}
