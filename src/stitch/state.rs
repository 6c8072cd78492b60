use super::error::Error;
use crate::io::AtomicFile;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Progress left behind by a committed reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileState {
    /// Frame number of the last frame written.
    pub watermark: u64,
    /// Frames in the reconciled outputs.
    pub frames: usize,
    /// Runs consumed so far, relative to the replicate directory.
    pub runs: Vec<String>,
    /// Set when a later pass failed; the outputs on disk predate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<String>,
}

impl ReconcileState {
    /// `<coords-file>.state.toml` next to the reconciled coordinates.
    pub fn path_for(coords: &Path) -> PathBuf {
        let mut name = coords.as_os_str().to_owned();
        name.push(".state.toml");
        PathBuf::from(name)
    }

    /// Reads a state file; `None` when there is none.
    pub fn load(path: &Path) -> Result<Option<Self>, Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(toml::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let text = toml::to_string(self)?;
        let mut file = AtomicFile::create(path)?;
        file.write_all(text.as_bytes())?;
        file.commit()?;
        Ok(())
    }

    /// Records a failed pass at `path`, keeping the progress of the last
    /// committed pass.
    pub fn mark_failed(path: &Path, previous: Option<Self>, reason: String) -> Result<(), Error> {
        let state = Self {
            failed: Some(reason),
            ..previous.unwrap_or_default()
        };
        state.save(path)
    }

    pub fn has_consumed(&self, run: &str) -> bool {
        self.runs.iter().any(|r| r == run)
    }

    /// Folds a later pass into this state.
    pub fn advance(&mut self, watermark: u64, frames: usize, runs: impl IntoIterator<Item = String>) {
        self.failed = None;
        self.watermark = watermark;
        self.frames += frames;
        for run in runs {
            if !self.has_consumed(&run) {
                self.runs.push(run);
            }
        }
    }
}
