use super::error::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

/// Which scratch directories survive once a replicate has been reconciled.
///
/// Retention runs after a unit has committed its outputs, never while runs
/// are still being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    #[default]
    KeepAll,
    /// Remove every scratch directory except the most recently modified.
    KeepNewest,
}

impl RetentionPolicy {
    /// Directories the policy would remove, in input order.
    pub fn plan(&self, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
        match self {
            RetentionPolicy::KeepAll => Ok(Vec::new()),
            RetentionPolicy::KeepNewest => {
                let mut newest: Option<(SystemTime, &Path)> = None;
                for dir in dirs {
                    let modified = std::fs::metadata(dir)?.modified()?;
                    let is_newer = match newest {
                        None => true,
                        Some((time, path)) => (modified, dir.as_path()) > (time, path),
                    };
                    if is_newer {
                        newest = Some((modified, dir.as_path()));
                    }
                }
                Ok(dirs
                    .iter()
                    .filter(|d| newest.is_some_and(|(_, keep)| d.as_path() != keep))
                    .cloned()
                    .collect())
            }
        }
    }

    pub fn apply(&self, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
        let doomed = self.plan(dirs)?;
        for dir in &doomed {
            std::fs::remove_dir_all(dir)?;
            info!(dir = %dir.display(), "removed scratch directory");
        }
        Ok(doomed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn scratch(root: &Path, name: &str, age_secs: u64) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir(&dir).unwrap();
        let stamp = SystemTime::now() - Duration::from_secs(age_secs);
        File::open(&dir).unwrap().set_modified(stamp).unwrap();
        dir
    }

    #[test]
    fn keep_all_removes_nothing() {
        let root = TempDir::new().unwrap();
        let dirs = vec![scratch(root.path(), "scr.1", 100)];
        assert!(RetentionPolicy::KeepAll.plan(&dirs).unwrap().is_empty());
    }

    #[test]
    fn keep_newest_plans_all_but_latest() {
        let root = TempDir::new().unwrap();
        let dirs = vec![
            scratch(root.path(), "scr.1", 300),
            scratch(root.path(), "scr.2", 10),
            scratch(root.path(), "scr.3", 200),
        ];
        let doomed = RetentionPolicy::KeepNewest.plan(&dirs).unwrap();
        assert_eq!(doomed, vec![dirs[0].clone(), dirs[2].clone()]);
    }

    #[test]
    fn apply_removes_planned_directories() {
        let root = TempDir::new().unwrap();
        let dirs = vec![
            scratch(root.path(), "scr.1", 300),
            scratch(root.path(), "scr.2", 10),
        ];
        RetentionPolicy::KeepNewest.apply(&dirs).unwrap();
        assert!(!dirs[0].exists());
        assert!(dirs[1].exists());
    }
}
