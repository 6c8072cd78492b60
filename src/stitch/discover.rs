use super::config::RunOrder;
use super::error::Error;
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Finds the scratch directories of a replicate at any depth below `root`.
pub fn discover_runs(root: &Path, prefix: &str, order: RunOrder) -> Result<Vec<PathBuf>, Error> {
    let pattern = format!(
        "{}/**/{}*",
        Pattern::escape(&root.to_string_lossy()),
        Pattern::escape(prefix)
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::InvalidConfig(format!("invalid run pattern '{pattern}': {e}")))?;

    let mut runs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_dir() {
            runs.push(path);
        }
    }

    if runs.is_empty() {
        return Err(Error::missing_input(root.join(format!("{prefix}*"))));
    }

    match order {
        RunOrder::Name => runs.sort(),
        RunOrder::Modified => {
            let mut stamped: Vec<(SystemTime, PathBuf)> = Vec::with_capacity(runs.len());
            for run in runs {
                stamped.push((std::fs::metadata(&run)?.modified()?, run));
            }
            stamped.sort();
            runs = stamped.into_iter().map(|(_, p)| p).collect();
        }
    }
    Ok(runs)
}

/// Immediate subdirectories of `root`, sorted by name.
///
/// Hidden directories and names on the ignore list are left out.
pub fn discover_replicates(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::missing_input(root));
    }

    let mut replicates = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || ignore.iter().any(|i| *i == name) {
            continue;
        }
        replicates.push(entry.path());
    }
    replicates.sort();
    Ok(replicates)
}

/// Display name of a unit directory: its last path component.
pub fn unit_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Sort key for files named by job or frame index: the first run of digits
/// in the name, then the name. Names without digits sort last.
pub fn numeric_key(path: &Path) -> (bool, u64, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u64>() {
        Ok(number) => (false, number, name),
        Err(_) => (true, 0, name),
    }
}
