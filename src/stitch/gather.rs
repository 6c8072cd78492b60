use super::config::GatherConfig;
use super::discover::{discover_replicates, numeric_key, unit_name};
use super::error::Error;
use super::report::Exclusion;
use crate::io::AtomicFile;
use glob::Pattern;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct GatherReport {
    pub output: PathBuf,
    /// `(replicate, structures)` in the order they were written.
    pub replicates: Vec<(String, usize)>,
    pub total: usize,
    pub exclusions: Vec<Exclusion>,
}

/// Concatenates the single-point structures of every replicate into one
/// geometry trajectory under `root`.
///
/// Each replicate contributes the `*.xyz` files of its coordinates folder,
/// ordered by the first integer in their names.
pub fn gather_single_points(root: &Path, config: &GatherConfig) -> Result<GatherReport, Error> {
    let replicates = discover_replicates(root, &config.ignore)?;
    let output_name = match &config.output_name {
        Some(name) => name.clone(),
        None => format!("{}_geometry.xyz", unit_name(&std::path::absolute(root)?)),
    };
    let output = root.join(output_name);

    let mut out = AtomicFile::create(&output)?;
    let mut written = Vec::new();
    let mut exclusions = Vec::new();
    let mut total = 0;

    for dir in &replicates {
        let name = unit_name(dir);
        let coords_dir = dir.join(&config.coordinates_dir);
        if !coords_dir.is_dir() {
            warn!(replicate = %name, path = %coords_dir.display(), "no coordinates folder");
            exclusions.push(Exclusion::MissingInput { path: coords_dir });
            continue;
        }

        let structures = list_structures(&coords_dir)?;
        for structure in &structures {
            std::io::copy(&mut File::open(structure)?, &mut out)?;
        }
        info!(replicate = %name, structures = structures.len(), "gathered single points");
        total += structures.len();
        written.push((name, structures.len()));
    }

    if written.is_empty() {
        return Err(Error::missing_input(root.join("*").join(&config.coordinates_dir)));
    }

    let output = out.commit()?;
    Ok(GatherReport {
        output,
        replicates: written,
        total,
        exclusions,
    })
}

fn list_structures(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let pattern = format!("{}/*.xyz", Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::InvalidConfig(format!("invalid structure pattern '{pattern}': {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by_cached_key(|p| numeric_key(p));
    Ok(files)
}
