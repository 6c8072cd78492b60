mod batch;
mod project;
mod stitch;

pub use batch::{build_gather_config, build_merge_config, build_qm_charge_config};
pub use project::build_project_config;
pub use stitch::{build_stitch_config, resolve_threads};

use std::path::Path;

use anyhow::{Context, Result};
use traj_stitch::Settings;

/// Reads the settings file, or the built-in defaults without one.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => Settings::from_path(p)
            .with_context(|| format!("Failed to load settings from {}", p.display())),
        None => Ok(Settings::default()),
    }
}

fn override_ignore(ignore: &mut Vec<String>, cli: &[String]) {
    if !cli.is_empty() {
        *ignore = cli.to_vec();
    }
}
