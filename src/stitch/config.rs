use super::error::Error;
use super::retention::RetentionPolicy;
use crate::io::{FrameNumbering, OverflowPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Reconciled charge file written per replicate and at the master level.
pub const DEFAULT_CHARGES: &str = "all_charges.xls";
/// Reconciled coordinate file written per replicate and at the master level.
pub const DEFAULT_COORDS: &str = "all_coors.xyz";
/// Output of the section integrity filter.
pub const DEFAULT_CLEAN: &str = "all_coors_clean.xyz";

pub const RUN_COORDS: &str = "coors.xyz";
pub const RUN_CHARGES: &str = "charge.xls";
pub const RUN_DIR_PREFIX: &str = "scr";

pub const QM_CHARGE_FILE: &str = "charge_mull.xls";
pub const COORDINATES_DIR: &str = "coordinates";

pub fn default_ignore() -> Vec<String> {
    vec!["Analysis".to_string(), "Analyze".to_string()]
}

/// Replicate roots of single-point jobs also hold shared input folders.
pub fn default_gather_ignore() -> Vec<String> {
    let mut ignore = default_ignore();
    ignore.extend(["coordinates", "inputfiles", "opt-wfn"].map(String::from));
    ignore
}

/// Order in which the runs of a replicate are stitched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOrder {
    /// Lexicographic by directory path.
    #[default]
    Name,
    /// Oldest modification time first, ties broken by path.
    Modified,
}

/// What to do with charge rows containing `nan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NanPolicy {
    #[default]
    Keep,
    Drop,
}

/// Layout of projected structure output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    #[default]
    Flat,
    MultiModel,
    PerFrame,
}

#[derive(Debug, Clone)]
pub struct StitchConfig {
    pub run_prefix: String,
    pub coords_name: String,
    pub charges_name: String,
    pub output_coords: String,
    pub output_charges: String,
    pub numbering: FrameNumbering,
    /// Expected atoms per frame; read from the first run when `None`.
    pub atom_count: Option<usize>,
    pub initial_watermark: u64,
    pub run_order: RunOrder,
    /// Continue from the state file left by a previous pass.
    pub resume: bool,
    pub retention: RetentionPolicy,
    /// Directory names skipped when reconciling every replicate under a root.
    pub ignore: Vec<String>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            run_prefix: RUN_DIR_PREFIX.to_string(),
            coords_name: RUN_COORDS.to_string(),
            charges_name: RUN_CHARGES.to_string(),
            output_coords: DEFAULT_COORDS.to_string(),
            output_charges: DEFAULT_CHARGES.to_string(),
            numbering: FrameNumbering::default(),
            atom_count: None,
            initial_watermark: 0,
            run_order: RunOrder::default(),
            resume: false,
            retention: RetentionPolicy::default(),
            ignore: default_ignore(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Per-replicate coordinate file to concatenate.
    pub coords_name: String,
    /// Per-replicate charge file to concatenate.
    pub charges_name: String,
    /// Output paths; relative paths are resolved against the merge root.
    pub output_coords: PathBuf,
    pub output_charges: PathBuf,
    pub ignore: Vec<String>,
    pub nan_policy: NanPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            coords_name: DEFAULT_COORDS.to_string(),
            charges_name: DEFAULT_CHARGES.to_string(),
            output_coords: PathBuf::from(DEFAULT_COORDS),
            output_charges: PathBuf::from(DEFAULT_CHARGES),
            ignore: default_ignore(),
            nan_policy: NanPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub framing: Framing,
    /// Header line for multi-model output; the template name when `None`.
    pub title: Option<String>,
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Clone)]
pub struct GatherConfig {
    pub coordinates_dir: String,
    /// Output file name; `<root-name>_geometry.xyz` when `None`.
    pub output_name: Option<String>,
    pub ignore: Vec<String>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            coordinates_dir: COORDINATES_DIR.to_string(),
            output_name: None,
            ignore: default_gather_ignore(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QmChargeConfig {
    pub scr_dir: String,
    pub charge_file: String,
    pub output_name: String,
    pub ignore: Vec<String>,
}

impl Default for QmChargeConfig {
    fn default() -> Self {
        Self {
            scr_dir: RUN_DIR_PREFIX.to_string(),
            charge_file: QM_CHARGE_FILE.to_string(),
            output_name: DEFAULT_CHARGES.to_string(),
            ignore: default_ignore(),
        }
    }
}

/// Optional overrides read from a TOML settings file.
///
/// Every key may be omitted. Values found here replace the built-in
/// defaults and are themselves replaced by command-line flags.
///
/// ```toml
/// threads = 4
/// ignore = ["Analysis", "Plots"]
///
/// [stitch]
/// frame_field = 2
/// run_order = "modified"
/// retention = "keep-newest"
///
/// [merge]
/// nan_policy = "drop"
///
/// [project]
/// framing = "multi-model"
/// overflow = "truncate"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub threads: Option<usize>,
    pub ignore: Option<Vec<String>>,
    pub stitch: StitchSettings,
    pub merge: MergeSettings,
    pub project: ProjectSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StitchSettings {
    pub run_prefix: Option<String>,
    pub coords_file: Option<String>,
    pub charges_file: Option<String>,
    pub output_coords: Option<String>,
    pub output_charges: Option<String>,
    pub frame_field: Option<usize>,
    pub atom_count: Option<usize>,
    pub run_order: Option<RunOrder>,
    pub retention: Option<RetentionPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeSettings {
    pub coords_file: Option<String>,
    pub charges_file: Option<String>,
    pub nan_policy: Option<NanPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSettings {
    pub framing: Option<Framing>,
    pub overflow: Option<OverflowPolicy>,
    pub title: Option<String>,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn stitch_config(&self) -> StitchConfig {
        let s = &self.stitch;
        let base = StitchConfig::default();
        StitchConfig {
            run_prefix: s.run_prefix.clone().unwrap_or(base.run_prefix),
            coords_name: s.coords_file.clone().unwrap_or(base.coords_name),
            charges_name: s.charges_file.clone().unwrap_or(base.charges_name),
            output_coords: s.output_coords.clone().unwrap_or(base.output_coords),
            output_charges: s.output_charges.clone().unwrap_or(base.output_charges),
            numbering: s
                .frame_field
                .map(|field| FrameNumbering::Title { field })
                .unwrap_or(base.numbering),
            atom_count: s.atom_count.or(base.atom_count),
            run_order: s.run_order.unwrap_or(base.run_order),
            retention: s.retention.unwrap_or(base.retention),
            ignore: self.ignore_list(),
            ..base
        }
    }

    pub fn merge_config(&self) -> MergeConfig {
        let m = &self.merge;
        let base = MergeConfig::default();
        MergeConfig {
            coords_name: m.coords_file.clone().unwrap_or(base.coords_name),
            charges_name: m.charges_file.clone().unwrap_or(base.charges_name),
            ignore: self.ignore_list(),
            nan_policy: m.nan_policy.unwrap_or(base.nan_policy),
            ..base
        }
    }

    pub fn project_config(&self) -> ProjectConfig {
        let p = &self.project;
        ProjectConfig {
            framing: p.framing.unwrap_or_default(),
            title: p.title.clone(),
            overflow: p.overflow.unwrap_or_default(),
        }
    }

    pub fn gather_config(&self) -> GatherConfig {
        GatherConfig {
            ignore: self
                .ignore
                .clone()
                .unwrap_or_else(default_gather_ignore),
            ..GatherConfig::default()
        }
    }

    pub fn qm_charge_config(&self) -> QmChargeConfig {
        QmChargeConfig {
            ignore: self.ignore_list(),
            ..QmChargeConfig::default()
        }
    }

    fn ignore_list(&self) -> Vec<String> {
        self.ignore.clone().unwrap_or_else(default_ignore)
    }
}
