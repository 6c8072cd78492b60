//! Reconciliation of restarted simulation output.
//!
//! A replicate directory holds one scratch directory per execution attempt,
//! each with a coordinate trajectory and a parallel charge table. When a
//! simulation restarts from a checkpoint older than where the previous
//! attempt stopped, the attempts overlap. This module removes the overlap
//! from both streams, merges reconciled replicates into a master dataset,
//! and projects coordinates onto a structure template.
//!
//! # Units and failures
//!
//! Each replicate is an independent unit. A fatal [`Error`] stops only its
//! own unit and commits none of that unit's outputs. Recoverable conditions
//! are recorded as [`Exclusion`] values in the unit's report.

mod align;
mod concat;
mod config;
mod discover;
mod error;
mod gather;
mod integrity;
mod project;
mod qm;
mod reconcile;
mod report;
mod retention;
mod state;
mod watermark;

pub use align::{ChargeSlice, HeaderGuard, align_charges};
pub use concat::{ChargeMerger, MergeReport, MergedReplicate, REPLICATE_COLUMN, merge_replicates};
pub use config::{
    COORDINATES_DIR, DEFAULT_CHARGES, DEFAULT_CLEAN, DEFAULT_COORDS, Framing, GatherConfig,
    MergeConfig, MergeSettings, NanPolicy, ProjectConfig, ProjectSettings, QM_CHARGE_FILE,
    QmChargeConfig, RUN_CHARGES, RUN_COORDS, RUN_DIR_PREFIX, RunOrder, Settings, StitchConfig,
    StitchSettings, default_gather_ignore, default_ignore,
};
pub use discover::{discover_replicates, discover_runs, numeric_key, unit_name};
pub use error::Error;
pub use gather::{GatherReport, gather_single_points};
pub use integrity::{IntegrityReport, clean_sections, filter_sections};
pub use project::{ProjectReport, project_trajectory};
pub use qm::{
    JobCharges, JobRange, QmReplicateReport, combine_qm_charges, combine_replicate_qm_charges,
    read_job_charges,
};
pub use reconcile::{ReplicateReport, RunOutcome, reconcile_all, reconcile_replicate};
pub use report::{Exclusion, Summary, UnitResult};
pub use retention::RetentionPolicy;
pub use state::ReconcileState;
pub use watermark::{RunReport, Stitcher};
