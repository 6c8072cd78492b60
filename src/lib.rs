//! Reconciles restarted, multi-replicate molecular dynamics output into single
//! gap-free time series, and projects reconciled coordinates onto fixed-width
//! structure templates.
//!
//! # Features
//!
//! - **Restart stitching**: Drops the frames a restarted run repeats, using a
//!   frame-number watermark carried from run to run
//! - **Dual-stream alignment**: Applies the coordinate decision to the
//!   parallel charge table, which has no frame numbers of its own
//! - **Replicate merging**: Concatenates reconciled replicates with one
//!   header and a provenance column
//! - **Structure projection**: Rewrites the coordinate columns of template
//!   records frame by frame, as flat, multi-model or per-frame output
//! - **Integrity filtering**: Drops sections of a concatenated trajectory
//!   that do not hold a full frame
//!
//! # Quick Start
//!
//! A [`Stitcher`] keeps only the frames of each run that come after the last
//! frame already kept:
//!
//! ```
//! use std::io::Cursor;
//! use traj_stitch::{BlockReader, StitchError, Stitcher};
//!
//! let first = "1\nframe 0 1\nC 0 0 0\n1\nframe 0 2\nC 0 0 1\n1\nframe 0 3\nC 0 0 2\n";
//! let restart = "1\nframe 0 2\nC 0 0 1\n1\nframe 0 3\nC 0 0 2\n1\nframe 0 4\nC 0 0 3\n";
//!
//! let mut stitcher = Stitcher::default();
//! let mut kept = Vec::new();
//! for run in [first, restart] {
//!     stitcher.stitch_run(BlockReader::new(Cursor::new(run)), |block| {
//!         kept.push(block.frame_number);
//!         Ok::<_, StitchError>(())
//!     })?;
//! }
//!
//! assert_eq!(kept, vec![1, 2, 3, 4]);
//! assert_eq!(stitcher.watermark(), 4);
//! # Ok::<(), StitchError>(())
//! ```
//!
//! Whole directory trees are handled by [`reconcile_replicate`],
//! [`reconcile_all`] and [`merge_replicates`].
//!
//! # Module Organization
//!
//! - [`io`]: Streaming readers and writers for coordinate, charge and
//!   structure files
//! - Reconciliation, merging, projection and filtering operations are
//!   re-exported at the crate root
//!
//! # Data Types
//!
//! - [`Block`]: Raw text of one frame in a coordinate file
//! - [`Frame`]: Coordinate tokens of one frame
//! - [`ChargeRecord`]: One row of a charge table
//! - [`Template`]: Fixed-width atom records of a structure file
//! - [`AtomScheme`]: Atom selection scheme over a template

mod model;
mod stitch;

pub mod io;

pub use model::charge::ChargeRecord;
pub use model::frame::{AtomCoords, Block, Frame};
pub use model::selection::{AtomScheme, ParseAtomSchemeError};
pub use model::template::Template;

pub use io::{BlockReader, ChargeReader, FrameNumbering, OverflowPolicy};

pub use stitch::{
    COORDINATES_DIR, ChargeMerger, ChargeSlice, DEFAULT_CHARGES, DEFAULT_CLEAN, DEFAULT_COORDS,
    Exclusion, Framing, GatherConfig, GatherReport, HeaderGuard, IntegrityReport, JobCharges,
    JobRange, MergeConfig, MergeReport, MergeSettings, MergedReplicate, NanPolicy, ProjectConfig,
    ProjectReport, ProjectSettings, QM_CHARGE_FILE, QmChargeConfig, QmReplicateReport,
    REPLICATE_COLUMN, RUN_CHARGES, RUN_COORDS, RUN_DIR_PREFIX, ReconcileState, ReplicateReport,
    RetentionPolicy, RunOrder, RunOutcome, RunReport, Settings, StitchConfig, StitchSettings,
    Stitcher, Summary, UnitResult, align_charges, clean_sections, combine_qm_charges,
    combine_replicate_qm_charges, default_gather_ignore, default_ignore, discover_replicates,
    discover_runs, filter_sections, gather_single_points, merge_replicates, numeric_key,
    project_trajectory, read_job_charges, reconcile_all, reconcile_replicate, unit_name,
};

pub use stitch::Error as StitchError;
