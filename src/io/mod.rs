//! Readers and writers for the text formats a simulation produces.
//!
//! - [`xyz`]: frame blocks of a coordinate trajectory
//! - [`charge`]: tab-separated per-frame charge rows
//! - [`pdb`]: fixed-column structure templates and projected output
//!
//! Everything here streams; nothing loads a whole trajectory into memory.

use std::fmt;

pub mod charge;
pub mod error;
pub mod pdb;
pub mod util;
pub mod xyz;

pub use charge::ChargeReader;
pub use error::Error;
pub use pdb::{
    EnsembleSink, FlatSink, FrameSink, OverflowPolicy, PerFrameSink, ProjectionReport, Projector,
    open_template, read_template,
};
pub use util::AtomicFile;
pub use xyz::{BlockReader, FrameNumbering, read_atom_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xyz,
    Charge,
    Pdb,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xyz => write!(f, "XYZ"),
            Format::Charge => write!(f, "charge"),
            Format::Pdb => write!(f, "PDB"),
        }
    }
}
