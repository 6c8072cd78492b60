//! Core data structures flowing through `traj-stitch`.
//!
//! - [`frame`] – Raw coordinate blocks and their parsed per-atom tokens.
//! - [`charge`] – Tab-separated charge rows identified only by position.
//! - [`template`] – Fixed-width atom records used as the projection template.
//! - [`selection`] – Closed set of atom-selection schemes over a template.
//!
//! Every type here is read once and filtered, never mutated in place: the
//! reconciliation pipeline decides which blocks and rows survive and writes
//! them through unchanged.

pub mod charge;
pub mod frame;
pub mod selection;
pub mod template;
