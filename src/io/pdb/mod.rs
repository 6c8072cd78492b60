mod framing;
mod projector;
mod template;

pub use framing::{EnsembleSink, FlatSink, FrameSink, PerFrameSink};
pub use projector::{COORD_END, COORD_START, FIELD_WIDTH, OverflowPolicy, ProjectionReport, Projector};
pub use template::{open_template, read_template};
