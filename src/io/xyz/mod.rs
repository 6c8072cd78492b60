mod reader;

pub use reader::{BlockReader, DEFAULT_FRAME_FIELD, FrameNumbering, open, read_atom_count};
