mod reader;

pub use reader::{ChargeReader, open};
