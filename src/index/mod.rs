pub mod build;
pub mod engine;
pub mod stats;
pub mod types;

pub use build::{BatchSink, rebuild_index, run_pipeline};
pub use engine::{PageIndex, PageIndexWriter, index_exists};
pub use types::*;
