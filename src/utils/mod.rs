//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and configuration (XDG-compliant)
//! - [`cancel`] - Cancellation token for background work
//! - [`logging`] - `tracing` subscriber setup
//! - [`progress`] - Progress bars (no-op without the `progress` feature)

pub mod app_data;
pub mod cancel;
pub mod logging;
pub mod progress;

pub use app_data::*;
pub use cancel::CancelToken;
pub use logging::{LogTarget, init_logging};
