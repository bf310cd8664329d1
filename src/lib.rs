//! # mandex - Terminal Manual Page Browser
//!
//! mandex browses, searches and reads the manual pages installed on the
//! system. Keyword search goes through `apropos`; an optional full-text
//! index built in parallel over every page body enables deep search with
//! excerpts.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`pages`] - Page catalog, section filters and the system page source
//! - [`index`] - Full-text index: engine wrapper and the parallel rebuild pipeline
//! - [`query`] - Deep search results, excerpts and fuzzy suggestions
//! - [`tui`] - Interactive browser (navigation state machine and rendering)
//! - [`output`] - Plain-text result formatting
//! - [`utils`] - Configuration, logging, progress bars and cancellation
//!
//! ## Quick Start
//!
//! ```ignore
//! use mandex::pages::SystemPages;
//! use mandex::index::{BuildOptions, rebuild_index};
//! use mandex::query::search;
//! use mandex::utils::CancelToken;
//! use mandex::pages::PageSource;
//! use std::path::Path;
//!
//! let source = SystemPages::new(&[]);
//! let catalog = source.list().unwrap();
//! let location = Path::new("/tmp/mandex-index");
//!
//! let report = rebuild_index(
//!     location,
//!     &catalog,
//!     &source,
//!     &BuildOptions::default(),
//!     &CancelToken::new(),
//!     &mut |_| {},
//! )
//! .unwrap();
//! println!("indexed {} of {}", report.indexed, report.processed);
//!
//! for result in search(location, "socket").unwrap() {
//!     println!("{} ({} excerpts)", result.page, result.excerpt_count);
//! }
//! ```

pub mod error;
pub mod index;
pub mod output;
pub mod pages;
pub mod query;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;

pub use error::{Error, Result};
