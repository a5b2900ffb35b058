//! Champion statistics report generator.
//!
//! Reads a champion stats CSV, derives per-champion metrics (effective health, skill application
//! rates, role suitability scores), aggregates them and renders a multi-page landscape PDF with one
//! chart per page.

pub mod aggregate;
pub mod builder;
pub mod charts;
pub mod config;
pub mod error;
pub mod fonts;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
