//! Cellar Data -- data-driven drink definitions for the aging engine.
//!
//! Reads drink types from RON, TOML, or JSON files and builds a frozen
//! [`cellar_core::registry::Registry`], with an optional aging rules file.

pub mod loader;
pub mod schema;

pub use loader::{CellarData, DataLoadError, load_builtin, load_data_dir, load_from_env};
