//! Report writers for assessment results.
//!
//! - [`json`]: the machine-readable report document, written to `--output`.
//! - [`terminal`]: colored summary box and component table; respects `--verbose` / `--quiet`.

pub mod json;
pub mod terminal;
