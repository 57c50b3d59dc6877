//! Catalog scanner.
//!
//! This crate provides:
//! - Discovery of `<root>/<owner>/<file>.<ext>` trees
//! - Token assignment and in-place renaming to `<token>.<ext>`
//! - One migration task per renamed file, in deterministic order

pub mod error;
pub mod scanner;

pub use error::{CatalogError, CatalogResult};
pub use scanner::{split_extension, CatalogScanner, PlannedFile, ScanConfig, DEFAULT_SKIP_NAMES};
