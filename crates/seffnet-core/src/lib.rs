//! SEffNet Core: shared errors and file utilities.
//!
//! This crate has no internal SEffNet dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`util`]: Input-file checks, all-or-nothing writes, process identity

#![forbid(unsafe_code)]

pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};

pub use util::fs::{current_user, require_file, write_all_or_nothing};
