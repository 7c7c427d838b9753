//! Utility modules shared across the workspace.
//!
//! # Modules
//!
//! - [`fs`]: Required-input checks and all-or-nothing file writes

pub mod fs;
