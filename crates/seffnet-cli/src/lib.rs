//! # seffnet-cli
//!
//! The `seffnet` command-line tool.
//!
//! - `split`: cluster-aware train/test edge lists, cached between runs
//! - `subgraph`: shortest-path explanation subgraphs
//! - `evaluate`, `train`, `repeat`, `optimize`: embedding experiments
//! - `config`: inspect and edit the TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use cli::{Cli, Command, ConfigAction};
pub use commands::run;
pub use config::SeffnetConfig;
