//! Integration test suite for SEffNet training and optimization.
//!
//! Drives the orchestrators end to end over edge-list files, from graph
//! splits through embedding backends to the JSON reports.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
