//! Property-based tests for metrics and negative sampling.
