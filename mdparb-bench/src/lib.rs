//! # mdparb Bench
//!
//! Benchmarking utilities for mdparb: reproducible A/B feed scenarios and
//! latency collection.

pub mod latency;
pub mod scenario;
