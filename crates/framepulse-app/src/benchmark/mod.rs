//! Benchmark orchestration
//!
//! - [`BenchmarkRunner`] - one-run-at-a-time state machine
//! - [`BenchmarkHandle`], [`BenchmarkCanceller`] - control of a spawned run

mod handle;
mod runner;

pub use handle::{BenchmarkCanceller, BenchmarkHandle};
pub use runner::{BenchmarkRunner, DEFAULT_MAX_SAMPLES};
