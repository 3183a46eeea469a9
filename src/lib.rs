//! framepulse
//!
//! Frame-rate telemetry and benchmarking from the command line. The
//! aggregation and benchmark logic lives in `framepulse-app`; this crate
//! wires it to settings, on-disk stores and NDJSON output.

pub mod context;
pub mod headless;

// Re-export main entry points
pub use context::AppContext;
pub use headless::runner::{run_bench, run_clear, run_history, run_live, run_profile};
pub use headless::HeadlessEvent;
