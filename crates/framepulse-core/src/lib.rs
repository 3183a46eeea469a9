//! # framepulse-core - Core Domain Types
//!
//! Foundation crate for framepulse. Provides frame-timing domain types, the
//! rolling-window statistics algorithm, benchmark records, error handling and
//! logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Frame Timing (`performance`)
//! - [`FpsSnapshot`] - Live statistics readout (current/avg/min/max FPS, p95 frame time)
//! - [`FrameTimeStats`] - Order statistics (p50/p95/p99) over a window of durations
//! - [`RingBuffer`] - Fixed-capacity FIFO window
//!
//! ### Benchmarks (`benchmark`)
//! - [`BenchmarkResult`] - Immutable record of a completed run
//! - [`BenchmarkRunState`], [`BenchmarkPhase`] - Observable run state
//! - [`RunOutcome`], [`AbortReason`] - How a run ended
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use framepulse_core::prelude::*;
//! ```

pub mod benchmark;
pub mod error;
pub mod logging;
pub mod performance;

/// Prelude for common imports used throughout all framepulse crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use benchmark::{
    AbortReason, BenchmarkPhase, BenchmarkRequest, BenchmarkResult, BenchmarkRunState,
    RunOutcome, RunSummary, DEFAULT_PROFILE,
};
pub use error::{Error, Result, ResultExt};
pub use performance::{
    fps_from_frame_ms, is_dropped_frame, nanos_to_ms, percentile_index, FpsSnapshot,
    FrameTimeStats, RingBuffer, DEFAULT_WINDOW_CAPACITY, DROPPED_FRAME_THRESHOLD_MS,
    MAX_REPORTED_FPS, MIN_SAMPLES_FOR_SNAPSHOT,
};
