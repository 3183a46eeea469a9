//! # Frame Timing Domain Types
//!
//! Domain data types for frame-duration samples, rolling-window statistics,
//! and a generic ring buffer for rolling history storage.
//!
//! These types are the shared vocabulary between:
//! - `framepulse-app` (live aggregation, benchmark finalization)
//! - the `framepulse` binary (NDJSON output)

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Rolling window size used by the live telemetry aggregator.
pub const DEFAULT_WINDOW_CAPACITY: usize = 120;

/// A snapshot is only published once the window holds this many samples.
pub const MIN_SAMPLES_FOR_SNAPSHOT: usize = 10;

/// One frame budget at 30 Hz. Frames longer than this count as dropped,
/// regardless of the display's native refresh rate.
pub const DROPPED_FRAME_THRESHOLD_MS: f64 = 33.33;

/// Upper bound for every published FPS value.
pub const MAX_REPORTED_FPS: f64 = 240.0;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Convert a nanosecond duration to fractional milliseconds.
pub fn nanos_to_ms(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_MILLI
}

/// Whether a frame of this duration overran the 30 Hz budget.
pub fn is_dropped_frame(duration_nanos: u64) -> bool {
    nanos_to_ms(duration_nanos) > DROPPED_FRAME_THRESHOLD_MS
}

/// Invert a frame time into a rate, clamped to `[0, MAX_REPORTED_FPS]`.
///
/// Near-zero durations would otherwise produce unbounded rates.
pub fn fps_from_frame_ms(frame_ms: f64) -> f64 {
    if frame_ms <= 0.0 {
        return MAX_REPORTED_FPS;
    }
    (1000.0 / frame_ms).clamp(0.0, MAX_REPORTED_FPS)
}

/// Index of the `percent`th percentile in an ascending slice of length `len`.
///
/// `floor(percent / 100 * len)`, no interpolation. Computed in integers so
/// that e.g. the 99th percentile of 100 samples is exactly index 99.
/// Clamped to the last element.
pub fn percentile_index(len: usize, percent: usize) -> usize {
    debug_assert!(len > 0);
    (len * percent / 100).min(len.saturating_sub(1))
}

// ── FrameTimeStats ───────────────────────────────────────────────────────────

/// Order statistics of a window of frame durations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTimeStats {
    pub sample_count: usize,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl FrameTimeStats {
    /// Compute stats from ascending durations (nanoseconds) and their sum.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_sorted(sorted: &[u64], sum_nanos: u128) -> Option<Self> {
        let n = sorted.len();
        let first = *sorted.first()?;
        let last = *sorted.last()?;
        let avg_nanos = sum_nanos as f64 / n as f64;

        Some(Self {
            sample_count: n,
            avg_ms: avg_nanos / NANOS_PER_MILLI,
            min_ms: nanos_to_ms(first),
            max_ms: nanos_to_ms(last),
            p50_ms: nanos_to_ms(sorted[percentile_index(n, 50)]),
            p95_ms: nanos_to_ms(sorted[percentile_index(n, 95)]),
            p99_ms: nanos_to_ms(sorted[percentile_index(n, 99)]),
        })
    }

    /// Compute stats from durations in any order.
    pub fn from_unsorted(durations: impl IntoIterator<Item = u64>) -> Option<Self> {
        let mut sorted: Vec<u64> = durations.into_iter().collect();
        sorted.sort_unstable();
        let sum = sorted.iter().map(|&d| d as u128).sum();
        Self::from_sorted(&sorted, sum)
    }

    /// Rate implied by the mean frame time.
    pub fn avg_fps(&self) -> f64 {
        fps_from_frame_ms(self.avg_ms)
    }

    /// Rate implied by the worst (longest) frame.
    pub fn min_fps(&self) -> f64 {
        fps_from_frame_ms(self.max_ms)
    }

    /// Rate implied by the best (shortest) frame.
    pub fn max_fps(&self) -> f64 {
        fps_from_frame_ms(self.min_ms)
    }
}

// ── FpsSnapshot ──────────────────────────────────────────────────────────────

/// Point-in-time readout of live frame statistics.
///
/// `current_fps` reflects the latest single frame; every other rate is
/// derived from the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FpsSnapshot {
    pub current_fps: f64,
    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    /// 95th percentile frame *time* in milliseconds.
    pub p95_frame_time_ms: f64,
    /// Frames ingested since the last reset.
    pub total_frames: u64,
    /// Frames over [`DROPPED_FRAME_THRESHOLD_MS`] since the last reset.
    pub dropped_frames: u64,
}

impl FpsSnapshot {
    /// The value published before any statistics exist.
    pub const ZERO: FpsSnapshot = FpsSnapshot {
        current_fps: 0.0,
        avg_fps: 0.0,
        min_fps: 0.0,
        max_fps: 0.0,
        p95_frame_time_ms: 0.0,
        total_frames: 0,
        dropped_frames: 0,
    };

    /// Assemble a snapshot from window stats and the latest sample.
    pub fn from_stats(
        stats: &FrameTimeStats,
        latest_nanos: u64,
        total_frames: u64,
        dropped_frames: u64,
    ) -> Self {
        Self {
            current_fps: fps_from_frame_ms(nanos_to_ms(latest_nanos)),
            avg_fps: stats.avg_fps(),
            min_fps: stats.min_fps(),
            max_fps: stats.max_fps(),
            p95_frame_time_ms: stats.p95_ms,
            total_frames,
            dropped_frames,
        }
    }

    /// Whether this is the all-zero initial snapshot.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

// ── RingBuffer<T> ────────────────────────────────────────────────────────────

/// A fixed-capacity circular buffer that overwrites the oldest entries
/// when full. Used for rolling frame windows.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted oldest value if at capacity.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// Get the most recently pushed item.
    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Clear all items.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
