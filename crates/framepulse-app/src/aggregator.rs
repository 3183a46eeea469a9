//! Rolling-window frame metrics aggregation.
//!
//! [`FrameMetricsAggregator`] ingests one frame duration at a time, keeps the
//! most recent N samples, and republishes an [`FpsSnapshot`] through a
//! latest-value `watch` cell once enough samples have accumulated.
//!
//! The aggregator is single-writer: whoever owns it (the frame callback, or a
//! benchmark loop) calls [`ingest`](FrameMetricsAggregator::ingest) through
//! `&mut self`. Readers subscribe and only ever see the newest snapshot.

use framepulse_core::performance::{
    is_dropped_frame, FpsSnapshot, FrameTimeStats, RingBuffer, DEFAULT_WINDOW_CAPACITY,
    MIN_SAMPLES_FOR_SNAPSHOT,
};
use framepulse_core::prelude::*;
use tokio::sync::watch;

/// Live frame statistics over a bounded rolling window.
#[derive(Debug)]
pub struct FrameMetricsAggregator {
    /// Arrival-ordered window of durations (nanoseconds).
    window: RingBuffer<u64>,
    /// The same samples kept in ascending order, updated on every push/evict.
    sorted: Vec<u64>,
    sum_nanos: u128,
    total_frames: u64,
    dropped_frames: u64,
    published: watch::Sender<FpsSnapshot>,
}

impl Default for FrameMetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameMetricsAggregator {
    /// Aggregator with the standard 120-sample window.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }

    /// Aggregator with a custom window capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let window = RingBuffer::new(capacity);
        let sorted = Vec::with_capacity(window.capacity());
        let (published, _) = watch::channel(FpsSnapshot::ZERO);
        Self {
            window,
            sorted,
            sum_nanos: 0,
            total_frames: 0,
            dropped_frames: 0,
            published,
        }
    }

    /// Ingest one frame duration and return the currently published snapshot.
    ///
    /// Zero-length samples are ignored. Until the window holds
    /// [`MIN_SAMPLES_FOR_SNAPSHOT`] samples the previous snapshot (initially
    /// [`FpsSnapshot::ZERO`]) is returned unchanged.
    pub fn ingest(&mut self, duration_nanos: u64) -> FpsSnapshot {
        self.ingest_fresh(duration_nanos).unwrap_or_else(|| self.snapshot())
    }

    /// Like [`ingest`](Self::ingest), but returns `Some` only when a fresh
    /// snapshot was computed and published by this call.
    pub fn ingest_fresh(&mut self, duration_nanos: u64) -> Option<FpsSnapshot> {
        if let Err(e) = validate_sample(duration_nanos) {
            trace!("Ignoring frame sample: {}", e);
            return None;
        }

        self.record(duration_nanos);

        if self.window.len() < MIN_SAMPLES_FOR_SNAPSHOT {
            return None;
        }

        let stats = self.frame_time_stats()?;
        let snapshot = FpsSnapshot::from_stats(
            &stats,
            duration_nanos,
            self.total_frames,
            self.dropped_frames,
        );
        self.published.send_replace(snapshot);
        Some(snapshot)
    }

    /// Clear the window and both counters, and publish the zero snapshot.
    pub fn reset(&mut self) {
        self.window.clear();
        self.sorted.clear();
        self.sum_nanos = 0;
        self.total_frames = 0;
        self.dropped_frames = 0;
        self.published.send_replace(FpsSnapshot::ZERO);
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> FpsSnapshot {
        *self.published.borrow()
    }

    /// Subscribe to published snapshots (latest-value semantics).
    pub fn subscribe(&self) -> watch::Receiver<FpsSnapshot> {
        self.published.subscribe()
    }

    /// Order statistics (p50/p95/p99) over the current window.
    ///
    /// Available as soon as the window holds one sample, independently of
    /// the snapshot publication threshold.
    pub fn frame_time_stats(&self) -> Option<FrameTimeStats> {
        FrameTimeStats::from_sorted(&self.sorted, self.sum_nanos)
    }

    /// Samples currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = u64> + '_ {
        self.window.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    fn record(&mut self, duration_nanos: u64) {
        if let Some(evicted) = self.window.push(duration_nanos) {
            let idx = self.sorted.partition_point(|&d| d < evicted);
            self.sorted.remove(idx);
            self.sum_nanos -= evicted as u128;
        }

        let idx = self.sorted.partition_point(|&d| d <= duration_nanos);
        self.sorted.insert(idx, duration_nanos);
        self.sum_nanos += duration_nanos as u128;

        self.total_frames += 1;
        if is_dropped_frame(duration_nanos) {
            self.dropped_frames += 1;
        }
    }
}

fn validate_sample(duration_nanos: u64) -> Result<()> {
    if duration_nanos == 0 {
        return Err(Error::InvalidSample { duration_nanos });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
