//! # Benchmark Domain Types
//!
//! The run-scoped state published while a benchmark executes, and the
//! immutable result record it produces on completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::performance::FrameTimeStats;

/// Profile label used when no preference has been stored.
pub const DEFAULT_PROFILE: &str = "balanced";

// ── BenchmarkRequest ─────────────────────────────────────────────────────────

/// Parameters for a single benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRequest {
    /// Wall-clock length of the sampling session.
    pub duration_ms: u64,
    /// Profile label recorded on the result.
    pub profile: String,
}

impl BenchmarkRequest {
    pub fn new(duration_ms: u64, profile: impl Into<String>) -> Self {
        Self {
            duration_ms,
            profile: profile.into(),
        }
    }
}

// ── BenchmarkResult ──────────────────────────────────────────────────────────

/// Finalized summary of a completed benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Surrogate identity assigned by the result store.
    #[serde(default)]
    pub id: Option<i64>,
    /// Completion time as unix milliseconds.
    pub timestamp: i64,
    pub duration_ms: u64,
    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub frame_time_p50_ms: f64,
    pub frame_time_p95_ms: f64,
    pub frame_time_p99_ms: f64,
    pub total_frames: u64,
    pub dropped_frames: u64,
    pub cpu_usage_percent: f32,
    pub battery_temp_celsius: f32,
    pub profile_used: String,
}

/// Everything needed to build a [`BenchmarkResult`] besides the window stats.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub timestamp: i64,
    pub duration_ms: u64,
    pub total_frames: u64,
    pub dropped_frames: u64,
    pub cpu_usage_percent: f32,
    pub battery_temp_celsius: f32,
    pub profile_used: String,
}

impl BenchmarkResult {
    /// Build an unsaved result (no id) from final window stats.
    pub fn from_stats(stats: &FrameTimeStats, summary: RunSummary) -> Self {
        Self {
            id: None,
            timestamp: summary.timestamp,
            duration_ms: summary.duration_ms,
            avg_fps: stats.avg_fps(),
            min_fps: stats.min_fps(),
            max_fps: stats.max_fps(),
            frame_time_p50_ms: stats.p50_ms,
            frame_time_p95_ms: stats.p95_ms,
            frame_time_p99_ms: stats.p99_ms,
            total_frames: summary.total_frames,
            dropped_frames: summary.dropped_frames,
            cpu_usage_percent: summary.cpu_usage_percent.clamp(0.0, 100.0),
            battery_temp_celsius: summary.battery_temp_celsius,
            profile_used: summary.profile_used,
        }
    }

    /// Completion time, if `timestamp` is a representable instant.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Copy of this result carrying a store-assigned id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Share of frames that overran the 30 Hz budget (0.0–1.0).
    pub fn dropped_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.dropped_frames as f64 / self.total_frames as f64
    }
}

// ── BenchmarkRunState ────────────────────────────────────────────────────────

/// Lifecycle phase of a benchmark runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkPhase {
    #[default]
    Idle,
    Running,
    Finalizing,
}

/// Latest-value state observed by UI layers while a benchmark runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BenchmarkRunState {
    pub phase: BenchmarkPhase,
    pub is_running: bool,
    /// Elapsed fraction of the run in `[0, 1]`.
    pub progress: f64,
    /// Profile of the active run, if any.
    pub profile: Option<String>,
    /// Result of the most recently completed run.
    pub current_result: Option<BenchmarkResult>,
}

impl BenchmarkRunState {
    /// Whether a run is active (running or finalizing).
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, BenchmarkPhase::Idle)
    }
}

// ── RunOutcome ───────────────────────────────────────────────────────────────

/// Why a run ended without producing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// An external stop request arrived before the deadline.
    Cancelled,
    /// The frame source stopped producing frames mid-run.
    SourceClosed,
    /// The deadline passed without a single frame being sampled.
    NoFrames,
    /// More frames arrived than the run may hold.
    SampleLimitReached,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "benchmark was cancelled"),
            AbortReason::SourceClosed => write!(f, "frame source closed"),
            AbortReason::NoFrames => write!(f, "no frames were sampled"),
            AbortReason::SampleLimitReached => write!(f, "sample limit reached"),
        }
    }
}

/// How a benchmark run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(BenchmarkResult),
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn result(&self) -> Option<&BenchmarkResult> {
        match self {
            RunOutcome::Completed(result) => Some(result),
            RunOutcome::Aborted(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}
