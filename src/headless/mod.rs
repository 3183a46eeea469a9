//! Headless output - NDJSON events on stdout
//!
//! Every CLI command reports through [`HeadlessEvent`]s so scripts can parse
//! the output line by line instead of scraping text.
//!
//! # Event Format
//!
//! Events are output as NDJSON (newline-delimited JSON), one event per line.
//! Each event has an "event" field indicating its type, along with event-specific data.
//!
//! # Example Output
//!
//! ```json
//! {"event":"benchmark_started","duration_ms":10000,"profile":"balanced","timestamp":1704700001000}
//! {"event":"progress","progress":0.1,"timestamp":1704700002000}
//! {"event":"benchmark_aborted","reason":"cancelled","timestamp":1704700003000}
//! ```

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use framepulse_core::{AbortReason, BenchmarkResult, FpsSnapshot};

/// Events emitted on stdout
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Live statistics were republished
    Snapshot {
        current_fps: f64,
        avg_fps: f64,
        min_fps: f64,
        max_fps: f64,
        p95_frame_time_ms: f64,
        total_frames: u64,
        dropped_frames: u64,
        timestamp: i64,
    },

    /// Benchmark run accepted and sampling
    BenchmarkStarted {
        duration_ms: u64,
        profile: String,
        timestamp: i64,
    },

    /// Benchmark crossed another progress step
    Progress { progress: f64, timestamp: i64 },

    /// Benchmark finished and its result was stored
    BenchmarkCompleted {
        result: BenchmarkResult,
        timestamp: i64,
    },

    /// Benchmark ended without a result
    BenchmarkAborted {
        reason: AbortReason,
        message: String,
        timestamp: i64,
    },

    /// One stored history record
    #[serde(rename = "result")]
    HistoryEntry { result: BenchmarkResult },

    /// Stored history was deleted
    HistoryCleared { timestamp: i64 },

    /// Current benchmark profile
    Profile { profile: String, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        // Flush so piped consumers see events as they happen
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn snapshot(snapshot: &FpsSnapshot) -> Self {
        Self::Snapshot {
            current_fps: snapshot.current_fps,
            avg_fps: snapshot.avg_fps,
            min_fps: snapshot.min_fps,
            max_fps: snapshot.max_fps,
            p95_frame_time_ms: snapshot.p95_frame_time_ms,
            total_frames: snapshot.total_frames,
            dropped_frames: snapshot.dropped_frames,
            timestamp: Self::now(),
        }
    }

    pub fn benchmark_started(duration_ms: u64, profile: &str) -> Self {
        Self::BenchmarkStarted {
            duration_ms,
            profile: profile.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self::Progress {
            progress,
            timestamp: Self::now(),
        }
    }

    pub fn benchmark_completed(result: BenchmarkResult) -> Self {
        Self::BenchmarkCompleted {
            result,
            timestamp: Self::now(),
        }
    }

    pub fn benchmark_aborted(reason: AbortReason) -> Self {
        Self::BenchmarkAborted {
            reason,
            message: reason.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn history_entry(result: BenchmarkResult) -> Self {
        Self::HistoryEntry { result }
    }

    pub fn history_cleared() -> Self {
        Self::HistoryCleared {
            timestamp: Self::now(),
        }
    }

    pub fn profile(profile: &str) -> Self {
        Self::Profile {
            profile: profile.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepulse_core::{FrameTimeStats, RunSummary};

    fn to_value(event: &HeadlessEvent) -> serde_json::Value {
        let json = serde_json::to_string(event).expect("serialization failed");
        serde_json::from_str(&json).expect("invalid JSON")
    }

    fn sample_result() -> BenchmarkResult {
        let stats = FrameTimeStats::from_unsorted([16_000_000, 17_000_000, 40_000_000])
            .expect("non-empty");
        BenchmarkResult::from_stats(
            &stats,
            RunSummary {
                timestamp: 1_704_700_000_000,
                duration_ms: 1000,
                total_frames: 3,
                dropped_frames: 1,
                cpu_usage_percent: 12.5,
                battery_temp_celsius: 31.0,
                profile_used: "balanced".to_string(),
            },
        )
        .with_id(7)
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = FpsSnapshot {
            current_fps: 60.0,
            avg_fps: 58.5,
            min_fps: 30.0,
            max_fps: 62.5,
            p95_frame_time_ms: 33.0,
            total_frames: 120,
            dropped_frames: 2,
        };
        let value = to_value(&HeadlessEvent::snapshot(&snapshot));

        assert_eq!(value["event"], "snapshot");
        assert_eq!(value["avg_fps"], 58.5);
        assert_eq!(value["total_frames"], 120);
        assert_eq!(value["dropped_frames"], 2);
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_benchmark_completed_nests_result() {
        let value = to_value(&HeadlessEvent::benchmark_completed(sample_result()));

        assert_eq!(value["event"], "benchmark_completed");
        assert_eq!(value["result"]["id"], 7);
        assert_eq!(value["result"]["profile_used"], "balanced");
        assert_eq!(value["result"]["duration_ms"], 1000);
    }

    #[test]
    fn test_benchmark_aborted_serialization() {
        let value = to_value(&HeadlessEvent::benchmark_aborted(AbortReason::Cancelled));

        assert_eq!(value["event"], "benchmark_aborted");
        assert_eq!(value["reason"], "cancelled");
        assert_eq!(value["message"], "benchmark was cancelled");
    }

    #[test]
    fn test_sample_limit_abort_serialization() {
        let value = to_value(&HeadlessEvent::benchmark_aborted(
            AbortReason::SampleLimitReached,
        ));

        assert_eq!(value["reason"], "sample_limit_reached");
        assert_eq!(value["message"], "sample limit reached");
    }

    #[test]
    fn test_history_entry_uses_result_tag() {
        let value = to_value(&HeadlessEvent::history_entry(sample_result()));

        assert_eq!(value["event"], "result");
        assert_eq!(value["result"]["dropped_frames"], 1);
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn test_progress_and_profile_serialization() {
        let progress = to_value(&HeadlessEvent::progress(0.5));
        assert_eq!(progress["event"], "progress");
        assert_eq!(progress["progress"], 0.5);

        let profile = to_value(&HeadlessEvent::profile("battery"));
        assert_eq!(profile["event"], "profile");
        assert_eq!(profile["profile"], "battery");
    }

    #[test]
    fn test_error_serialization() {
        let value = to_value(&HeadlessEvent::error("disk full".to_string(), false));

        assert_eq!(value["event"], "error");
        assert_eq!(value["message"], "disk full");
        assert_eq!(value["fatal"], false);
    }
}
