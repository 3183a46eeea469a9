//! Configuration types for framepulse
//!
//! Defines:
//! - `Settings` - Global application settings (config.toml)
//! - `Preferences` - Persisted user preferences (preferences.toml)
//! - Related sub-types

use serde::{Deserialize, Serialize};

use framepulse_core::benchmark::DEFAULT_PROFILE;
use framepulse_core::performance::DEFAULT_WINDOW_CAPACITY;

use crate::benchmark::DEFAULT_MAX_SAMPLES;

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub telemetry: TelemetrySettings,

    #[serde(default)]
    pub benchmark: BenchmarkSettings,

    #[serde(default)]
    pub synthetic: SyntheticSettings,

    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Live telemetry settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetrySettings {
    /// Rolling window size for live statistics
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
        }
    }
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

// ─────────────────────────────────────────────────────────────────────────────
// Benchmark Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark run settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BenchmarkSettings {
    /// Run length used when none is given on the command line
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,

    /// Most samples one run may collect before it aborts
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Profile used when no preference has been stored
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            max_samples: default_max_samples(),
            default_profile: default_profile(),
        }
    }
}

fn default_duration_ms() -> u64 {
    10_000
}

fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthetic Source Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Simulated render loop used for headless runs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyntheticSettings {
    /// Target frame interval in milliseconds (~60 FPS by default)
    #[serde(default = "default_target_frame_ms")]
    pub target_frame_ms: u64,

    /// Uniform jitter applied to each frame, +/- milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Insert a stall frame every N frames (0 = never)
    #[serde(default)]
    pub stall_every: u64,

    /// Duration of a stall frame in milliseconds
    #[serde(default = "default_stall_ms")]
    pub stall_ms: u64,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            target_frame_ms: default_target_frame_ms(),
            jitter_ms: default_jitter_ms(),
            stall_every: 0,
            stall_ms: default_stall_ms(),
        }
    }
}

fn default_target_frame_ms() -> u64 {
    16
}

fn default_jitter_ms() -> u64 {
    2
}

fn default_stall_ms() -> u64 {
    50
}

// ─────────────────────────────────────────────────────────────────────────────
// Probe Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed resource readings reported at benchmark finalization
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ProbeSettings {
    #[serde(default)]
    pub cpu_usage_percent: f32,

    #[serde(default)]
    pub battery_temp_celsius: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Settings
// ─────────────────────────────────────────────────────────────────────────────

/// File names beneath the data directory
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_history_file")]
    pub history_file: String,

    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            preferences_file: default_preferences_file(),
        }
    }
}

fn default_history_file() -> String {
    "history.json".to_string()
}

fn default_preferences_file() -> String {
    "preferences.toml".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// User Preferences
// ─────────────────────────────────────────────────────────────────────────────

/// Persisted user preferences (preferences.toml)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Preferences {
    /// Profile label recorded on benchmark results
    #[serde(default = "default_profile")]
    pub current_profile: String,

    /// Whether the overlay was last left enabled
    #[serde(default)]
    pub overlay_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            current_profile: default_profile(),
            overlay_enabled: false,
        }
    }
}
