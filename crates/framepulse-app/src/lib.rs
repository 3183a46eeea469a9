//! framepulse-app - Frame metrics aggregation and benchmark orchestration
//!
//! This crate holds the live rolling-window aggregator, the benchmark run
//! state machine, and the collaborator seams it drives: frame sources, the
//! resource probe, the result history store and the preferences store.
//! Settings loading lives in [`config`].

pub mod aggregator;
pub mod benchmark;
pub mod config;
pub mod preferences;
pub mod probe;
pub mod source;
pub mod store;

// Re-export primary types
pub use aggregator::FrameMetricsAggregator;
pub use benchmark::{BenchmarkCanceller, BenchmarkHandle, BenchmarkRunner, DEFAULT_MAX_SAMPLES};
pub use config::{Preferences, Settings};
pub use preferences::{PreferencesStore, SharedPreferences};
pub use probe::{FixedResourceProbe, ResourceProbe};
pub use source::{
    frame_channel, ChannelFrameSource, FrameCallback, FrameSource, ScriptedFrameSource,
    SyntheticFrameSource, DEFAULT_FRAME_CHANNEL_CAPACITY,
};
pub use store::{ResultStore, SharedResultStore, DEFAULT_PROFILE_LIMIT, DEFAULT_RECENT_LIMIT};
