//! Configuration file parsing for framepulse
//!
//! Supports:
//! - `<data dir>/config.toml` - Global settings
//! - `<data dir>/preferences.toml` - User preferences (see [`crate::preferences`])

pub mod settings;
pub mod types;

pub use settings::{
    config_path, init_config_file, load_settings, load_settings_file, storage_paths,
    CONFIG_FILENAME,
};
pub use types::*;
