//! Settings parser for config.toml

use std::path::{Path, PathBuf};

use super::types::Settings;
use framepulse_core::prelude::*;

pub const CONFIG_FILENAME: &str = "config.toml";

/// Path of the settings file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

/// Load settings from `<data_dir>/config.toml`.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(data_dir: &Path) -> Settings {
    load_settings_file(&config_path(data_dir))
}

/// Load settings from an explicit file path.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings_file(path: &Path) -> Settings {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}

/// Create a commented default config.toml if none exists.
pub fn init_config_file(data_dir: &Path) -> Result<PathBuf> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| Error::config(format!("Failed to create data dir: {}", e)))?;
    }

    let path = config_path(data_dir);
    if !path.exists() {
        let default_content = r#"# framepulse configuration

[telemetry]
window_capacity = 120   # Rolling window for live statistics

[benchmark]
default_duration_ms = 10000
max_samples = 36000     # A run collecting more samples aborts
default_profile = "balanced"

[synthetic]
target_frame_ms = 16
jitter_ms = 2
stall_every = 0         # 0 disables periodic stall frames
stall_ms = 50

[probe]
cpu_usage_percent = 0.0
battery_temp_celsius = 0.0

[storage]
history_file = "history.json"
preferences_file = "preferences.toml"
"#;
        std::fs::write(&path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", path);
    }

    Ok(path)
}

/// Resolve the history and preferences file paths for a data directory.
pub fn storage_paths(data_dir: &Path, settings: &Settings) -> (PathBuf, PathBuf) {
    (
        data_dir.join(&settings.storage.history_file),
        data_dir.join(&settings.storage.preferences_file),
    )
}
