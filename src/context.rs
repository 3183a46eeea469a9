//! Shared state for CLI commands: resolved settings plus the opened stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use framepulse_app::config::{init_config_file, load_settings, load_settings_file, storage_paths};
use framepulse_app::{
    FixedResourceProbe, Preferences, ResourceProbe, Settings, SharedPreferences,
    SharedResultStore,
};
use framepulse_core::prelude::*;

/// Everything a command needs, opened once at startup.
#[derive(Debug)]
pub struct AppContext {
    pub data_dir: PathBuf,
    pub settings: Settings,
    pub store: Arc<SharedResultStore>,
    pub prefs: SharedPreferences,
}

impl AppContext {
    /// Open the data directory.
    ///
    /// With no explicit `config` file, `<data_dir>/config.toml` is created with
    /// commented defaults on first use.
    pub fn open(data_dir: &Path, config: Option<&Path>) -> Result<Self> {
        std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;

        let settings = match config {
            Some(path) => load_settings_file(path),
            None => {
                init_config_file(data_dir)?;
                load_settings(data_dir)
            }
        };

        let (history_path, prefs_path) = storage_paths(data_dir, &settings);
        let store = SharedResultStore::open(history_path)?;
        let prefs = SharedPreferences::open_with_defaults(
            prefs_path,
            Preferences {
                current_profile: settings.benchmark.default_profile.clone(),
                ..Preferences::default()
            },
        );

        debug!("Opened data directory {}", data_dir.display());
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            settings,
            store: Arc::new(store),
            prefs,
        })
    }

    /// Resource probe configured by `[probe]`.
    pub fn probe(&self) -> Arc<dyn ResourceProbe> {
        Arc::new(FixedResourceProbe::from(&self.settings.probe))
    }
}
