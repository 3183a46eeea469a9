//! User preferences (current profile label, overlay flag)
//!
//! The benchmark core only reads the current profile to tag results; the
//! store itself is a plain key-value file.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use framepulse_core::prelude::*;

use crate::config::Preferences;

/// Get/set access to persisted preferences
#[trait_variant::make(PreferencesStore: Send)]
pub trait LocalPreferencesStore {
    /// Profile label used to tag new benchmark results
    async fn current_profile(&self) -> String;

    /// Persist a new current profile
    async fn set_current_profile(&self, profile: &str) -> Result<()>;

    /// Whether the overlay was left enabled
    async fn overlay_enabled(&self) -> bool;

    /// Persist the overlay flag
    async fn set_overlay_enabled(&self, enabled: bool) -> Result<()>;
}

/// Preferences held in memory and optionally mirrored to a TOML file.
#[derive(Debug)]
pub struct SharedPreferences {
    prefs: RwLock<Preferences>,
    path: Option<PathBuf>,
}

impl SharedPreferences {
    pub fn in_memory() -> Self {
        Self {
            prefs: RwLock::new(Preferences::default()),
            path: None,
        }
    }

    /// Load preferences from `path`, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_defaults(path, Preferences::default())
    }

    /// Like [`open`](Self::open), with caller-supplied fallback values.
    pub fn open_with_defaults(path: impl Into<PathBuf>, defaults: Preferences) -> Self {
        let path = path.into();
        Self {
            prefs: RwLock::new(load_preferences(&path).unwrap_or(defaults)),
            path: Some(path),
        }
    }

    /// Copy of the current preferences.
    pub async fn snapshot(&self) -> Preferences {
        self.prefs.read().await.clone()
    }

    async fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<()> {
        let mut prefs = self.prefs.write().await;
        let mut next = prefs.clone();
        apply(&mut next);
        if let Some(path) = &self.path {
            save_preferences(path, &next)?;
        }
        *prefs = next;
        Ok(())
    }
}

impl PreferencesStore for SharedPreferences {
    async fn current_profile(&self) -> String {
        self.prefs.read().await.current_profile.clone()
    }

    async fn set_current_profile(&self, profile: &str) -> Result<()> {
        let profile = profile.trim();
        if profile.is_empty() {
            return Err(Error::config("Profile name must not be empty"));
        }
        let profile = profile.to_string();
        self.update(|prefs| prefs.current_profile = profile).await
    }

    async fn overlay_enabled(&self) -> bool {
        self.prefs.read().await.overlay_enabled
    }

    async fn set_overlay_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|prefs| prefs.overlay_enabled = enabled).await
    }
}

/// Load preferences from a TOML file.
///
/// Returns `None` if the file doesn't exist or can't be parsed.
pub fn load_preferences(path: &Path) -> Option<Preferences> {
    if !path.exists() {
        debug!("No preferences file at {:?}", path);
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(prefs) => {
                debug!("Loaded preferences from {:?}", path);
                Some(prefs)
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            None
        }
    }
}

/// Save preferences to a TOML file.
///
/// Uses atomic write (temp file + rename) for safety.
pub fn save_preferences(path: &Path, prefs: &Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::config(format!("Failed to create preferences dir: {}", e)))?;
        }
    }

    let header = "# framepulse user preferences\n\n";
    let content = toml::to_string_pretty(prefs)
        .map_err(|e| Error::config(format!("Failed to serialize preferences: {}", e)))?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, format!("{}{}", header, content))
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    debug!("Saved preferences to {:?}", path);
    Ok(())
}
