//! Benchmark result history
//!
//! This module provides the ResultStore trait the benchmark runner hands
//! finished results to, and [`SharedResultStore`], an in-memory history that
//! can be mirrored to a JSON file.
//!
//! Guarantees:
//! - a successful `insert` is visible to every later `recent` call
//! - `clear_all` holds the write lock for the whole clear, so readers see
//!   either the full history or none of it

use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use framepulse_core::prelude::*;
use framepulse_core::BenchmarkResult;

/// Default number of results returned by history queries.
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Default number of results returned by per-profile history queries.
pub const DEFAULT_PROFILE_LIMIT: usize = 5;

/// Durable storage for benchmark results
#[trait_variant::make(ResultStore: Send)]
pub trait LocalResultStore {
    /// Store a result, returning it with its assigned id
    async fn insert(&self, result: BenchmarkResult) -> Result<BenchmarkResult>;

    /// Most recent results first, optionally restricted to one profile
    async fn recent(&self, limit: usize, profile: Option<&str>) -> Result<Vec<BenchmarkResult>>;

    /// Delete every stored result
    async fn clear_all(&self) -> Result<()>;
}

/// On-disk layout of the history file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct History {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    results: Vec<BenchmarkResult>,
}

impl History {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Result history shared between the runner and readers.
#[derive(Debug)]
pub struct SharedResultStore {
    history: RwLock<History>,
    path: Option<PathBuf>,
}

impl SharedResultStore {
    /// History that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            history: RwLock::new(History::default()),
            path: None,
        }
    }

    /// History mirrored to a JSON file, loading existing entries if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let history = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let mut history: History = serde_json::from_str(&content)
                .map_err(|e| Error::store(format!("Corrupt history file {:?}: {}", path, e)))?;
            let max_id = history.results.iter().filter_map(|r| r.id).max().unwrap_or(0);
            history.next_id = history.next_id.max(max_id);
            debug!(
                "Loaded {} benchmark results from {:?}",
                history.results.len(),
                path
            );
            history
        } else {
            History::default()
        };

        Ok(Self {
            history: RwLock::new(history),
            path: Some(path),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored results.
    pub async fn len(&self) -> usize {
        self.history.read().await.results.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn persist(&self, history: &History) -> Result<()> {
        match &self.path {
            Some(path) => write_history(path, history),
            None => Ok(()),
        }
    }
}

impl ResultStore for SharedResultStore {
    async fn insert(&self, result: BenchmarkResult) -> Result<BenchmarkResult> {
        let mut history = self.history.write().await;

        let previous_next_id = history.next_id;
        let saved = result.with_id(history.allocate_id());
        history.results.push(saved.clone());

        if let Err(e) = self.persist(&history) {
            history.results.pop();
            history.next_id = previous_next_id;
            return Err(e);
        }

        debug!(
            "Stored benchmark result {:?} ({} total)",
            saved.id,
            history.results.len()
        );
        Ok(saved)
    }

    async fn recent(&self, limit: usize, profile: Option<&str>) -> Result<Vec<BenchmarkResult>> {
        let history = self.history.read().await;

        let mut results: Vec<BenchmarkResult> = history
            .results
            .iter()
            .filter(|r| profile.map_or(true, |p| r.profile_used == p))
            .cloned()
            .collect();

        results.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        results.truncate(limit);
        Ok(results)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut history = self.history.write().await;
        let cleared = History {
            next_id: history.next_id,
            results: Vec::new(),
        };
        self.persist(&cleared)?;
        let removed = history.results.len();
        *history = cleared;
        info!("Cleared {} benchmark results", removed);
        Ok(())
    }
}

/// Write the history atomically: locked temp file, then rename.
fn write_history(path: &Path, history: &History) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::store(format!("Failed to create history dir: {}", e)))?;
        }
    }

    let content = serde_json::to_string_pretty(history)?;
    let temp_path = path.with_extension("json.tmp");

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::store(format!("Failed to open {:?}: {}", temp_path, e)))?;

    // Lock is released when the file is dropped
    file.lock_exclusive()
        .map_err(|e| Error::store(format!("Failed to lock {:?}: {}", temp_path, e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| Error::store(format!("Failed to write history: {}", e)))?;
    file.flush()
        .map_err(|e| Error::store(format!("Failed to flush history: {}", e)))?;
    drop(file);

    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::store(format!("Failed to replace history file: {}", e)))?;

    Ok(())
}
