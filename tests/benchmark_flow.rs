//! Integration tests for the benchmark flow: preferences → runner → history

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use framepulse_app::{
    frame_channel, BenchmarkRunner, FixedResourceProbe, FrameMetricsAggregator, PreferencesStore,
    ResourceProbe, ResultStore, ScriptedFrameSource, SharedPreferences, SharedResultStore,
};
use framepulse_core::{
    AbortReason, BenchmarkPhase, BenchmarkRequest, BenchmarkResult, Result, RunOutcome,
};

const MS: u64 = 1_000_000;

/// Result store that records how many inserts it saw
#[derive(Debug)]
struct ObservedStore {
    inner: SharedResultStore,
    inserts: AtomicUsize,
}

impl ObservedStore {
    fn new(inner: SharedResultStore) -> Self {
        Self {
            inner,
            inserts: AtomicUsize::new(0),
        }
    }
}

impl ResultStore for ObservedStore {
    async fn insert(&self, result: BenchmarkResult) -> Result<BenchmarkResult> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(result).await
    }

    async fn recent(&self, limit: usize, profile: Option<&str>) -> Result<Vec<BenchmarkResult>> {
        self.inner.recent(limit, profile).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.inner.clear_all().await
    }
}

fn probe() -> Option<Arc<dyn ResourceProbe>> {
    Some(Arc::new(FixedResourceProbe::new(42.0, 36.5)))
}

/// 60 Hz with a 50ms hitch every tenth frame
fn hitching_frames() -> ScriptedFrameSource {
    let mut script = vec![16 * MS; 9];
    script.push(50 * MS);
    ScriptedFrameSource::new(script).cycle()
}

#[tokio::test(start_paused = true)]
async fn test_profile_from_preferences_tags_persisted_result() {
    let temp = TempDir::new().unwrap();
    let history_path = temp.path().join("history.json");
    let prefs = SharedPreferences::open(temp.path().join("preferences.toml"));
    prefs.set_current_profile("performance").await.unwrap();

    let store = Arc::new(ObservedStore::new(
        SharedResultStore::open(&history_path).unwrap(),
    ));
    let runner = Arc::new(BenchmarkRunner::new(Arc::clone(&store), probe()));

    let request = BenchmarkRequest::new(1000, prefs.current_profile().await);
    let outcome = runner
        .start(request, hitching_frames())
        .unwrap()
        .join()
        .await
        .unwrap();

    let result = outcome.result().expect("run completed").clone();
    assert_eq!(result.profile_used, "performance");
    assert_eq!(result.duration_ms, 1000);
    assert_eq!(result.cpu_usage_percent, 42.0);
    assert!(result.dropped_frames >= 1);
    assert!(result.frame_time_p50_ms <= result.frame_time_p95_ms);
    assert!(result.frame_time_p95_ms <= result.frame_time_p99_ms);
    assert!((result.frame_time_p50_ms - 16.0).abs() < 1e-9);
    assert!((result.frame_time_p99_ms - 50.0).abs() < 1e-9);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);

    // Visible after reopening the history file
    let reopened = SharedResultStore::open(&history_path).unwrap();
    let history = reopened.recent(20, Some("performance")).await.unwrap();
    assert_eq!(history, vec![result]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_leaves_history_untouched() {
    let store = Arc::new(ObservedStore::new(SharedResultStore::in_memory()));
    let runner = Arc::new(BenchmarkRunner::new(Arc::clone(&store), probe()));
    let mut state = runner.subscribe();

    let handle = runner
        .start(BenchmarkRequest::new(5_000, "balanced"), hitching_frames())
        .unwrap();
    assert_eq!(state.borrow_and_update().phase, BenchmarkPhase::Running);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    handle.canceller().cancel();
    let outcome = handle.join().await.unwrap();

    assert_eq!(outcome, RunOutcome::Aborted(AbortReason::Cancelled));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert!(runner.recent(20, None).await.unwrap().is_empty());

    let final_state = state.borrow_and_update().clone();
    assert!(!final_state.is_running);
    assert_eq!(final_state.phase, BenchmarkPhase::Idle);
    assert!(final_state.current_result.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_live_monitor_and_benchmark_share_frames_but_not_windows() {
    let (callback, source) = frame_channel(512);
    let mut live = FrameMetricsAggregator::new();

    let store = Arc::new(ObservedStore::new(SharedResultStore::in_memory()));
    let runner = Arc::new(BenchmarkRunner::new(store, probe()));
    let handle = runner
        .start(BenchmarkRequest::new(1_000, "balanced"), source)
        .unwrap();

    // Host callback reports each frame to both consumers
    for i in 0..40u64 {
        let nanos = if i % 10 == 9 { 50 * MS } else { 16 * MS };
        live.ingest(nanos);
        callback.report(nanos).unwrap();
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    for _ in 0..30 {
        live.ingest(16 * MS);
    }

    let outcome = handle.join().await.unwrap();
    let result = outcome.result().expect("run completed");

    assert_eq!(result.total_frames, 40);
    assert_eq!(result.dropped_frames, 4);
    assert_eq!(live.total_frames(), 70);
    assert_eq!(live.dropped_frames(), 4);
    assert_eq!(live.len(), 70);
}

#[tokio::test(start_paused = true)]
async fn test_clear_then_rerun_continues_ids() {
    let store = Arc::new(SharedResultStore::in_memory());
    let runner = Arc::new(BenchmarkRunner::new(Arc::clone(&store), probe()));

    let first = runner
        .start(BenchmarkRequest::new(300, "balanced"), hitching_frames())
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(first.result().unwrap().id, Some(1));

    runner.clear().await.unwrap();
    assert!(store.is_empty().await);
    // Clearing history keeps the last result on the run state
    assert_eq!(runner.state().current_result.and_then(|r| r.id), Some(1));

    let second = runner
        .start(BenchmarkRequest::new(300, "battery"), hitching_frames())
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(second.result().unwrap().id, Some(2));
    assert_eq!(store.len().await, 1);
}
