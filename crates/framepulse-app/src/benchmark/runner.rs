//! Fixed-duration benchmark runs.
//!
//! A [`BenchmarkRunner`] drives one sampling session at a time through
//! `Idle → Running → Finalizing → Idle`, publishing [`BenchmarkRunState`]
//! through a latest-value `watch` cell.
//!
//! **Sampling loop:** each iteration races three things:
//! - the cancel signal (`watch::channel(false)`, `true` = stop)
//! - the run deadline
//! - the next frame from the [`FrameSource`]
//!
//! Frames feed a run-scoped [`FrameMetricsAggregator`] that is dropped when
//! the run ends. On a clean finish every sample of the run is reduced to
//! p50/p95/p99, the resource probe is sampled once, and the result is handed
//! to the [`ResultStore`]. Cancelled or starved runs return to `Idle` without
//! producing or storing anything.
//!
//! The aggregator never evicts during a run: a frame arriving once
//! `max_samples` are held ends the run with
//! [`AbortReason::SampleLimitReached`]. The loop yields after every frame so
//! an always-ready source cannot starve cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use framepulse_core::prelude::*;
use framepulse_core::{
    AbortReason, BenchmarkPhase, BenchmarkRequest, BenchmarkResult, BenchmarkRunState,
    RunOutcome, RunSummary,
};

use super::handle::BenchmarkHandle;
use crate::aggregator::FrameMetricsAggregator;
use crate::probe::ResourceProbe;
use crate::source::FrameSource;
use crate::store::ResultStore;

/// Default cap on samples a single run may collect: 10 minutes at 60 FPS.
pub const DEFAULT_MAX_SAMPLES: usize = 36_000;

/// Drives benchmark runs and publishes their state.
pub struct BenchmarkRunner<S> {
    store: Arc<S>,
    probe: Option<Arc<dyn ResourceProbe>>,
    state: watch::Sender<BenchmarkRunState>,
    max_samples: usize,
}

impl<S> BenchmarkRunner<S>
where
    S: ResultStore + Send + Sync + 'static,
{
    /// Create a runner. Without a probe every start fails with
    /// [`Error::SourceUnavailable`].
    pub fn new(store: Arc<S>, probe: Option<Arc<dyn ResourceProbe>>) -> Self {
        let (state, _) = watch::channel(BenchmarkRunState::default());
        Self {
            store,
            probe,
            state,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Cap the number of samples a run may collect. A run that outgrows the
    /// cap aborts with [`AbortReason::SampleLimitReached`].
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Subscribe to run state (latest-value semantics).
    pub fn subscribe(&self) -> watch::Receiver<BenchmarkRunState> {
        self.state.subscribe()
    }

    /// Current run state.
    pub fn state(&self) -> BenchmarkRunState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    /// Start a run on its own tokio task.
    ///
    /// Fails with [`Error::SourceUnavailable`] when the probe or the frame
    /// source is missing, and with [`Error::ConcurrentStartRejected`] while
    /// another run is active. In both cases no run state changes.
    pub fn start<F>(self: &Arc<Self>, request: BenchmarkRequest, source: F) -> Result<BenchmarkHandle>
    where
        F: FrameSource + Send + 'static,
    {
        let probe = self.begin(&request, &source)?;

        // Create the cancel channel outside the task so the handle owns the sender.
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let runner = Arc::clone(self);
        let task =
            tokio::spawn(async move { runner.drive(request, source, probe, cancel_rx).await });

        Ok(BenchmarkHandle::new(cancel_tx, task))
    }

    /// Run to completion on the caller's task.
    ///
    /// Sending `true` on the `cancel` channel stops the run early.
    pub async fn run<F>(
        &self,
        request: BenchmarkRequest,
        source: F,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunOutcome>
    where
        F: FrameSource,
    {
        let probe = self.begin(&request, &source)?;
        self.drive(request, source, probe, cancel).await
    }

    /// Delete all stored results. Valid in any state; run state is untouched.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear_all().await
    }

    /// Most recent stored results, optionally for one profile.
    pub async fn recent(&self, limit: usize, profile: Option<&str>) -> Result<Vec<BenchmarkResult>> {
        self.store.recent(limit, profile).await
    }

    /// Validate collaborators and atomically move `Idle → Running`.
    fn begin<F: FrameSource>(
        &self,
        request: &BenchmarkRequest,
        source: &F,
    ) -> Result<Arc<dyn ResourceProbe>> {
        let probe = self
            .probe
            .clone()
            .ok_or_else(|| Error::source_unavailable("resource probe"))?;

        if !source.is_available() {
            return Err(Error::source_unavailable("frame source"));
        }

        let accepted = self.state.send_if_modified(|state| {
            if state.is_active() {
                return false;
            }
            state.phase = BenchmarkPhase::Running;
            state.is_running = true;
            state.progress = 0.0;
            state.profile = Some(request.profile.clone());
            true
        });

        if !accepted {
            debug!(
                "Rejected benchmark start for profile '{}': run already active",
                request.profile
            );
            return Err(Error::ConcurrentStartRejected);
        }

        debug!(
            "Benchmark started: {}ms, profile '{}'",
            request.duration_ms, request.profile
        );
        Ok(probe)
    }

    async fn drive<F: FrameSource>(
        &self,
        request: BenchmarkRequest,
        mut source: F,
        probe: Arc<dyn ResourceProbe>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<RunOutcome> {
        // Returns the runner to Idle if this future is dropped or panics mid-run.
        let _idle_guard = IdleGuard { state: &self.state };

        let mut aggregator = FrameMetricsAggregator::with_capacity(self.max_samples);
        let duration = Duration::from_millis(request.duration_ms);
        let started = Instant::now();
        let deadline = started + duration;
        let mut cancel_open = true;

        let abort = loop {
            if *cancel.borrow() {
                break Some(AbortReason::Cancelled);
            }
            if started.elapsed() >= duration {
                break None;
            }

            tokio::select! {
                biased;

                changed = cancel.changed(), if cancel_open => {
                    // Sender dropped: nobody can cancel any more.
                    if changed.is_err() {
                        cancel_open = false;
                    }
                }

                _ = tokio::time::sleep_until(deadline) => break None,

                frame = source.next_frame() => match frame {
                    Some(_) if aggregator.len() >= aggregator.capacity() => {
                        warn!("Benchmark exceeded {} samples", aggregator.capacity());
                        break Some(AbortReason::SampleLimitReached);
                    }
                    Some(nanos) => {
                        aggregator.ingest(nanos);
                        let progress = progress_fraction(started.elapsed(), duration);
                        self.state.send_modify(|state| state.progress = progress);
                        trace!("Benchmark frame {}ns, progress {:.3}", nanos, progress);
                    }
                    None => break Some(AbortReason::SourceClosed),
                },
            }

            tokio::task::yield_now().await;
        };

        if let Some(reason) = abort {
            return Ok(self.abort(reason));
        }

        let Some(stats) = aggregator.frame_time_stats() else {
            return Ok(self.abort(AbortReason::NoFrames));
        };

        self.state.send_modify(|state| {
            state.phase = BenchmarkPhase::Finalizing;
            state.progress = 1.0;
        });

        let summary = RunSummary {
            timestamp: chrono::Utc::now().timestamp_millis(),
            duration_ms: request.duration_ms,
            total_frames: aggregator.total_frames(),
            dropped_frames: aggregator.dropped_frames(),
            cpu_usage_percent: probe.cpu_usage_percent(),
            battery_temp_celsius: probe.battery_temp_celsius(),
            profile_used: request.profile,
        };
        drop(aggregator);
        let result = BenchmarkResult::from_stats(&stats, summary);

        match self.store.insert(result).await {
            Ok(saved) => {
                info!(
                    "Benchmark complete: profile '{}', {} frames, avg {:.1} fps, p95 {:.2}ms",
                    saved.profile_used, saved.total_frames, saved.avg_fps, saved.frame_time_p95_ms
                );
                self.state.send_replace(BenchmarkRunState {
                    phase: BenchmarkPhase::Idle,
                    is_running: false,
                    progress: 1.0,
                    profile: None,
                    current_result: Some(saved.clone()),
                });
                Ok(RunOutcome::Completed(saved))
            }
            Err(e) => {
                warn!("Failed to store benchmark result: {}", e);
                self.state.send_if_modified(reset_to_idle);
                Err(e)
            }
        }
    }

    fn abort(&self, reason: AbortReason) -> RunOutcome {
        info!("Benchmark aborted: {}", reason);
        self.state.send_if_modified(reset_to_idle);
        RunOutcome::Aborted(reason)
    }
}

/// Elapsed fraction of a run, clamped to `[0, 1]`.
fn progress_fraction(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

/// Move an active state back to `Idle`, keeping the last completed result.
fn reset_to_idle(state: &mut BenchmarkRunState) -> bool {
    if !state.is_active() {
        return false;
    }
    state.phase = BenchmarkPhase::Idle;
    state.is_running = false;
    state.progress = 0.0;
    state.profile = None;
    true
}

struct IdleGuard<'a> {
    state: &'a watch::Sender<BenchmarkRunState>,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(reset_to_idle);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::probe::FixedResourceProbe;
    use crate::source::{frame_channel, ScriptedFrameSource};
    use crate::store::SharedResultStore;

    const MS: u64 = 1_000_000;

    /// Store that counts insert calls and can be told to fail them.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: Option<SharedResultStore>,
        inserts: AtomicUsize,
        fail_inserts: bool,
    }

    impl CountingStore {
        fn working() -> Self {
            Self {
                inner: Some(SharedResultStore::in_memory()),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail_inserts: true,
                ..Self::working()
            }
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }

        fn inner(&self) -> &SharedResultStore {
            self.inner.as_ref().expect("store configured")
        }
    }

    impl ResultStore for CountingStore {
        async fn insert(&self, result: BenchmarkResult) -> Result<BenchmarkResult> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts {
                return Err(Error::store("disk full"));
            }
            self.inner().insert(result).await
        }

        async fn recent(&self, limit: usize, profile: Option<&str>) -> Result<Vec<BenchmarkResult>> {
            self.inner().recent(limit, profile).await
        }

        async fn clear_all(&self) -> Result<()> {
            self.inner().clear_all().await
        }
    }

    fn probe() -> Option<Arc<dyn ResourceProbe>> {
        Some(Arc::new(FixedResourceProbe::new(25.0, 33.5)))
    }

    fn runner(store: CountingStore) -> Arc<BenchmarkRunner<CountingStore>> {
        Arc::new(BenchmarkRunner::new(Arc::new(store), probe()))
    }

    fn steady_source() -> ScriptedFrameSource {
        ScriptedFrameSource::new(vec![16 * MS, 16 * MS, 17 * MS, 40 * MS, 15 * MS]).cycle()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_completion_produces_one_result() {
        let runner = runner(CountingStore::working());

        let handle = runner
            .start(BenchmarkRequest::new(1000, "balanced"), steady_source())
            .unwrap();
        let outcome = handle.join().await.unwrap();

        let result = outcome.result().expect("completed").clone();
        assert_eq!(result.duration_ms, 1000);
        assert_eq!(result.profile_used, "balanced");
        assert_eq!(result.id, Some(1));
        assert!(result.total_frames > 0);
        assert!(result.dropped_frames > 0, "40ms frames count as dropped");
        assert!(result.frame_time_p50_ms <= result.frame_time_p95_ms);
        assert!(result.frame_time_p95_ms <= result.frame_time_p99_ms);
        assert_eq!(result.cpu_usage_percent, 25.0);
        assert_eq!(result.battery_temp_celsius, 33.5);

        assert_eq!(runner.store().inserts(), 1);
        let state = runner.state();
        assert!(!state.is_running);
        assert_eq!(state.phase, BenchmarkPhase::Idle);
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.current_result, Some(result.clone()));
        assert_eq!(runner.recent(20, None).await.unwrap(), vec![result]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_on_caller_task() {
        let runner = runner(CountingStore::working());
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let outcome = runner
            .run(BenchmarkRequest::new(500, "performance"), steady_source(), cancel_rx)
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert!(!runner.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_cancel_sender_does_not_stop_run() {
        let runner = runner(CountingStore::working());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        drop(cancel_tx);

        let outcome = runner
            .run(BenchmarkRequest::new(300, "balanced"), steady_source(), cancel_rx)
            .await
            .unwrap();
        assert!(outcome.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_completion_stores_nothing() {
        let runner = runner(CountingStore::working());

        let handle = runner
            .start(BenchmarkRequest::new(10_000, "balanced"), steady_source())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(runner.is_running());

        handle.cancel();
        let outcome = handle.join().await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(runner.store().inserts(), 0);
        let state = runner.state();
        assert!(!state.is_running);
        assert_eq!(state.phase, BenchmarkPhase::Idle);
        assert!(state.current_result.is_none());
        assert!(runner.recent(20, None).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected_while_running() {
        let runner = runner(CountingStore::working());

        let first = runner
            .start(BenchmarkRequest::new(1000, "balanced"), steady_source())
            .unwrap();
        let second = runner.start(BenchmarkRequest::new(1000, "battery"), steady_source());
        assert!(matches!(second, Err(Error::ConcurrentStartRejected)));
        assert_eq!(runner.state().profile.as_deref(), Some("balanced"));

        let outcome = first.join().await.unwrap();
        assert_eq!(outcome.result().unwrap().profile_used, "balanced");
        assert_eq!(runner.store().inserts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_restarts_after_completion() {
        let runner = runner(CountingStore::working());
        for expected_id in 1..=2 {
            let handle = runner
                .start(BenchmarkRequest::new(200, "balanced"), steady_source())
                .unwrap();
            let outcome = handle.join().await.unwrap();
            assert_eq!(outcome.result().unwrap().id, Some(expected_id));
        }
    }

    #[tokio::test]
    async fn test_missing_probe_is_source_unavailable() {
        let runner = Arc::new(BenchmarkRunner::new(
            Arc::new(CountingStore::working()),
            None,
        ));
        let err = runner
            .start(BenchmarkRequest::new(1000, "balanced"), steady_source())
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert_eq!(runner.state(), BenchmarkRunState::default());
    }

    #[tokio::test]
    async fn test_closed_frame_source_is_source_unavailable() {
        let runner = runner(CountingStore::working());
        let (callback, source) = frame_channel(8);
        drop(callback);

        let err = runner
            .start(BenchmarkRequest::new(1000, "balanced"), source)
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(!runner.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_closing_mid_run_aborts() {
        let runner = runner(CountingStore::working());
        let source = ScriptedFrameSource::new(vec![16 * MS; 5]);

        let outcome = runner
            .start(BenchmarkRequest::new(10_000, "balanced"), source)
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::SourceClosed));
        assert_eq!(runner.store().inserts(), 0);
        assert!(!runner.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_source_ends_at_deadline_without_result() {
        let runner = runner(CountingStore::working());
        let (_callback, source) = frame_channel(8);

        let outcome = runner
            .start(BenchmarkRequest::new(1000, "balanced"), source)
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::NoFrames));
        assert_eq!(runner.store().inserts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_fed_run_completes() {
        let runner = runner(CountingStore::working());
        let (callback, source) = frame_channel(64);

        let handle = runner
            .start(BenchmarkRequest::new(500, "balanced"), source)
            .unwrap();

        let feeder = tokio::spawn(async move {
            while callback.report(16 * MS).is_ok() {
                tokio::time::sleep(Duration::from_millis(16)).await;
            }
        });

        let outcome = handle.join().await.unwrap();
        let result = outcome.result().unwrap();
        assert!(result.total_frames >= 20);
        assert!((result.frame_time_p50_ms - 16.0).abs() < 1e-9);
        feeder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_returns_error_and_idles() {
        let runner = runner(CountingStore::failing());

        let err = runner
            .start(BenchmarkRequest::new(300, "balanced"), steady_source())
            .unwrap()
            .join()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store { .. }));
        assert_eq!(runner.store().inserts(), 1);
        let state = runner.state();
        assert!(!state.is_running);
        assert!(state.current_result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_published_mid_run() {
        let runner = runner(CountingStore::working());
        let mut rx = runner.subscribe();

        let handle = runner
            .start(BenchmarkRequest::new(1000, "balanced"), steady_source())
            .unwrap();
        assert!(rx.borrow_and_update().is_running);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let mid = runner.state();
        assert_eq!(mid.phase, BenchmarkPhase::Running);
        assert!(mid.progress > 0.3 && mid.progress < 0.6, "{}", mid.progress);

        handle.join().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_valid_in_any_state() {
        let runner = runner(CountingStore::working());
        runner
            .start(BenchmarkRequest::new(200, "balanced"), steady_source())
            .unwrap()
            .join()
            .await
            .unwrap();

        let handle = runner
            .start(BenchmarkRequest::new(5_000, "balanced"), steady_source())
            .unwrap();
        runner.clear().await.unwrap();
        assert!(runner.recent(20, None).await.unwrap().is_empty());
        assert!(runner.is_running(), "clear does not touch run state");

        handle.cancel();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_benchmark_does_not_touch_live_aggregator() {
        let mut live = FrameMetricsAggregator::new();
        for _ in 0..20 {
            live.ingest(16 * MS);
        }
        let before = live.snapshot();

        let runner = runner(CountingStore::working());
        runner
            .start(BenchmarkRequest::new(500, "balanced"), steady_source())
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(live.snapshot(), before);
        assert_eq!(live.total_frames(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_at_sample_limit_completes() {
        let runner = Arc::new(
            BenchmarkRunner::new(Arc::new(CountingStore::working()), probe())
                .with_max_samples(10),
        );
        // 20ms frames land at 20..=200ms; the 11th would arrive after the deadline
        let source = ScriptedFrameSource::new(vec![20 * MS]).cycle();

        let outcome = runner
            .start(BenchmarkRequest::new(210, "balanced"), source)
            .unwrap()
            .join()
            .await
            .unwrap();

        let result = outcome.result().expect("completed");
        assert_eq!(result.total_frames, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_past_sample_limit_aborts_without_result() {
        let runner = Arc::new(
            BenchmarkRunner::new(Arc::new(CountingStore::working()), probe())
                .with_max_samples(10),
        );
        // A slow start followed by fast frames: eviction would hide the slow ones
        let mut script = vec![100 * MS; 5];
        script.extend(std::iter::repeat(16 * MS).take(50));
        let source = ScriptedFrameSource::new(script);

        let outcome = runner
            .start(BenchmarkRequest::new(10_000, "balanced"), source)
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::SampleLimitReached));
        assert_eq!(runner.store().inserts(), 0);
        let state = runner.state();
        assert_eq!(state.phase, BenchmarkPhase::Idle);
        assert!(state.current_result.is_none());
    }

    #[tokio::test]
    async fn test_cancel_stops_run_on_always_ready_source() {
        let runner = runner(CountingStore::working());
        let source = ScriptedFrameSource::new(vec![16 * MS]).cycle().unpaced();

        let handle = runner
            .start(BenchmarkRequest::new(60_000, "balanced"), source)
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        handle.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("run noticed cancel")
            .unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(runner.store().inserts(), 0);
    }

    #[test]
    fn test_progress_fraction_clamps() {
        let d = Duration::from_millis(1000);
        assert_eq!(progress_fraction(Duration::ZERO, d), 0.0);
        assert_eq!(progress_fraction(Duration::from_millis(250), d), 0.25);
        assert_eq!(progress_fraction(Duration::from_millis(5000), d), 1.0);
        assert_eq!(progress_fraction(Duration::from_millis(5), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_reset_to_idle_keeps_last_result() {
        let mut state = BenchmarkRunState {
            phase: BenchmarkPhase::Running,
            is_running: true,
            progress: 0.7,
            profile: Some("balanced".into()),
            current_result: None,
        };
        assert!(reset_to_idle(&mut state));
        assert_eq!(state, BenchmarkRunState::default());
        assert!(!reset_to_idle(&mut state));
    }
}
