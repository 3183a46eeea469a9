//! Command runners - each CLI subcommand drives the library and reports
//! through [`HeadlessEvent`]s.

use std::future::Future;
use std::sync::Arc;

use framepulse_app::{
    BenchmarkRunner, FrameMetricsAggregator, FrameSource, PreferencesStore, ResultStore,
    SyntheticFrameSource, DEFAULT_PROFILE_LIMIT, DEFAULT_RECENT_LIMIT,
};
use framepulse_core::prelude::*;
use framepulse_core::{BenchmarkRequest, BenchmarkResult, FpsSnapshot, RunOutcome};

use super::HeadlessEvent;
use crate::context::AppContext;

/// Number of progress events emitted over a full run.
const PROGRESS_STEPS: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// live
// ─────────────────────────────────────────────────────────────────────────────

/// Feed `frames` synthetic frames into a live aggregator, emitting a
/// `snapshot` event each time the published statistics change.
pub async fn run_live(ctx: &AppContext, frames: u64) -> Result<FpsSnapshot> {
    let source = SyntheticFrameSource::new(&ctx.settings.synthetic);
    live_with_source(ctx.settings.telemetry.window_capacity, frames, source).await
}

/// [`run_live`] over any frame source. Returns the last published snapshot.
pub async fn live_with_source<F: FrameSource>(
    window_capacity: usize,
    frames: u64,
    mut source: F,
) -> Result<FpsSnapshot> {
    let mut aggregator = FrameMetricsAggregator::with_capacity(window_capacity);

    // Observer sees the latest snapshot only, like any UI subscriber would
    let mut snapshots = aggregator.subscribe();
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = *snapshots.borrow_and_update();
            HeadlessEvent::snapshot(&snapshot).emit();
        }
    });

    info!("Live monitor: {} frames, window {}", frames, window_capacity);
    for _ in 0..frames {
        let Some(nanos) = source.next_frame().await else {
            warn!("Frame source ended early after {} frames", aggregator.total_frames());
            break;
        };
        aggregator.ingest(nanos);
    }

    let last = aggregator.snapshot();
    // Dropping the aggregator closes the snapshot channel and ends the printer
    drop(aggregator);
    printer.await.map_err(|e| Error::task_join(e.to_string()))?;

    Ok(last)
}

// ─────────────────────────────────────────────────────────────────────────────
// bench
// ─────────────────────────────────────────────────────────────────────────────

/// Run one benchmark against the synthetic source. Ctrl-C cancels the run.
pub async fn run_bench(
    ctx: &AppContext,
    duration_ms: Option<u64>,
    profile: Option<String>,
) -> Result<RunOutcome> {
    let request = resolve_request(ctx, duration_ms, profile).await;
    let source = SyntheticFrameSource::new(&ctx.settings.synthetic);
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    bench_with_source(ctx, request, source, ctrl_c).await
}

/// Fill in defaults: duration from `[benchmark]`, profile from preferences.
pub async fn resolve_request(
    ctx: &AppContext,
    duration_ms: Option<u64>,
    profile: Option<String>,
) -> BenchmarkRequest {
    let duration_ms = duration_ms.unwrap_or(ctx.settings.benchmark.default_duration_ms);
    let profile = match profile {
        Some(profile) => profile,
        None => ctx.prefs.current_profile().await,
    };
    BenchmarkRequest::new(duration_ms, profile)
}

/// Run a benchmark over `source` until it completes or `stop` resolves.
///
/// Emits `benchmark_started`, `progress` every tenth of the run, then
/// `benchmark_completed` or `benchmark_aborted`.
pub async fn bench_with_source<F, C>(
    ctx: &AppContext,
    request: BenchmarkRequest,
    source: F,
    stop: C,
) -> Result<RunOutcome>
where
    F: FrameSource + Send + 'static,
    C: Future<Output = ()> + Send + 'static,
{
    let runner = Arc::new(
        BenchmarkRunner::new(Arc::clone(&ctx.store), Some(ctx.probe()))
            .with_max_samples(ctx.settings.benchmark.max_samples),
    );
    let mut state_rx = runner.subscribe();

    let handle = runner.start(request.clone(), source)?;
    HeadlessEvent::benchmark_started(request.duration_ms, &request.profile).emit();

    let canceller = handle.canceller();
    let stop_watcher = tokio::spawn(async move {
        stop.await;
        info!("Stop requested, cancelling benchmark");
        canceller.cancel();
    });

    let join = handle.join();
    tokio::pin!(join);
    let mut reported_step = 0;
    let outcome = loop {
        tokio::select! {
            outcome = &mut join => break outcome,
            Ok(()) = state_rx.changed() => {
                let progress = state_rx.borrow_and_update().progress;
                if let Some(step) = next_progress_step(progress, reported_step) {
                    reported_step = step;
                    HeadlessEvent::progress(progress).emit();
                }
            }
        }
    };
    stop_watcher.abort();

    let outcome = outcome?;
    match &outcome {
        RunOutcome::Completed(result) => {
            HeadlessEvent::benchmark_completed(result.clone()).emit();
        }
        RunOutcome::Aborted(reason) => HeadlessEvent::benchmark_aborted(*reason).emit(),
    }
    Ok(outcome)
}

/// The progress step newly reached, if `progress` passed `reported`.
fn next_progress_step(progress: f64, reported: u32) -> Option<u32> {
    let step = ((progress * PROGRESS_STEPS as f64).floor() as u32).min(PROGRESS_STEPS);
    (step > reported).then_some(step)
}

// ─────────────────────────────────────────────────────────────────────────────
// history / clear / profile
// ─────────────────────────────────────────────────────────────────────────────

/// Emit one `result` event per stored record, newest first.
///
/// Without an explicit limit, 20 records are listed, or 5 when filtering by
/// profile.
pub async fn run_history(
    ctx: &AppContext,
    limit: Option<usize>,
    profile: Option<&str>,
) -> Result<Vec<BenchmarkResult>> {
    let limit = limit.unwrap_or(match profile {
        Some(_) => DEFAULT_PROFILE_LIMIT,
        None => DEFAULT_RECENT_LIMIT,
    });

    let results = ctx.store.recent(limit, profile).await?;
    for result in &results {
        HeadlessEvent::history_entry(result.clone()).emit();
    }
    Ok(results)
}

/// Delete all stored results.
pub async fn run_clear(ctx: &AppContext) -> Result<()> {
    ctx.store.clear_all().await?;
    HeadlessEvent::history_cleared().emit();
    Ok(())
}

/// Print the current profile, or set it when `name` is given.
pub async fn run_profile(ctx: &AppContext, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        ctx.prefs.set_current_profile(name).await?;
        info!("Current profile set to '{}'", name.trim());
    }
    let profile = ctx.prefs.current_profile().await;
    HeadlessEvent::profile(&profile).emit();
    Ok(profile)
}
