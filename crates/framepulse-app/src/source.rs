//! Frame duration sources
//!
//! A [`FrameSource`] yields one frame duration (nanoseconds) per call, in
//! arrival order. Benchmark runs pull from a source until their deadline.
//!
//! - [`ChannelFrameSource`] - fed by the host's frame-completion callback
//! - [`SyntheticFrameSource`] - paced render-loop simulation for headless runs
//! - [`ScriptedFrameSource`] - replays a fixed list of durations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::Instant;

use framepulse_core::prelude::*;

use crate::config::SyntheticSettings;

/// Supplier of frame durations
#[trait_variant::make(FrameSource: Send)]
pub trait LocalFrameSource {
    /// Wait for the next frame and return its duration in nanoseconds.
    ///
    /// `None` means the source is exhausted or disconnected.
    async fn next_frame(&mut self) -> Option<u64>;

    /// Whether the source can currently produce frames.
    fn is_available(&self) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel source (host frame callback)
// ─────────────────────────────────────────────────────────────────────────────

/// Default number of frames buffered between the callback and the consumer.
pub const DEFAULT_FRAME_CHANNEL_CAPACITY: usize = 256;

/// Create a connected callback/source pair.
pub fn frame_channel(capacity: usize) -> (FrameCallback, ChannelFrameSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FrameCallback {
            tx,
            dropped: Arc::clone(&dropped),
        },
        ChannelFrameSource { rx, dropped },
    )
}

/// Sending half handed to the host's frame-completion callback.
///
/// Reporting never blocks the callback thread: when the buffer is full the
/// sample is dropped and counted in [`dropped_samples`](Self::dropped_samples).
#[derive(Debug, Clone)]
pub struct FrameCallback {
    tx: mpsc::Sender<u64>,
    dropped: Arc<AtomicU64>,
}

impl FrameCallback {
    /// Report one completed frame.
    pub fn report(&self, duration_nanos: u64) -> Result<()> {
        match self.tx.try_send(duration_nanos) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 {
                    warn!("Frame channel full, frame samples are being dropped");
                } else {
                    trace!("Frame channel full, dropping {}ns sample", duration_nanos);
                }
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::ChannelClosed),
        }
    }

    /// Samples discarded because the consumer fell behind.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Report a frame from a [`Duration`].
    pub fn report_duration(&self, duration: Duration) -> Result<()> {
        self.report(duration.as_nanos().min(u64::MAX as u128) as u64)
    }

    /// Whether the consuming side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half consumed by a benchmark run or live monitor.
#[derive(Debug)]
pub struct ChannelFrameSource {
    rx: mpsc::Receiver<u64>,
    dropped: Arc<AtomicU64>,
}

impl ChannelFrameSource {
    /// Samples the callback discarded because this side fell behind.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for ChannelFrameSource {
    fn drop(&mut self) {
        let dropped = self.dropped_samples();
        if dropped > 0 {
            warn!("Frame channel dropped {} samples while full", dropped);
        }
    }
}

impl FrameSource for ChannelFrameSource {
    async fn next_frame(&mut self) -> Option<u64> {
        self.rx.recv().await
    }

    fn is_available(&self) -> bool {
        !(self.rx.is_closed() && self.rx.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthetic source
// ─────────────────────────────────────────────────────────────────────────────

/// Simulated render loop: waits roughly one target frame interval per call
/// and reports the measured elapsed time.
///
/// Every `stall_every`th frame (when non-zero) takes `stall_ms` instead, to
/// produce dropped frames.
#[derive(Debug)]
pub struct SyntheticFrameSource {
    target: Duration,
    jitter: Duration,
    stall_every: u64,
    stall: Duration,
    frame_index: u64,
    rng: StdRng,
}

impl SyntheticFrameSource {
    pub fn new(settings: &SyntheticSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Deterministic jitter for tests.
    pub fn seeded(settings: &SyntheticSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: &SyntheticSettings, rng: StdRng) -> Self {
        Self {
            target: Duration::from_millis(settings.target_frame_ms.max(1)),
            jitter: Duration::from_millis(settings.jitter_ms),
            stall_every: settings.stall_every,
            stall: Duration::from_millis(settings.stall_ms),
            frame_index: 0,
            rng,
        }
    }

    fn next_interval(&mut self) -> Duration {
        self.frame_index += 1;
        if self.stall_every > 0 && self.frame_index % self.stall_every == 0 {
            return self.stall;
        }
        if self.jitter.is_zero() {
            return self.target;
        }
        let jitter_nanos = self.jitter.as_nanos() as i64;
        let offset = self.rng.gen_range(-jitter_nanos..=jitter_nanos);
        let nanos = (self.target.as_nanos() as i64 + offset).max(1);
        Duration::from_nanos(nanos as u64)
    }
}

impl FrameSource for SyntheticFrameSource {
    async fn next_frame(&mut self) -> Option<u64> {
        let interval = self.next_interval();
        let frame_start = Instant::now();
        tokio::time::sleep(interval).await;
        let elapsed = frame_start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        Some(elapsed.max(1))
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted source
// ─────────────────────────────────────────────────────────────────────────────

/// Replays a fixed list of durations.
///
/// By default each frame takes its own duration of wall-clock time to
/// arrive, so time-bounded consumers make progress. Use
/// [`unpaced`](Self::unpaced) to yield frames immediately.
#[derive(Debug, Clone)]
pub struct ScriptedFrameSource {
    durations: Vec<u64>,
    cursor: usize,
    cycle: bool,
    paced: bool,
}

impl ScriptedFrameSource {
    pub fn new(durations: impl Into<Vec<u64>>) -> Self {
        Self {
            durations: durations.into(),
            cursor: 0,
            cycle: false,
            paced: true,
        }
    }

    /// Repeat the script forever.
    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Yield frames without waiting.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn advance(&mut self) -> Option<u64> {
        if self.cursor >= self.durations.len() {
            if !self.cycle || self.durations.is_empty() {
                return None;
            }
            self.cursor = 0;
        }
        let duration = self.durations[self.cursor];
        self.cursor += 1;
        Some(duration)
    }
}

impl FrameSource for ScriptedFrameSource {
    async fn next_frame(&mut self) -> Option<u64> {
        let duration = self.advance()?;
        if self.paced {
            tokio::time::sleep(Duration::from_nanos(duration)).await;
        }
        Some(duration)
    }

    fn is_available(&self) -> bool {
        !self.durations.is_empty()
    }
}
