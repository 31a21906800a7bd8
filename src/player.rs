//! Control-thread facade wiring the whole player together.

use crate::audio_data::AudioSourceLoader;
use crate::background::{BackgroundLoader, LoadSubmitter};
use crate::config::PlayerDesc;
use crate::diag::{Diagnostics, DiagnosticsSnapshot};
use crate::error::{Result, SwapdeckError};
use crate::reclaim::{Housekeeper, ReclamationPool};
use crate::render::Renderer;
use crate::source::SourceHandle;
use crate::spsc;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking snapshot of whatever source is currently active.
///
/// Read from the single-writer snapshot the audio thread publishes, so it
/// is always a consistent view of one source, never a half-swapped state.
#[derive(Debug, Clone)]
pub struct ActiveSource {
    pub identifier: String,
    pub sample_rate: u32,
    pub total_frames: usize,
    pub position_frames: usize,
    pub playing: bool,
}

/// The control surface of the player.
///
/// Owns the loader and housekeeping threads; the matching [`Renderer`]
/// returned by [`FilePlayer::new`] is handed to the audio callback. All
/// methods here are non-blocking and safe to call from a UI event loop.
pub struct FilePlayer {
    desc: PlayerDesc,
    submitter: LoadSubmitter,
    desired_playing: Arc<AtomicBool>,
    snapshot: Arc<ArcSwapOption<SourceHandle>>,
    diag: Arc<Diagnostics>,
    _background: BackgroundLoader,
    _housekeeper: Housekeeper,
}

impl FilePlayer {
    /// Builds the queues, pool, and worker threads, returning the control
    /// surface and the real-time renderer.
    pub fn new(
        desc: PlayerDesc,
        loader: Arc<dyn AudioSourceLoader>,
    ) -> Result<(FilePlayer, Renderer)> {
        if desc.sample_rate == 0 || desc.channels == 0 {
            return Err(SwapdeckError::Configuration(
                "sample rate and channel count must be non-zero".to_string(),
            ));
        }
        if desc.request_queue_capacity == 0
            || desc.result_queue_capacity == 0
            || desc.retire_queue_capacity == 0
        {
            return Err(SwapdeckError::Configuration(
                "queue capacities must be non-zero".to_string(),
            ));
        }

        let diag = Arc::new(Diagnostics::default());
        let mut pool = ReclamationPool::new();
        // One dedicated hand-off per client thread: the loader registers
        // every handle it builds, the audio thread retires replaced ones.
        let registrar = pool.inserter(desc.retire_queue_capacity, diag.clone());
        let retirer = pool.inserter(desc.retire_queue_capacity, diag.clone());

        let (result_tx, result_rx) = spsc::channel(desc.result_queue_capacity);

        let (submitter, background) = BackgroundLoader::spawn(
            loader,
            desc.request_queue_capacity,
            result_tx,
            registrar,
            diag.clone(),
            desc.loader_wake_timeout,
        )
        .map_err(|e| SwapdeckError::Engine(format!("failed to spawn loader thread: {e}")))?;

        let housekeeper = Housekeeper::spawn(pool, desc.sweep_interval)
            .map_err(|e| SwapdeckError::Engine(format!("failed to spawn housekeeping: {e}")))?;

        let desired_playing = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::new(ArcSwapOption::empty());

        let renderer = Renderer::new(
            result_rx,
            retirer,
            desired_playing.clone(),
            snapshot.clone(),
            desc.channels,
        );

        let player = FilePlayer {
            desc,
            submitter,
            desired_playing,
            snapshot,
            diag,
            _background: background,
            _housekeeper: housekeeper,
        };

        Ok((player, renderer))
    }

    /// Submits a URL or path for background loading. Non-blocking;
    /// returns whether the request was accepted into the queue.
    pub fn submit_load(&mut self, identifier: &str) -> bool {
        self.submitter.submit(identifier)
    }

    /// Sets the desired transport state. The audio thread reconciles it
    /// against the active source on its next block.
    pub fn set_playing(&self, playing: bool) {
        self.desired_playing.store(playing, Ordering::Release);
    }

    pub fn playing_desired(&self) -> bool {
        self.desired_playing.load(Ordering::Acquire)
    }

    /// Snapshot of the currently active source, if any.
    pub fn active_source(&self) -> Option<ActiveSource> {
        self.snapshot.load_full().map(|handle| ActiveSource {
            identifier: handle.identifier().to_string(),
            sample_rate: handle.sample_rate(),
            total_frames: handle.total_frames(),
            position_frames: handle.position_frames(),
            playing: handle.is_playing(),
        })
    }

    /// The identifier worth persisting: the last successfully loaded
    /// source. Restore it later with [`restore`](Self::restore).
    pub fn persisted_identifier(&self) -> Option<String> {
        self.active_source().map(|s| s.identifier)
    }

    /// Restores a persisted identifier by resubmitting it as a load
    /// request.
    pub fn restore(&mut self, identifier: &str) -> bool {
        self.submit_load(identifier)
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diag.snapshot()
    }

    pub fn desc(&self) -> &PlayerDesc {
        &self.desc
    }
}
