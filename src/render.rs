//! The real-time half of the player: source swapping and rendering.
//!
//! [`Renderer::render`] is meant to be called once per block from the
//! audio callback. Everything it does is bounded-time: drain the result
//! queue (coalescing to the newest handle), retire the previous active
//! source into the reclamation pool, publish the new active source for
//! UI readers, reconcile the desired play state, and mix one block.
//! No locks, no heap traffic, no blocking calls.

use crate::reclaim::PoolInserter;
use crate::source::{RealtimeContextGuard, SourceHandle};
use crate::spsc;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Renderer {
    results: spsc::Consumer<Arc<SourceHandle>>,
    retirer: PoolInserter,
    active: Option<Arc<SourceHandle>>,
    desired_playing: Arc<AtomicBool>,
    /// Single-writer snapshot of the active source; only this renderer
    /// stores to it, UI threads only load.
    snapshot: Arc<ArcSwapOption<SourceHandle>>,
    channels: u16,
}

impl Renderer {
    pub(crate) fn new(
        results: spsc::Consumer<Arc<SourceHandle>>,
        retirer: PoolInserter,
        desired_playing: Arc<AtomicBool>,
        snapshot: Arc<ArcSwapOption<SourceHandle>>,
        channels: u16,
    ) -> Self {
        Self {
            results,
            retirer,
            active: None,
            desired_playing,
            snapshot,
            channels,
        }
    }

    /// Renders one block of `buffer.len() / channels` frames.
    ///
    /// Mixes onto the existing buffer contents; with no active source the
    /// buffer is left untouched (the caller clears for silence). Returns
    /// the number of frames mixed.
    pub fn render(&mut self, buffer: &mut [f32]) -> usize {
        let _guard = RealtimeContextGuard::enter();

        // Coalesce: of everything the loader published since the last
        // block, only the most recent load wins. Intermediate handles are
        // dropped here; the pool's liveness reference keeps their
        // destructors off this thread.
        let mut newest = None;
        while let Some(handle) = self.results.pop() {
            newest = Some(handle);
        }

        if let Some(next) = newest {
            if let Some(prev) = self.active.take() {
                // Saturation drops the reference; the pool still owns one.
                self.retirer.adopt(prev);
            }
            self.snapshot.store(Some(next.clone()));
            self.active = Some(next);
        }

        let Some(active) = &self.active else {
            return 0;
        };

        let desired = self.desired_playing.load(Ordering::Acquire);
        let actual = active.is_playing();
        if actual != desired {
            if actual {
                active.stop();
            } else if active.total_frames() > 0 {
                // A source with nothing to play back stays stopped.
                active.start();
            }
        }

        active.mix_into(buffer, self.channels)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::AudioData;
    use crate::diag::Diagnostics;
    use crate::reclaim::ReclamationPool;

    struct Rig {
        results: spsc::Producer<Arc<SourceHandle>>,
        pool: ReclamationPool,
        desired: Arc<AtomicBool>,
        snapshot: Arc<ArcSwapOption<SourceHandle>>,
        renderer: Renderer,
    }

    fn rig() -> Rig {
        let diag = Arc::new(Diagnostics::default());
        let mut pool = ReclamationPool::new();
        let retirer = pool.inserter(8, diag);
        let (results_tx, results_rx) = spsc::channel(8);
        let desired = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::new(ArcSwapOption::empty());
        let renderer = Renderer::new(results_rx, retirer, desired.clone(), snapshot.clone(), 2);
        Rig {
            results: results_tx,
            pool,
            desired,
            snapshot,
            renderer,
        }
    }

    impl Rig {
        /// Builds a handle the way the loader would: pool-adopted before
        /// it is published.
        fn loaded_handle(&mut self, name: &str, frames: usize) -> Arc<SourceHandle> {
            let data = AudioData::new(vec![0.5; frames], 48000, 1);
            let handle = Arc::new(SourceHandle::new(name, data.into()));
            self.pool.adopt(handle.clone());
            handle
        }

        fn active_identifier(&self) -> Option<String> {
            self.snapshot
                .load()
                .as_ref()
                .map(|h| h.identifier().to_string())
        }
    }

    #[test]
    fn test_no_active_source_leaves_buffer_untouched() {
        let mut rig = rig();
        let mut buffer = vec![0.7f32; 8];
        assert_eq!(rig.renderer.render(&mut buffer), 0);
        assert!(buffer.iter().all(|&s| s == 0.7));
        assert!(rig.active_identifier().is_none());
    }

    #[test]
    fn test_coalesces_to_most_recent_handle() {
        let mut rig = rig();
        let a = rig.loaded_handle("a.wav", 64);
        let b = rig.loaded_handle("b.wav", 64);
        let c = rig.loaded_handle("c.wav", 64);
        let probes = [Arc::downgrade(&a), Arc::downgrade(&b)];

        assert!(rig.results.push(a));
        assert!(rig.results.push(b));
        assert!(rig.results.push(c.clone()));

        let mut buffer = vec![0.0f32; 8];
        rig.renderer.render(&mut buffer);

        assert_eq!(rig.active_identifier().as_deref(), Some("c.wav"));
        // The losers were never rendered from and were never retired as
        // "previously active": the only reference left is the pool's.
        assert_eq!(c.position_frames(), 0);
        rig.pool.sweep();
        assert!(probes.iter().all(|p| p.upgrade().is_none()));
        assert_eq!(rig.pool.len(), 1);
    }

    #[test]
    fn test_swap_retires_previous_active() {
        let mut rig = rig();
        let first = rig.loaded_handle("first.wav", 64);
        let probe = Arc::downgrade(&first);
        assert!(rig.results.push(first));

        let mut buffer = vec![0.0f32; 8];
        rig.renderer.render(&mut buffer);
        assert_eq!(rig.active_identifier().as_deref(), Some("first.wav"));

        let second = rig.loaded_handle("second.wav", 64);
        assert!(rig.results.push(second));
        rig.renderer.render(&mut buffer);
        assert_eq!(rig.active_identifier().as_deref(), Some("second.wav"));

        // The first handle now lives only in the pool and dies on sweep.
        assert!(probe.upgrade().is_some());
        rig.pool.sweep();
        assert!(probe.upgrade().is_none());
    }

    #[test]
    fn test_starts_transport_when_play_desired() {
        let mut rig = rig();
        let h = rig.loaded_handle("a.wav", 64);
        assert!(rig.results.push(h.clone()));
        rig.desired.store(true, Ordering::Release);

        let mut buffer = vec![0.0f32; 8];
        let frames = rig.renderer.render(&mut buffer);
        assert!(h.is_playing());
        assert_eq!(frames, 4);
        assert!(buffer.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_stops_transport_when_pause_desired() {
        let mut rig = rig();
        let h = rig.loaded_handle("a.wav", 64);
        assert!(rig.results.push(h.clone()));
        rig.desired.store(true, Ordering::Release);

        let mut buffer = vec![0.0f32; 8];
        rig.renderer.render(&mut buffer);
        assert!(h.is_playing());
        let position = h.position_frames();

        rig.desired.store(false, Ordering::Release);
        let frames = rig.renderer.render(&mut buffer);
        assert!(!h.is_playing());
        assert_eq!(frames, 0);
        // Stop pauses; the position is retained.
        assert_eq!(h.position_frames(), position);
    }

    #[test]
    fn test_matching_states_are_a_no_op() {
        let mut rig = rig();
        let h = rig.loaded_handle("a.wav", 64);
        assert!(rig.results.push(h.clone()));

        let mut buffer = vec![0.0f32; 8];
        // Stopped + stopped.
        rig.renderer.render(&mut buffer);
        assert!(!h.is_playing());

        // Playing + playing.
        rig.desired.store(true, Ordering::Release);
        rig.renderer.render(&mut buffer);
        let position = h.position_frames();
        rig.renderer.render(&mut buffer);
        assert!(h.is_playing());
        assert!(h.position_frames() > position);
    }

    #[test]
    fn test_empty_source_never_starts() {
        let mut rig = rig();
        let h = rig.loaded_handle("empty.wav", 0);
        assert!(rig.results.push(h.clone()));
        rig.desired.store(true, Ordering::Release);

        let mut buffer = vec![0.0f32; 8];
        assert_eq!(rig.renderer.render(&mut buffer), 0);
        assert!(!h.is_playing());
    }
}
