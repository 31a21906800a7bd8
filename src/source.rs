//! Reference-counted playable audio sources.
//!
//! A [`SourceHandle`] describes one fully loaded, ready-to-render audio
//! source. Its identity fields (identifier, decoded data, sample rate)
//! are immutable after construction; transport state (playing flag, frame
//! cursor) lives in atomics so the audio thread can drive playback
//! without locks. Handles are shared as `Arc<SourceHandle>` across the
//! loader, audio, and housekeeping threads.
//!
//! Destroying a handle is expensive (it frees the decoded sample buffer),
//! so the last reference must never be dropped on the real-time thread.
//! The reclamation pool guarantees that in practice; a debug assertion in
//! `Drop` catches violations in tests and debug builds.

use crate::audio_data::AudioData;
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

thread_local! {
    static REALTIME_CONTEXT: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as real-time for the guard's lifetime.
///
/// The renderer holds one of these across every callback so that a
/// destructor running there trips the assertion in [`SourceHandle`]'s
/// `Drop` in debug builds.
pub(crate) struct RealtimeContextGuard {
    prev: bool,
}

impl RealtimeContextGuard {
    pub(crate) fn enter() -> Self {
        let prev = REALTIME_CONTEXT.with(|flag| flag.replace(true));
        Self { prev }
    }
}

impl Drop for RealtimeContextGuard {
    fn drop(&mut self) {
        REALTIME_CONTEXT.with(|flag| flag.set(self.prev));
    }
}

pub(crate) fn in_realtime_context() -> bool {
    REALTIME_CONTEXT.with(|flag| flag.get())
}

/// One loaded, playable audio source.
///
/// Created only by the background loader. Any thread holding a reference
/// may read the identity fields; the transport methods are meant for the
/// audio thread (single writer of the cursor) and the non-blocking query
/// accessors for UI threads.
#[derive(Debug)]
pub struct SourceHandle {
    identifier: String,
    data: Arc<AudioData>,
    playing: AtomicBool,
    /// Frame cursor into `data`. Written only by the audio thread.
    position: AtomicUsize,
}

impl SourceHandle {
    pub(crate) fn new(identifier: impl Into<String>, data: Arc<AudioData>) -> Self {
        Self {
            identifier: identifier.into(),
            data,
            playing: AtomicBool::new(false),
            position: AtomicUsize::new(0),
        }
    }

    /// The URL or path this source was loaded from.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn sample_rate(&self) -> u32 {
        self.data.sample_rate()
    }

    pub fn total_frames(&self) -> usize {
        self.data.total_frames()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Current transport position in frames.
    pub fn position_frames(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Starts the transport from the current position.
    pub(crate) fn start(&self) {
        log::debug!("starting transport for {:?}", self.identifier);
        self.playing.store(true, Ordering::Release);
    }

    /// Stops the transport, retaining the current position.
    pub(crate) fn stop(&self) {
        log::debug!("stopping transport for {:?}", self.identifier);
        self.playing.store(false, Ordering::Release);
    }

    /// Mixes the next block into `buffer` and advances the cursor.
    ///
    /// `buffer` holds `buffer.len() / out_channels` interleaved output
    /// frames; source samples are added onto whatever is already there
    /// (the caller clears for silence). Mono sources fan out to every
    /// output channel; sources with fewer channels than the output repeat
    /// their last channel. Returns the number of frames mixed. The
    /// transport stops by itself at end of data.
    ///
    /// Must only be called from the rendering thread; it is the single
    /// writer of the frame cursor.
    pub(crate) fn mix_into(&self, buffer: &mut [f32], out_channels: u16) -> usize {
        if !self.playing.load(Ordering::Acquire) {
            return 0;
        }

        let out_channels = out_channels as usize;
        let src_channels = self.data.channels() as usize;
        let frame_count = buffer.len() / out_channels;
        let samples = self.data.samples();
        let total_frames = self.data.total_frames();
        let mut position = self.position.load(Ordering::Relaxed);
        let mut frames_mixed = 0;

        for frame_idx in 0..frame_count {
            if position >= total_frames {
                break;
            }
            let frame = &samples[position * src_channels..(position + 1) * src_channels];
            for channel in 0..out_channels {
                let sample = frame[channel.min(src_channels - 1)];
                buffer[frame_idx * out_channels + channel] += sample;
            }
            position += 1;
            frames_mixed += 1;
        }

        self.position.store(position, Ordering::Release);

        if position >= total_frames {
            self.playing.store(false, Ordering::Release);
        }

        frames_mixed
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        // Freeing the sample buffer here would stall the audio callback.
        debug_assert!(
            !in_realtime_context(),
            "SourceHandle destroyed on the real-time thread"
        );
    }
}
