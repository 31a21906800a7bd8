use crate::audio_data::AudioData;
use crate::error::Result;
use std::sync::Arc;

/// Trait for opening and decoding an audio source by identifier.
///
/// This is the boundary to the audio-I/O collaborator: given a URL or
/// filesystem path, produce fully decoded audio or fail. Implementations
/// may block on I/O — the background loader thread is the only place in
/// the system that calls `open`, and it is the only thread permitted to
/// block.
///
/// Swapdeck ships [`SymphoniaLoader`](crate::audio_data::SymphoniaLoader)
/// for local files; bring your own implementation for remote transports
/// or exotic formats.
pub trait AudioSourceLoader: Send + Sync {
    /// Opens and decodes the source named by `identifier`.
    ///
    /// # Errors
    ///
    /// Returns a [`SwapdeckError`](crate::error::SwapdeckError) if the
    /// source cannot be opened or decoded. The player treats any error as
    /// "no source produced" — it is logged and counted, never retried.
    fn open(&self, identifier: &str) -> Result<Arc<AudioData>>;
}
