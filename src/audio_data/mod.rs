mod loader;
mod symphonia_loader;

pub use loader::AudioSourceLoader;
pub use symphonia_loader::SymphoniaLoader;

use std::time::Duration;

/// Container for one fully decoded audio source.
///
/// Samples are stored in **interleaved** format (`[L0, R0, L1, R1, ...]`
/// for stereo), which is what audio files and output APIs such as CPAL
/// use natively. The buffer is immutable once constructed; playback
/// position lives on the handle that wraps this data, not here.
#[derive(Debug)]
pub struct AudioData {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    total_frames: usize,
}

impl AudioData {
    /// Wraps a decoded interleaved sample buffer.
    ///
    /// # Panics
    ///
    /// Panics if `channels` or `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        assert!(channels > 0, "audio data needs at least one channel");
        assert!(sample_rate > 0, "sample rate must be positive");
        let total_frames = samples.len() / channels as usize;
        Self {
            samples,
            sample_rate,
            channels,
            total_frames,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Total number of frames (one frame = one sample per channel).
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_frames as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.total_frames == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_from_interleaved_stereo() {
        let data = AudioData::new(vec![0.0; 10], 48000, 2);
        assert_eq!(data.total_frames(), 5);
        assert_eq!(data.channels(), 2);
        assert!(!data.is_empty());
    }

    #[test]
    fn test_duration_uses_sample_rate() {
        let data = AudioData::new(vec![0.0; 48000], 48000, 1);
        assert_eq!(data.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_empty_data() {
        let data = AudioData::new(Vec::new(), 44100, 2);
        assert_eq!(data.total_frames(), 0);
        assert!(data.is_empty());
    }
}
