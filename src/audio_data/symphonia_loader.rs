use crate::audio_data::{AudioData, AudioSourceLoader};
use crate::error::{Result, SwapdeckError};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Built-in [`AudioSourceLoader`] backed by the Symphonia decoder library.
///
/// Treats the identifier as a filesystem path and decodes the whole file
/// into interleaved f32 PCM. Supports whatever containers and codecs the
/// default Symphonia registry does (WAV, MP3, FLAC, OGG, ...).
pub struct SymphoniaLoader;

impl AudioSourceLoader for SymphoniaLoader {
    fn open(&self, identifier: &str) -> Result<Arc<AudioData>> {
        let file = File::open(identifier)?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(identifier).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                SwapdeckError::Decode(format!("failed to probe audio format: {:?}", e))
            })?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| SwapdeckError::Decode("no default audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| SwapdeckError::Decode("sample rate not found".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| SwapdeckError::Decode("channel count not found".to_string()))?
            .count() as u16;

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| SwapdeckError::Decode(format!("failed to create decoder: {:?}", e)))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end-of-file
                Err(e) => {
                    return Err(SwapdeckError::Decode(format!(
                        "error reading packet: {:?}",
                        e
                    )));
                }
            };

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break, // also EOF in some formats
                Err(Error::DecodeError(_)) => continue, // recoverable corruption
                Err(e) => {
                    return Err(SwapdeckError::Decode(format!(
                        "error decoding packet: {:?}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();

            let mut tmp = SampleBuffer::<f32>::new(capacity as u64, spec);
            tmp.copy_interleaved_ref(decoded);
            samples.extend_from_slice(tmp.samples());
        }

        Ok(Arc::new(AudioData::new(samples, sample_rate, channels)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_io_error() {
        let loader = SymphoniaLoader;
        let result = loader.open("/definitely/not/here.wav");
        assert!(matches!(result, Err(SwapdeckError::Io(_))));
    }
}
