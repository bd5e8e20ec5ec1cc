//! PCM decoding for the TTS stream
//!
//! Streams arrive as base64 chunks of 16-bit little-endian PCM, the first
//! chunk usually prefixed with a 44-byte RIFF WAV header. Header detection
//! is by the RIFF magic, never by offset assumption, and the header is
//! stripped at most once per stream.

use crate::error::VoiceError;
use base64::Engine;
use blitsum_config::constants::voice::WAV_HEADER_LEN;

const PCM16_NORMALIZE: f32 = 32768.0;

/// Per-stream decoder state: the WAV-header latch
#[derive(Debug, Default)]
pub struct StreamDecoder {
    header_stripped: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the header latch for a fresh stream
    pub fn reset(&mut self) {
        self.header_stripped = false;
    }

    /// Decode one base64 chunk to f32 samples in [-1.0, 1.0]
    pub fn decode_chunk(&mut self, chunk_b64: &str) -> Result<Vec<f32>, VoiceError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(chunk_b64)
            .map_err(|e| VoiceError::Decode(e.to_string()))?;

        let payload = if !self.header_stripped && has_riff_magic(&bytes) {
            self.header_stripped = true;
            if bytes.len() > WAV_HEADER_LEN {
                &bytes[WAV_HEADER_LEN..]
            } else {
                &[]
            }
        } else {
            // either headerless stream or a later chunk
            self.header_stripped = true;
            &bytes[..]
        };

        Ok(pcm16le_to_f32(payload))
    }
}

/// RIFF....WAVE at the chunk head
fn has_riff_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Convert 16-bit little-endian PCM to normalized f32. A trailing odd byte
/// is dropped.
pub fn pcm16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            sample as f32 / PCM16_NORMALIZE
        })
        .collect()
}

/// Duration of a mono sample buffer at the given rate
pub fn buffer_duration(samples: usize, sample_rate: u32) -> std::time::Duration {
    std::time::Duration::from_secs_f64(samples as f64 / sample_rate.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    /// A minimal valid WAV file via hound, so the header is the real thing
    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_first_chunk_strips_exactly_44_bytes() {
        let wav = wav_bytes(&[1000, -1000, 2000, -2000]);
        assert_eq!(wav.len(), 44 + 8);

        let mut decoder = StreamDecoder::new();
        let samples = decoder.decode_chunk(&STANDARD.encode(&wav)).unwrap();
        assert_eq!(samples.len(), 4);
        assert!(samples[0] > 0.0 && samples[1] < 0.0);
    }

    #[test]
    fn test_subsequent_chunks_strip_nothing() {
        let wav = wav_bytes(&[1000, -1000]);
        let mut decoder = StreamDecoder::new();
        decoder.decode_chunk(&STANDARD.encode(&wav)).unwrap();

        // a raw PCM continuation chunk
        let raw: Vec<u8> = vec![0x00, 0x10, 0x00, 0xF0];
        let samples = decoder.decode_chunk(&STANDARD.encode(&raw)).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_headerless_stream_detected_by_magic_only() {
        // raw PCM first chunk: no RIFF magic, nothing stripped
        let raw: Vec<u8> = vec![0x00, 0x10, 0x00, 0xF0, 0x00, 0x10];
        let mut decoder = StreamDecoder::new();
        let samples = decoder.decode_chunk(&STANDARD.encode(&raw)).unwrap();
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn test_reset_rearms_header_latch() {
        let wav = wav_bytes(&[1000, -1000]);
        let mut decoder = StreamDecoder::new();
        decoder.decode_chunk(&STANDARD.encode(&wav)).unwrap();
        decoder.reset();
        let samples = decoder.decode_chunk(&STANDARD.encode(&wav)).unwrap();
        // header stripped again after reset
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let mut decoder = StreamDecoder::new();
        assert!(matches!(
            decoder.decode_chunk("not base64!!!"),
            Err(VoiceError::Decode(_))
        ));
    }

    #[test]
    fn test_buffer_duration() {
        let d = buffer_duration(44_100, 44_100);
        assert_eq!(d, std::time::Duration::from_secs(1));
    }
}
