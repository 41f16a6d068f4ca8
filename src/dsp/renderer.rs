//! WAV renderer: renders a melody to a WAV byte buffer.

use rand::Rng;

use crate::error::RemixError;
use crate::melody::Melody;

use super::engine::{AudioEngine, StereoBuffer, SynthConfig};

/// Render a melody to a 16-bit stereo PCM WAV file as bytes.
pub fn render_wav<R: Rng + ?Sized>(
    melody: &Melody,
    config: &SynthConfig,
    sample_rate: u32,
    rng: &mut R,
) -> Result<Vec<u8>, RemixError> {
    let engine = AudioEngine::new(sample_rate as f64, config.clone());
    let audio = engine.render_melody(melody, rng)?;
    Ok(encode_stereo(&audio))
}

pub fn encode_stereo(audio: &StereoBuffer) -> Vec<u8> {
    encode_wav(&audio.to_pcm_i16(), audio.sample_rate, 2)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
