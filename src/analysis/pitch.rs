//! Zero-crossing pitch estimation.
//!
//! Counts sign changes across a chunk of audio. A pure tone crosses zero
//! twice per cycle, so `crossings / 2 / seconds` approximates its
//! frequency. Cheap, and only meaningful for simple, mostly monophonic
//! material.

use crate::theory::{A4_HZ, frequency_to_midi};

/// Frequency estimate in Hz from the zero-crossing rate.
///
/// Exact zeros do not count as crossings: only strictly opposite signs
/// (`a * b < 0`) do.
pub fn zero_crossing_frequency(samples: &[f32], sample_rate: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let crossings = samples.windows(2).filter(|w| w[0] * w[1] < 0.0).count();
    crossings as f64 * sample_rate / (2.0 * samples.len() as f64)
}

/// Nearest MIDI note for the zero-crossing frequency, if there is one in
/// 0..=127.
pub fn zero_crossing_pitch(samples: &[f32], sample_rate: f64) -> Option<u8> {
    let frequency = zero_crossing_frequency(samples, sample_rate);
    if frequency > 0.0 {
        frequency_to_midi(frequency, A4_HZ)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: f32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate * seconds) as usize;
        // Phase offset keeps samples away from exact zeros.
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate + 0.3).sin())
            .collect()
    }

    #[test]
    fn a4_sine() {
        let samples = sine(440.0, 44100.0, 0.5);
        let f = zero_crossing_frequency(&samples, 44100.0);
        assert!((f - 440.0).abs() < 3.0, "got {f}");
        assert_eq!(zero_crossing_pitch(&samples, 44100.0), Some(69));
    }

    #[test]
    fn c4_sine() {
        let samples = sine(261.63, 44100.0, 0.5);
        assert_eq!(zero_crossing_pitch(&samples, 44100.0), Some(60));
    }

    #[test]
    fn silence_and_dc_have_no_pitch() {
        assert_eq!(zero_crossing_pitch(&[0.0; 1024], 44100.0), None);
        assert_eq!(zero_crossing_pitch(&[0.5; 1024], 44100.0), None);
        assert_eq!(zero_crossing_pitch(&[], 44100.0), None);
    }

    #[test]
    fn zeros_do_not_count() {
        // +, 0, - is not a crossing under the strict product rule.
        assert_eq!(zero_crossing_frequency(&[1.0, 0.0, -1.0, 0.0], 8.0), 0.0);
        // Alternating signs over four samples: 3 crossings.
        let f = zero_crossing_frequency(&[1.0, -1.0, 1.0, -1.0], 8.0);
        assert_eq!(f, 3.0 * 8.0 / 8.0);
    }

    #[test]
    fn out_of_range_is_rejected() {
        // Alternating signs at 96 kHz: ~48 kHz, far above MIDI 127 (~12.5 kHz).
        let samples: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(zero_crossing_pitch(&samples, 96000.0), None);
    }
}
