//! Chorus effect: stereo modulated delay for thickening sound.
//!
//! An LFO sweeps the read position of a short delay line around
//! `delay_time`. The two channels run the LFO a quarter cycle apart.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Chorus parameters in the host's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChorusConfig {
    /// LFO rate in Hz.
    pub frequency: f64,
    /// Centre delay in milliseconds.
    pub delay_time: f64,
    /// Sweep depth in [0, 1], as a fraction of `delay_time`.
    pub depth: f64,
    /// Dry/wet mix in [0, 1].
    pub wet: f64,
}

impl Default for ChorusConfig {
    fn default() -> Self {
        ChorusConfig {
            frequency: 4.0,
            delay_time: 2.5,
            depth: 0.5,
            wet: 0.5,
        }
    }
}

/// Longest delay the line can hold, in seconds.
const MAX_DELAY: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct Chorus {
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    phase_l: f64,
    phase_r: f64,
    rate: f64,
    /// Centre delay in seconds.
    delay: f64,
    /// Sweep amplitude in seconds.
    sweep: f64,
    mix: f32,
}

impl Chorus {
    pub fn new(config: ChorusConfig, sample_rate: f64) -> Self {
        // At least one sample of delay even at very low rates.
        let buffer_size = ((sample_rate * MAX_DELAY) as usize + 2).max(3);
        let delay = (config.delay_time / 1000.0).clamp(0.0, MAX_DELAY / 2.0);
        Chorus {
            buffer_l: vec![0.0; buffer_size],
            buffer_r: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            phase_l: 0.0,
            phase_r: 0.25,
            rate: config.frequency.clamp(0.0, 20.0),
            delay,
            sweep: delay * config.depth.clamp(0.0, 1.0),
            mix: config.wet.clamp(0.0, 1.0) as f32,
        }
    }

    /// Read `delay_samples` behind the write head with linear interpolation.
    #[inline]
    fn read_interpolated(buffer: &[f32], write_pos: usize, delay_samples: f64) -> f32 {
        let len = buffer.len();
        let whole = delay_samples as usize;
        let frac = (delay_samples - whole as f64) as f32;

        let i0 = (write_pos + len - whole) % len;
        let i1 = (i0 + len - 1) % len;

        buffer[i0] + frac * (buffer[i1] - buffer[i0])
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let len = self.buffer_l.len();
        self.buffer_l[self.write_pos] = left;
        self.buffer_r[self.write_pos] = right;

        let max_delay = (len - 2) as f64;
        let delay_at = |phase: f64| {
            let seconds = self.delay + self.sweep * (2.0 * PI * phase).sin();
            (seconds * self.sample_rate).clamp(1.0, max_delay)
        };
        let wet_l = Self::read_interpolated(&self.buffer_l, self.write_pos, delay_at(self.phase_l));
        let wet_r = Self::read_interpolated(&self.buffer_r, self.write_pos, delay_at(self.phase_r));

        self.write_pos = (self.write_pos + 1) % len;
        let inc = self.rate / self.sample_rate;
        self.phase_l = (self.phase_l + inc) % 1.0;
        self.phase_r = (self.phase_r + inc) % 1.0;

        (
            left * (1.0 - self.mix) + wet_l * self.mix,
            right * (1.0 - self.mix) + wet_r * self.mix,
        )
    }

    /// Process a block of stereo audio in-place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_dry() {
        let mut chorus = Chorus::new(ChorusConfig { wet: 0.0, ..Default::default() }, 44100.0);
        let (l, r) = chorus.process(0.5, -0.5);
        assert!((l - 0.5).abs() < 1e-6);
        assert!((r + 0.5).abs() < 1e-6);
    }

    #[test]
    fn wet_signal_is_delayed() {
        let mut chorus = Chorus::new(ChorusConfig { wet: 1.0, depth: 0.0, ..Default::default() }, 44100.0);
        // 2.5 ms at 44.1 kHz is ~110 samples: the impulse is not heard at once.
        let (first, _) = chorus.process(1.0, 1.0);
        assert_eq!(first, 0.0);
        let heard = (0..200).any(|_| chorus.process(0.0, 0.0).0.abs() > 0.5);
        assert!(heard, "impulse should come back through the delay line");
    }

    #[test]
    fn stereo_spread() {
        let mut chorus = Chorus::new(ChorusConfig { wet: 1.0, ..Default::default() }, 44100.0);
        let mut input = 0.0f32;
        let found = (0..4410).any(|i| {
            input = ((i as f32) * 0.05).sin();
            let (l, r) = chorus.process(input, input);
            (l - r).abs() > 0.001
        });
        assert!(found, "Chorus should produce stereo difference due to phase offset");
    }

    #[test]
    fn tiny_sample_rate_still_runs() {
        // 10 Hz holds less than one sample of MAX_DELAY.
        let mut chorus = Chorus::new(ChorusConfig::default(), 10.0);
        let mut l = vec![0.5f32; 64];
        let mut r = vec![-0.5f32; 64];
        chorus.process_block(&mut l, &mut r);
        assert!(l.iter().chain(r.iter()).all(|s| s.is_finite() && s.abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn output_stays_bounded() {
        let mut chorus = Chorus::new(ChorusConfig::default(), 48000.0);
        let mut l = vec![0.9f32; 4800];
        let mut r = vec![-0.9f32; 4800];
        chorus.process_block(&mut l, &mut r);
        assert!(l.iter().chain(r.iter()).all(|s| s.abs() <= 0.9 + 1e-6));
    }
}
