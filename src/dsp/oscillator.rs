//! Anti-aliased oscillators using PolyBLEP, plus an additive partials bank.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Harmonic amplitudes of the warm, piano-like default tone.
pub const SINE8_PARTIALS: [f64; 8] = [1.0, 0.8, 0.6, 0.4, 0.2, 0.1, 0.05, 0.025];

/// Supported waveform shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// Sum of harmonics; entry `k` is the amplitude of harmonic `k + 1`.
    Partials(Vec<f64>),
}

impl Waveform {
    pub fn sine8() -> Self {
        Waveform::Partials(SINE8_PARTIALS.to_vec())
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::sine8()
    }
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    pub detune: f64, // in cents
    phase: f64,
    sample_rate: f64,
    /// 1 / sum(|partials|), so the additive shape peaks near unity.
    partial_norm: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        let partial_norm = match &waveform {
            Waveform::Partials(p) => {
                let sum: f64 = p.iter().map(|a| a.abs()).sum();
                if sum > 0.0 { 1.0 / sum } else { 0.0 }
            }
            _ => 1.0,
        };
        Oscillator {
            waveform,
            frequency: 440.0,
            detune: 0.0,
            phase: 0.0,
            sample_rate,
            partial_norm,
        }
    }

    /// Effective frequency accounting for detune (in cents).
    fn effective_freq(&self) -> f64 {
        self.frequency * (2.0_f64).powf(self.detune / 1200.0)
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.effective_freq() / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let sample = match &self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => self.sawtooth(inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
            Waveform::Partials(partials) => self.additive(partials, inc),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Naive sawtooth with PolyBLEP at the wrap.
    fn sawtooth(&self, inc: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, inc)
    }

    fn square(&self, inc: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);
        value
    }

    /// Piecewise linear: -1 to +1 over the first half, back down over the second.
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }

    /// Harmonics above Nyquist are skipped rather than aliased.
    fn additive(&self, partials: &[f64], inc: f64) -> f64 {
        let mut sum = 0.0;
        for (k, amp) in partials.iter().enumerate() {
            let harmonic = (k + 1) as f64;
            if harmonic * inc >= 0.5 {
                break;
            }
            sum += amp * (2.0 * PI * harmonic * self.phase).sin();
        }
        sum * self.partial_norm
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bounded(waveform: Waveform, bound: f64) {
        let mut osc = Oscillator::new(waveform.clone(), 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s.abs() <= bound, "{waveform:?} out of range: {s}");
        }
    }

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn ranges() {
        assert_bounded(Waveform::Sine, 1.0);
        assert_bounded(Waveform::Triangle, 1.0);
        assert_bounded(Waveform::Sawtooth, 1.5);
        assert_bounded(Waveform::Square, 1.5);
        assert_bounded(Waveform::sine8(), 1.0);
    }

    #[test]
    fn partials_are_normalized() {
        let mut osc = Oscillator::new(Waveform::Partials(vec![2.0, 2.0]), 44100.0);
        osc.frequency = 100.0;
        let peak = (0..44100).map(|_| osc.next_sample().abs()).fold(0.0, f64::max);
        assert!(peak <= 1.0 && peak > 0.5, "peak {peak}");
    }

    #[test]
    fn partials_above_nyquist_dropped() {
        // At 15 kHz only the fundamental fits under 22.05 kHz.
        let mut rich = Oscillator::new(Waveform::sine8(), 44100.0);
        rich.frequency = 15000.0;
        let mut pure = Oscillator::new(Waveform::Sine, 44100.0);
        pure.frequency = 15000.0;
        for _ in 0..64 {
            let a = rich.next_sample();
            let b = pure.next_sample() * rich.partial_norm;
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_partials_are_silent() {
        let mut osc = Oscillator::new(Waveform::Partials(vec![]), 44100.0);
        assert!((0..100).all(|_| osc.next_sample() == 0.0));
    }

    #[test]
    fn detune_shifts_frequency() {
        let osc1 = Oscillator::new(Waveform::Sine, 44100.0);
        let mut osc2 = Oscillator::new(Waveform::Sine, 44100.0);
        osc2.detune = 1200.0;
        assert!(
            (osc2.phase_inc() - 2.0 * osc1.phase_inc()).abs() < 1e-10,
            "1200 cents detune should double frequency"
        );
    }
}
