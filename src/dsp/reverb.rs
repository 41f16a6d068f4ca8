//! Reverb effect: Schroeder/Freeverb-style algorithmic reverb.
//!
//! Eight parallel damped comb filters feed four series allpass filters per
//! channel. The comb feedback is derived from a decay time in seconds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Time for the tail to fall by 60 dB, in seconds.
    pub decay: f64,
    /// High-frequency damping in [0, 1]; higher is darker.
    pub damping: f64,
    /// Dry/wet mix in [0, 1].
    pub wet: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        ReverbConfig {
            decay: 1.5,
            damping: 0.3,
            wet: 0.35,
        }
    }
}

#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl CombFilter {
    fn new(size: usize, feedback: f32, damp: f32) -> Self {
        CombFilter {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback,
            damp,
            store: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        // One-pole lowpass in the feedback path.
        self.store = output * (1.0 - self.damp) + self.store * self.damp;
        self.buffer[self.index] = input + self.store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    const FEEDBACK: f32 = 0.5;

    fn new(size: usize) -> Self {
        AllpassFilter { buffer: vec![0.0; size.max(1)], index: 0 }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.index];
        self.buffer[self.index] = input + delayed * Self::FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        delayed - input
    }
}

// Freeverb tunings at 44.1 kHz, rescaled for other rates.
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const INPUT_GAIN: f32 = 0.015;

/// Comb feedback that gives an RT60 of `decay` seconds for the average
/// comb length: g = 10^(-3 * d / decay).
fn feedback_for_decay(decay: f64) -> f32 {
    let mean_len = COMB_TUNING.iter().sum::<usize>() as f64 / COMB_TUNING.len() as f64;
    let mean_secs = mean_len / 44100.0;
    let g = 10f64.powf(-3.0 * mean_secs / decay.max(0.05));
    g.clamp(0.0, 0.98) as f32
}

#[derive(Debug, Clone)]
pub struct Reverb {
    comb_l: Vec<CombFilter>,
    comb_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,
    mix: f32,
}

impl Reverb {
    pub fn new(config: ReverbConfig, sample_rate: f64) -> Self {
        let scale = sample_rate / 44100.0;
        let size = |t: usize, spread: usize| ((t + spread) as f64 * scale) as usize;
        let feedback = feedback_for_decay(config.decay);
        let damp = config.damping.clamp(0.0, 1.0) as f32;

        let combs = |spread| {
            COMB_TUNING
                .iter()
                .map(|&t| CombFilter::new(size(t, spread), feedback, damp))
                .collect::<Vec<_>>()
        };
        let allpasses = |spread| {
            ALLPASS_TUNING
                .iter()
                .map(|&t| AllpassFilter::new(size(t, spread)))
                .collect::<Vec<_>>()
        };

        Reverb {
            comb_l: combs(0),
            comb_r: combs(STEREO_SPREAD),
            allpass_l: allpasses(0),
            allpass_r: allpasses(STEREO_SPREAD),
            mix: config.wet.clamp(0.0, 1.0) as f32,
        }
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input = (left + right) * INPUT_GAIN;

        let mut wet_l: f32 = self.comb_l.iter_mut().map(|c| c.process(input)).sum();
        let mut wet_r: f32 = self.comb_r.iter_mut().map(|c| c.process(input)).sum();
        for ap in &mut self.allpass_l {
            wet_l = ap.process(wet_l);
        }
        for ap in &mut self.allpass_r {
            wet_r = ap.process(wet_r);
        }

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

    fn wet(decay: f64) -> Reverb {
        Reverb::new(ReverbConfig { decay, damping: 0.3, wet: 1.0 }, 44100.0)
    }

    fn tail_peak(reverb: &mut Reverb, samples: usize) -> f32 {
        (0..samples)
            .map(|_| {
                let (l, r) = reverb.process(0.0, 0.0);
                l.abs().max(r.abs())
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn passthrough_when_dry() {
        let mut reverb = Reverb::new(ReverbConfig { wet: 0.0, ..Default::default() }, 44100.0);
        let (l, r) = reverb.process(0.5, -0.5);
        assert!((l - 0.5).abs() < 1e-6);
        assert!((r + 0.5).abs() < 1e-6);
    }

    #[test]
    fn impulse_produces_tail() {
        let mut reverb = wet(1.5);
        reverb.process(1.0, 1.0);
        assert!(tail_peak(&mut reverb, 5000) > 0.001, "Reverb should ring after an impulse");
    }

    #[test]
    fn longer_decay_rings_longer() {
        let mut short = wet(0.3);
        let mut long = wet(3.0);
        short.process(1.0, 1.0);
        long.process(1.0, 1.0);
        // Skip the first second, then compare what is left.
        tail_peak(&mut short, 44100);
        tail_peak(&mut long, 44100);
        let s = tail_peak(&mut short, 4410);
        let l = tail_peak(&mut long, 4410);
        assert!(l > s, "3 s decay ({l}) should outlast 0.3 s decay ({s})");
    }

    #[test]
    fn feedback_mapping() {
        assert!(feedback_for_decay(1.5) > 0.8 && feedback_for_decay(1.5) < 0.9);
        assert!(feedback_for_decay(100.0) <= 0.98);
        assert!(feedback_for_decay(0.0) < 0.2);
    }

    #[test]
    fn resamples_tunings() {
        let reverb = Reverb::new(ReverbConfig::default(), 22050.0);
        assert_eq!(reverb.comb_l[0].buffer.len(), 558);
        assert_eq!(reverb.comb_r[0].buffer.len(), (1139.0 * 0.5) as usize);
    }
}
