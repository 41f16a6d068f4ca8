//! Voice: one sounding copy of a note, an oscillator shaped by an envelope.

use super::envelope::{Envelope, EnvelopeConfig};
use super::oscillator::{Oscillator, Waveform};

#[derive(Debug, Clone)]
pub struct Voice {
    pub oscillator: Oscillator,
    pub envelope: Envelope,
    /// Velocity gain [0, 1].
    pub velocity: f64,
    /// Absolute sample index at which the voice starts sounding.
    pub start_sample: usize,
    /// Absolute sample index at which the gate closes.
    pub release_sample: usize,
    finished: bool,
}

impl Voice {
    pub fn new(waveform: Waveform, envelope: EnvelopeConfig, sample_rate: f64) -> Self {
        Voice {
            oscillator: Oscillator::new(waveform, sample_rate),
            envelope: Envelope::new(envelope, sample_rate),
            velocity: 1.0,
            start_sample: 0,
            release_sample: usize::MAX,
            finished: false,
        }
    }

    /// Start playing a note. `detune` is in cents.
    pub fn note_on(&mut self, frequency: f64, detune: f64, velocity: f64) {
        self.oscillator.frequency = frequency;
        self.oscillator.detune = detune;
        self.oscillator.reset();
        self.velocity = velocity.clamp(0.0, 1.0);
        self.finished = false;
        self.envelope.gate_on();
    }

    pub fn note_off(&mut self) {
        self.envelope.gate_off();
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.finished {
            return 0.0;
        }

        let osc = self.oscillator.next_sample();
        let env = self.envelope.next_sample();

        if self.envelope.is_finished() {
            self.finished = true;
        }

        osc * env * self.velocity
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> Voice {
        Voice::new(Waveform::sine8(), EnvelopeConfig::PIANO, 44100.0)
    }

    #[test]
    fn voice_produces_sound() {
        let mut v = voice();
        v.note_on(440.0, 0.0, 0.8);
        let has_nonzero = (0..4410).any(|_| v.next_sample().abs() > 0.001);
        assert!(has_nonzero, "Voice should produce non-zero output");
    }

    #[test]
    fn voice_silent_after_release() {
        let mut v = Voice::new(
            Waveform::Sine,
            EnvelopeConfig { attack: 0.001, decay: 0.001, sustain: 0.5, release: 0.01 },
            44100.0,
        );
        v.note_on(440.0, 0.0, 1.0);
        for _ in 0..500 {
            v.next_sample();
        }
        v.note_off();
        for _ in 0..2000 {
            v.next_sample();
        }
        assert!(v.is_finished(), "Voice should be finished after release");
        assert_eq!(v.next_sample(), 0.0);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut v = voice();
        v.note_on(880.0, 0.0, 1.7);
        assert_eq!(v.velocity, 1.0);
        for _ in 0..44100 {
            let s = v.next_sample();
            assert!(s.abs() <= 1.0, "Voice output should be within [-1, 1], got {s}");
        }
    }
}
