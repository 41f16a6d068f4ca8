//! Mixer: gain buses summed into one stereo-ready buffer.

use crate::melody::NoteRole;

/// One summing buffer per note role, each with its own gain.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub melody_gain: f64,
    pub harmony_gain: f64,
    pub master_gain: f64,
    melody: Vec<f64>,
    harmony: Vec<f64>,
}

impl Mixer {
    pub fn new(melody_gain: f64, harmony_gain: f64) -> Self {
        Mixer {
            melody_gain,
            harmony_gain,
            master_gain: 0.8,
            melody: Vec::new(),
            harmony: Vec::new(),
        }
    }

    /// Zero both buses and size them to `num_samples`.
    pub fn clear(&mut self, num_samples: usize) {
        for bus in [&mut self.melody, &mut self.harmony] {
            bus.clear();
            bus.resize(num_samples, 0.0);
        }
    }

    /// Add a sample to a bus. Out-of-range indices are dropped.
    pub fn add(&mut self, role: NoteRole, index: usize, sample: f64) {
        let bus = match role {
            NoteRole::Melody => &mut self.melody,
            NoteRole::Harmony => &mut self.harmony,
        };
        if let Some(slot) = bus.get_mut(index) {
            *slot += sample;
        }
    }

    /// Weighted sum of the buses with master gain and soft clipping.
    pub fn output(&self) -> Vec<f64> {
        self.melody
            .iter()
            .zip(&self.harmony)
            .map(|(&m, &h)| soft_clip((m * self.melody_gain + h * self.harmony_gain) * self.master_gain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.melody.len()
    }

    pub fn is_empty(&self) -> bool {
        self.melody.is_empty()
    }
}

/// tanh soft clipper.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let mut m = Mixer::new(1.0, 1.0);
        m.clear(128);
        let out = m.output();
        assert_eq!(out.len(), 128);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn buses_are_weighted() {
        let mut m = Mixer::new(1.0, 0.5);
        m.master_gain = 1.0;
        m.clear(3);
        m.add(NoteRole::Melody, 0, 0.4);
        m.add(NoteRole::Harmony, 0, 0.4);
        m.add(NoteRole::Harmony, 1, 1.0);
        m.add(NoteRole::Melody, 99, 1.0);
        let out = m.output();
        assert!((out[0] - soft_clip(0.6)).abs() < 1e-12);
        assert!((out[1] - soft_clip(0.5)).abs() < 1e-12);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn muted_bus_is_silent() {
        let mut m = Mixer::new(1.0, 0.0);
        m.clear(1);
        m.add(NoteRole::Harmony, 0, 1.0);
        assert_eq!(m.output()[0], 0.0);
    }

    #[test]
    fn soft_clip_prevents_overflow() {
        let mut m = Mixer::new(1.0, 1.0);
        m.clear(1);
        m.add(NoteRole::Melody, 0, 100.0);
        assert!(m.output()[0] <= 1.0);
    }
}
