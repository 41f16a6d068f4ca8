//! Scales, chord progressions, and pitch conversions.
//!
//! The melody generator only draws from these fixed tables: three scales
//! rooted on middle C, each with a four-chord progression.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Standard concert pitch for A4 (MIDI 69).
pub const A4_HZ: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// ── Scale tables ────────────────────────────────────────────

/// The scales available to the melody generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    CMajor,
    CMinor,
    Pentatonic,
}

/// Scale notes plus a four-step chord progression, all as MIDI numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub name: &'static str,
    /// Scale degrees from C4 up to C5.
    pub notes: &'static [u8],
    /// Triads played in order across the length of a melody.
    pub chords: [[u8; 3]; 4],
}

const C_MAJOR: Scale = Scale {
    name: "cMajor",
    notes: &[60, 62, 64, 65, 67, 69, 71, 72],
    chords: [
        [60, 64, 67], // I
        [67, 71, 74], // V
        [65, 69, 72], // IV
        [60, 64, 67], // I
    ],
};

const C_MINOR: Scale = Scale {
    name: "cMinor",
    notes: &[60, 62, 63, 65, 67, 68, 70, 72],
    chords: [
        [60, 63, 67], // i
        [67, 70, 74], // v
        [65, 68, 72], // iv
        [60, 63, 67], // i
    ],
};

const PENTATONIC: Scale = Scale {
    name: "pentatonic",
    notes: &[60, 62, 64, 67, 69, 72],
    chords: [
        [60, 64, 67],
        [62, 67, 71],
        [64, 67, 71],
        [60, 64, 67],
    ],
};

impl ScaleKind {
    pub const ALL: [ScaleKind; 3] = [ScaleKind::CMajor, ScaleKind::CMinor, ScaleKind::Pentatonic];

    pub fn scale(self) -> &'static Scale {
        match self {
            ScaleKind::CMajor => &C_MAJOR,
            ScaleKind::CMinor => &C_MINOR,
            ScaleKind::Pentatonic => &PENTATONIC,
        }
    }

    /// Pick one of the scales uniformly.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> ScaleKind {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl Scale {
    /// Chord for position `index` of a melody with `count` notes.
    ///
    /// The progression is spread evenly: the first quarter of the notes
    /// sit on chord 0, the next quarter on chord 1, and so on.
    pub fn chord_at(&self, index: usize, count: usize) -> &[u8; 3] {
        if count == 0 {
            return &self.chords[0];
        }
        let slot = (index * self.chords.len()) / count;
        &self.chords[slot.min(self.chords.len() - 1)]
    }

    pub fn contains(&self, midi: u8) -> bool {
        self.notes.contains(&midi)
    }
}

// ── Pitch conversion ────────────────────────────────────────

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

/// Round to nearest with halves going up, so -0.5 lands on 0 rather than -1.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Nearest MIDI note for a frequency, if it lands in 0..=127.
pub fn frequency_to_midi(freq: f64, tuning_pitch: f64) -> Option<u8> {
    if !(freq > 0.0) || !freq.is_finite() {
        return None;
    }
    let midi = round_half_up(69.0 + 12.0 * (freq / tuning_pitch).log2());
    if (0.0..=127.0).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let mut chars = note.chars();
    let base = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (semitone, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (base + 1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (base - 1, r)
    } else {
        (base, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;
    // C4 = 60
    Some((octave + 1) * 12 + semitone)
}

/// Name a MIDI note using sharps, e.g. 61 -> "C#4".
pub fn midi_to_note_name(midi: u8) -> String {
    let octave = midi as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[midi as usize % 12], octave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn tables_match_progressions() {
        let major = ScaleKind::CMajor.scale();
        assert_eq!(major.notes.len(), 8);
        assert_eq!(major.chords[1], [67, 71, 74]);

        let minor = ScaleKind::CMinor.scale();
        assert!(minor.contains(63), "C minor has Eb");
        assert!(!minor.contains(64), "C minor has no E natural");

        let penta = ScaleKind::Pentatonic.scale();
        assert_eq!(penta.notes, &[60, 62, 64, 67, 69, 72]);
    }

    #[test]
    fn chord_spread_over_melody() {
        let s = ScaleKind::CMajor.scale();
        // 8 notes: two per chord
        let slots: Vec<_> = (0..8).map(|i| s.chord_at(i, 8)).collect();
        assert_eq!(slots[0], &s.chords[0]);
        assert_eq!(slots[1], &s.chords[0]);
        assert_eq!(slots[2], &s.chords[1]);
        assert_eq!(slots[5], &s.chords[2]);
        assert_eq!(slots[7], &s.chords[3]);

        // 15 notes: floor(i / 15 * 4)
        assert_eq!(s.chord_at(3, 15), &s.chords[0]);
        assert_eq!(s.chord_at(4, 15), &s.chords[1]);
        assert_eq!(s.chord_at(14, 15), &s.chords[3]);
    }

    #[test]
    fn choose_covers_all_scales() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(ScaleKind::choose(&mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn midi_frequency_round_trip() {
        assert!((midi_to_frequency(69, A4_HZ) - 440.0).abs() < 1e-9);
        assert!((midi_to_frequency(60, A4_HZ) - 261.626).abs() < 0.01);
        assert_eq!(frequency_to_midi(261.63, A4_HZ), Some(60));
        assert_eq!(frequency_to_midi(0.0, A4_HZ), None);
        assert_eq!(frequency_to_midi(40_000.0, A4_HZ), None);
        // A quarter tone below C-1 is still note 0.
        let low = midi_to_frequency(0, A4_HZ) * 2f64.powf(-0.25 / 12.0);
        assert_eq!(frequency_to_midi(low, A4_HZ), Some(0));
        assert_eq!(frequency_to_midi(low * 0.9, A4_HZ), None);
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-0.51), -1.0);
        assert_eq!(round_half_up(60.5), 61.0);
        assert_eq!(round_half_up(60.49), 60.0);
    }

    #[test]
    fn note_names() {
        assert_eq!(note_to_midi("A4"), Some(69));
        assert_eq!(note_to_midi("C4"), Some(60));
        assert_eq!(note_to_midi("F#4"), note_to_midi("Gb4"));
        assert_eq!(note_to_midi("C-1"), Some(0));
        assert_eq!(note_to_midi("H2"), None);
        assert_eq!(midi_to_note_name(60), "C4");
        assert_eq!(midi_to_note_name(70), "A#4");
    }
}
