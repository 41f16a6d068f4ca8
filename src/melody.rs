//! Procedural melody generation with chord-tone harmony.
//!
//! A melody is a random walk over a scale's notes. Under every melody note
//! the chord for that part of the phrase is sounded, minus whichever chord
//! tone would double the melody pitch.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RemixError;
use crate::theory::ScaleKind;

/// Upper bound on melody notes per phrase.
pub const MAX_NOTES: usize = 256;

/// Longest allowed note, in seconds.
pub const MAX_NOTE_SECONDS: f64 = 2.0;

/// Fastest tempo a host transport is expected to run.
pub const MAX_TEMPO: u32 = 400;

// ── Note types ──────────────────────────────────────────────

/// Whether a note carries the tune or accompanies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteRole {
    Melody,
    Harmony,
}

/// A single generated note. Times are in seconds from the phrase start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelodyNote {
    /// MIDI note number.
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    /// Loudness on a 0..=127 scale; the synth divides by 100.
    pub velocity: f64,
    pub role: NoteRole,
    /// Set while the playhead is inside the note (for visualization).
    #[serde(default)]
    pub active: bool,
}

impl MelodyNote {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }
}

/// A generated phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Melody {
    pub scale: ScaleKind,
    /// Tempo in BPM, handed to the host transport.
    pub tempo: u32,
    /// Melody notes interleaved with their harmony, in onset order.
    pub notes: Vec<MelodyNote>,
}

impl Melody {
    /// Length of the phrase: the end of the last melody note.
    pub fn total_duration(&self) -> f64 {
        self.notes.iter().map(MelodyNote::end_time).fold(0.0, f64::max)
    }

    pub fn melody_notes(&self) -> impl Iterator<Item = &MelodyNote> {
        self.notes.iter().filter(|n| n.role == NoteRole::Melody)
    }

    pub fn harmony_notes(&self) -> impl Iterator<Item = &MelodyNote> {
        self.notes.iter().filter(|n| n.role == NoteRole::Harmony)
    }

    /// Mark the notes sounding at `time` as active and clear the rest.
    ///
    /// Returns the indices of notes whose flag changed, so the host only
    /// redraws what moved.
    pub fn update_active(&mut self, time: f64) -> Vec<usize> {
        let mut changed = Vec::new();
        for (i, note) in self.notes.iter_mut().enumerate() {
            let now = note.contains(time);
            if now != note.active {
                note.active = now;
                changed.push(i);
            }
        }
        changed
    }
}

// ── Generator ───────────────────────────────────────────────

/// Ranges the generator draws from. Integer ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MelodyParams {
    pub min_notes: usize,
    pub max_notes: usize,
    pub min_tempo: u32,
    pub max_tempo: u32,
    /// Candidate note lengths in seconds.
    pub durations: Vec<f64>,
    pub min_velocity: u32,
    pub max_velocity: u32,
    /// Harmony velocity relative to the melody note above it.
    pub harmony_velocity_scale: f64,
    /// Force a scale instead of choosing one at random.
    pub scale: Option<ScaleKind>,
}

impl Default for MelodyParams {
    fn default() -> Self {
        MelodyParams {
            min_notes: 8,
            max_notes: 15,
            min_tempo: 80,
            max_tempo: 139,
            durations: vec![0.25, 0.5, 1.0],
            min_velocity: 70,
            max_velocity: 99,
            harmony_velocity_scale: 0.7,
            scale: None,
        }
    }
}

impl MelodyParams {
    /// Reject ranges that are inverted, empty, or outside what a phrase can
    /// hold.
    pub fn validate(&self) -> Result<(), RemixError> {
        let bad = |msg: String| Err(RemixError::InvalidConfig(msg));
        if self.min_notes == 0 || self.min_notes > self.max_notes || self.max_notes > MAX_NOTES {
            return bad(format!(
                "note count {}..={} must lie in 1..={MAX_NOTES}",
                self.min_notes, self.max_notes
            ));
        }
        if self.min_tempo == 0 || self.min_tempo > self.max_tempo || self.max_tempo > MAX_TEMPO {
            return bad(format!(
                "tempo {}..={} must lie in 1..={MAX_TEMPO}",
                self.min_tempo, self.max_tempo
            ));
        }
        if self.min_velocity > self.max_velocity || self.max_velocity > 127 {
            return bad(format!(
                "velocity {}..={} must lie in 0..=127",
                self.min_velocity, self.max_velocity
            ));
        }
        if self.durations.is_empty()
            || self.durations.iter().any(|d| !(*d > 0.0 && *d <= MAX_NOTE_SECONDS))
        {
            return bad(format!("durations must lie in (0, {MAX_NOTE_SECONDS}] seconds"));
        }
        if !(0.0..=1.0).contains(&self.harmony_velocity_scale) {
            return bad(format!(
                "harmony velocity scale {} must lie in [0, 1]",
                self.harmony_velocity_scale
            ));
        }
        Ok(())
    }

    /// Clamp inverted or empty ranges into something the generator can use.
    fn sanitized(&self) -> MelodyParams {
        let mut p = self.clone();
        p.min_notes = p.min_notes.clamp(1, MAX_NOTES);
        p.max_notes = p.max_notes.clamp(p.min_notes, MAX_NOTES);
        p.min_tempo = p.min_tempo.clamp(1, MAX_TEMPO);
        p.max_tempo = p.max_tempo.clamp(p.min_tempo, MAX_TEMPO);
        p.max_velocity = p.max_velocity.max(p.min_velocity).min(127);
        p.min_velocity = p.min_velocity.min(p.max_velocity);
        p.durations.retain(|d| *d > 0.0 && *d <= MAX_NOTE_SECONDS);
        if p.durations.is_empty() {
            p.durations = MelodyParams::default().durations;
        }
        p
    }
}

pub struct MelodyGenerator {
    params: MelodyParams,
}

impl MelodyGenerator {
    pub fn new(params: MelodyParams) -> Self {
        MelodyGenerator { params: params.sanitized() }
    }

    pub fn params(&self) -> &MelodyParams {
        &self.params
    }

    /// Generate a phrase, reporting percent complete through `progress`.
    ///
    /// Progress is reported once per melody note as `floor(i / count * 100)`
    /// and a final 100 once the phrase is complete.
    pub fn generate<R, F>(&self, rng: &mut R, mut progress: F) -> Melody
    where
        R: Rng + ?Sized,
        F: FnMut(u8),
    {
        let p = &self.params;
        let kind = p.scale.unwrap_or_else(|| ScaleKind::choose(rng));
        let scale = kind.scale();

        let count = rng.random_range(p.min_notes..=p.max_notes);
        let tempo = rng.random_range(p.min_tempo..=p.max_tempo);
        log::debug!("generating {count} notes in {} at {tempo} BPM", scale.name);

        let mut notes = Vec::with_capacity(count * 3);
        let mut cursor = 0.0;

        for i in 0..count {
            let pitch = scale.notes[rng.random_range(0..scale.notes.len())];
            let chord = scale.chord_at(i, count);
            let duration = p.durations[rng.random_range(0..p.durations.len())];
            let velocity = rng.random_range(p.min_velocity..=p.max_velocity) as f64;

            notes.push(MelodyNote {
                pitch,
                start_time: cursor,
                duration,
                velocity,
                role: NoteRole::Melody,
                active: false,
            });

            for &tone in chord.iter().filter(|&&t| t != pitch) {
                notes.push(MelodyNote {
                    pitch: tone,
                    start_time: cursor,
                    duration,
                    velocity: velocity * p.harmony_velocity_scale,
                    role: NoteRole::Harmony,
                    active: false,
                });
            }

            cursor += duration;
            progress(((i * 100) / count) as u8);
        }

        progress(100);
        Melody { scale: kind, tempo, notes }
    }
}
