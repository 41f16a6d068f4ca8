//! Audio Engine: renders a generated melody to audio samples.
//!
//! Each note is doubled into a few slightly detuned, slightly mistimed
//! voices for a chorused attack. Voices are summed per role into the
//! melody and harmony buses, and the mix runs through reverb then chorus.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RemixError;
use crate::melody::{Melody, NoteRole};
use crate::theory::{A4_HZ, midi_to_frequency};

use super::chorus::{Chorus, ChorusConfig};
use super::envelope::EnvelopeConfig;
use super::mixer::Mixer;
use super::oscillator::Waveform;
use super::reverb::{Reverb, ReverbConfig};
use super::voice::Voice;

const BLOCK_SIZE: usize = 128;

/// Longest render accepted, tails included, in seconds.
pub const MAX_RENDER_SECONDS: f64 = 600.0;

/// Synth voice, doubling, bus, and effect settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthConfig {
    pub waveform: Waveform,
    pub envelope: EnvelopeConfig,
    /// Copies of every note, each with its own detune and timing.
    pub chorus_voices: usize,
    /// Total detune spread in cents; each copy lands in ±half of it.
    pub chorus_detune: f64,
    /// Total timing spread in seconds; each copy lands in ±half of it.
    pub timing_spread: f64,
    pub melody_volume: f64,
    pub harmony_volume: f64,
    pub chorus: ChorusConfig,
    pub reverb: ReverbConfig,
    /// Voices beyond this many at once are dropped.
    pub max_polyphony: usize,
    /// Frequency of A4 in Hz.
    pub tuning_pitch: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            waveform: Waveform::sine8(),
            envelope: EnvelopeConfig::PIANO,
            chorus_voices: 3,
            chorus_detune: 10.0,
            timing_spread: 0.02,
            melody_volume: 0.8,
            harmony_volume: 0.5,
            chorus: ChorusConfig::default(),
            reverb: ReverbConfig::default(),
            max_polyphony: 128,
            tuning_pitch: A4_HZ,
        }
    }
}

/// One voice copy waiting to be started.
struct ScheduledVoice {
    start_sample: usize,
    release_sample: usize,
    frequency: f64,
    detune: f64,
    velocity: f64,
    role: NoteRole,
}

/// Rendered stereo audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoBuffer {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate.max(1) as f64
    }

    /// Interleaved 16-bit PCM (L, R, L, R, ...).
    pub fn to_pcm_i16(&self) -> Vec<i16> {
        let to_i16 = |s: f32| (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [to_i16(l), to_i16(r)])
            .collect()
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0_f32, |m, &s| m.max(s.abs()))
    }
}

/// The offline renderer.
pub struct AudioEngine {
    pub sample_rate: f64,
    pub config: SynthConfig,
}

impl AudioEngine {
    pub fn new(sample_rate: f64, config: SynthConfig) -> Self {
        AudioEngine { sample_rate, config }
    }

    /// Check the sample rate and note times before any sample counts are
    /// derived from them.
    fn check_melody(&self, melody: &Melody) -> Result<(), RemixError> {
        if !(self.sample_rate.is_finite() && self.sample_rate >= 1.0) {
            return Err(RemixError::InvalidSampleRate { rate: self.sample_rate });
        }
        let mut end = 0.0f64;
        for note in &melody.notes {
            let timed = note.start_time.is_finite()
                && note.start_time >= 0.0
                && note.duration.is_finite()
                && note.duration >= 0.0;
            if !timed || !note.velocity.is_finite() {
                return Err(RemixError::InvalidConfig(format!(
                    "note at {} s lasting {} s (velocity {}) is not renderable",
                    note.start_time, note.duration, note.velocity
                )));
            }
            end = end.max(note.end_time());
        }
        let cfg = &self.config;
        let tails = cfg.timing_spread.abs() + cfg.envelope.release.max(0.0) + cfg.reverb.decay.max(0.0);
        let total = end + tails;
        if !(total <= MAX_RENDER_SECONDS) {
            return Err(RemixError::InvalidConfig(format!(
                "render of {total} s exceeds {MAX_RENDER_SECONDS} s"
            )));
        }
        Ok(())
    }

    /// Expand every note into its chorus copies, sorted by start.
    fn schedule<R: Rng + ?Sized>(&self, melody: &Melody, rng: &mut R) -> Vec<ScheduledVoice> {
        let cfg = &self.config;
        let copies = cfg.chorus_voices.max(1);
        let mut scheduled = Vec::with_capacity(melody.notes.len() * copies);

        for note in &melody.notes {
            let frequency = midi_to_frequency(note.pitch as i32, cfg.tuning_pitch);
            for _ in 0..copies {
                let jitter = (rng.random::<f64>() - 0.5) * cfg.timing_spread;
                let detune = (rng.random::<f64>() - 0.5) * cfg.chorus_detune;
                let start = (note.start_time + jitter).max(0.0);
                let start_sample = (start * self.sample_rate) as usize;
                let gate = (note.duration.max(0.0) * self.sample_rate) as usize;
                scheduled.push(ScheduledVoice {
                    start_sample,
                    release_sample: start_sample.saturating_add(gate),
                    frequency,
                    detune,
                    velocity: note.velocity / 100.0,
                    role: note.role,
                });
            }
        }

        scheduled.sort_by_key(|v| v.start_sample);
        scheduled
    }

    /// Render the dry mono mix: voices through the gain buses, no effects.
    pub fn render_dry<R: Rng + ?Sized>(
        &self,
        melody: &Melody,
        rng: &mut R,
    ) -> Result<Vec<f64>, RemixError> {
        self.check_melody(melody)?;
        let cfg = &self.config;
        let scheduled = self.schedule(melody, rng);

        let release_samples = (cfg.envelope.release.max(0.0) * self.sample_rate) as usize;
        let tail_samples = (cfg.reverb.decay.max(0.0) * self.sample_rate) as usize;
        let total_samples = scheduled
            .iter()
            .map(|v| v.release_sample.saturating_add(release_samples).saturating_add(tail_samples))
            .max()
            .unwrap_or(0);

        let mut mixer = Mixer::new(cfg.melody_volume, cfg.harmony_volume);
        let mut active: Vec<(Voice, NoteRole)> = Vec::new();
        let mut output = Vec::with_capacity(total_samples);
        let mut next = 0;
        let mut dropped = 0usize;

        let mut block_start = 0;
        while block_start < total_samples {
            let block_end = (block_start + BLOCK_SIZE).min(total_samples);

            while next < scheduled.len() && scheduled[next].start_sample < block_end {
                let s = &scheduled[next];
                if active.len() < cfg.max_polyphony {
                    let mut voice = Voice::new(cfg.waveform.clone(), cfg.envelope, self.sample_rate);
                    voice.start_sample = s.start_sample;
                    voice.release_sample = s.release_sample;
                    voice.note_on(s.frequency, s.detune, s.velocity);
                    active.push((voice, s.role));
                } else {
                    dropped += 1;
                }
                next += 1;
            }

            mixer.clear(block_end - block_start);
            for (voice, role) in active.iter_mut() {
                for i in block_start.max(voice.start_sample)..block_end {
                    if i == voice.release_sample {
                        voice.note_off();
                    }
                    mixer.add(*role, i - block_start, voice.next_sample());
                }
            }
            output.extend(mixer.output());

            active.retain(|(v, _)| !v.is_finished());
            block_start = block_end;
        }

        if dropped > 0 {
            log::warn!("dropped {dropped} voices over the polyphony limit of {}", cfg.max_polyphony);
        }
        Ok(output)
    }

    /// Render the full chain: dry mix, then reverb, then chorus.
    pub fn render_melody<R: Rng + ?Sized>(
        &self,
        melody: &Melody,
        rng: &mut R,
    ) -> Result<StereoBuffer, RemixError> {
        let mono = self.render_dry(melody, rng)?;
        let mut left: Vec<f32> = mono.iter().map(|&s| s as f32).collect();
        let mut right = left.clone();

        Reverb::new(self.config.reverb, self.sample_rate).process_block(&mut left, &mut right);
        Chorus::new(self.config.chorus, self.sample_rate).process_block(&mut left, &mut right);

        log::debug!(
            "rendered {} notes to {:.2}s of audio",
            melody.notes.len(),
            left.len() as f64 / self.sample_rate
        );
        Ok(StereoBuffer {
            left,
            right,
            sample_rate: self.sample_rate as u32,
        })
    }
}
