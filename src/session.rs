//! The remixer's playback, analysis, and generation state.
//!
//! A `RemixSession` stands in for the audio context, the loaded clip's
//! transport, and the analyser tap. The host drives it: `advance` from its
//! audio clock, `analyze_frame` once per animation frame.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::analysis::metrics;
use crate::analysis::{Analyser, AnalysisHistory, FrameAnalysis};
use crate::audio::AudioClip;
use crate::config::RemixConfig;
use crate::dsp::engine::{AudioEngine, StereoBuffer};
use crate::error::RemixError;
use crate::melody::{Melody, MelodyGenerator};
use crate::render::{
    RgbaImage, SpectrogramImage, compute_spectrogram, render_spectrogram, render_waveform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

impl ContextState {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        }
    }
}

pub struct RemixSession {
    config: RemixConfig,
    /// Output rate used for synthesis.
    sample_rate: f64,
    context: ContextState,
    initialized: bool,

    clip: Option<AudioClip>,
    mono: Vec<f32>,
    /// Playhead in frames of `mono`.
    position: usize,
    is_playing: bool,
    current_time: f64,

    analyser: Analyser,
    spectrum: Vec<f32>,
    history: AnalysisHistory,
    dominant_frequency: f64,
    peak_amplitude: f32,

    melody: Option<Melody>,
    remix_progress: u8,
}

impl RemixSession {
    pub fn new(sample_rate: f64, config: RemixConfig) -> Result<Self, RemixError> {
        config.validate()?;
        let analyser = Analyser::new(config.analyser, sample_rate)?;
        let spectrum = vec![f32::NEG_INFINITY; analyser.frequency_bin_count()];
        Ok(RemixSession {
            config,
            sample_rate,
            context: ContextState::Suspended,
            initialized: false,
            clip: None,
            mono: Vec::new(),
            position: 0,
            is_playing: false,
            current_time: 0.0,
            analyser,
            spectrum,
            history: AnalysisHistory::new(),
            dominant_frequency: 0.0,
            peak_amplitude: 0.0,
            melody: None,
            remix_progress: 0,
        })
    }

    fn ensure_open(&self) -> Result<(), RemixError> {
        if self.context == ContextState::Closed {
            return Err(RemixError::ContextClosed);
        }
        Ok(())
    }

    /// Resume a suspended context. Does nothing once running.
    pub fn initialize_audio_context(&mut self) -> Result<(), RemixError> {
        self.ensure_open()?;
        if !self.initialized && self.context == ContextState::Suspended {
            self.context = ContextState::Running;
            self.initialized = true;
            log::info!("Audio context running at {} Hz", self.sample_rate);
        }
        Ok(())
    }

    // ── Transport ───────────────────────────────────────────

    pub fn load_clip(&mut self, clip: AudioClip) -> Result<(), RemixError> {
        self.initialize_audio_context()?;
        let rate = clip.sample_rate as f64;
        self.analyser = Analyser::new(self.config.analyser, rate)?;
        self.spectrum = vec![f32::NEG_INFINITY; self.analyser.frequency_bin_count()];
        self.mono = clip.mono();
        self.position = 0;
        self.is_playing = false;
        self.current_time = 0.0;
        self.history.clear();
        self.dominant_frequency = 0.0;
        self.peak_amplitude = 0.0;
        log::info!("Loaded clip '{}' ({:.2}s)", clip.name, clip.duration());
        self.clip = Some(clip);
        Ok(())
    }

    /// Play or pause. Returns the new playing state.
    ///
    /// Playing from the end of the clip starts over.
    pub fn toggle_playback(&mut self) -> Result<bool, RemixError> {
        self.initialize_audio_context()?;
        if self.clip.is_none() {
            return Err(RemixError::NoClipLoaded);
        }
        self.is_playing = !self.is_playing;
        if self.is_playing && self.position >= self.mono.len() {
            self.position = 0;
            self.current_time = 0.0;
        }
        Ok(self.is_playing)
    }

    /// Move the playhead `seconds` forward and return what was played.
    ///
    /// The block also feeds the analyser. Empty while paused.
    pub fn advance(&mut self, seconds: f64) -> Result<&[f32], RemixError> {
        self.ensure_open()?;
        let rate = match &self.clip {
            Some(clip) if self.is_playing => clip.sample_rate as f64,
            _ => return Ok(&[]),
        };
        let frames = if seconds.is_finite() && seconds > 0.0 {
            (seconds * rate).round() as usize
        } else {
            0
        };
        let start = self.position.min(self.mono.len());
        let end = start.saturating_add(frames).min(self.mono.len());

        self.analyser.push_samples(&self.mono[start..end]);
        self.position = end;
        self.current_time = end as f64 / rate;
        if end == self.mono.len() {
            self.is_playing = false;
            log::debug!("Playback reached the end at {:.2}s", self.current_time);
        }
        Ok(&self.mono[start..end])
    }

    /// Sample the analyser once, as an animation frame would.
    pub fn analyze_frame(&mut self) -> Result<FrameAnalysis, RemixError> {
        self.ensure_open()?;
        self.analyser.float_frequency_data(&mut self.spectrum);
        let frame =
            metrics::analyze_frame(&self.spectrum, self.analyser.sample_rate(), self.current_time);
        self.dominant_frequency = frame.frequency;
        self.peak_amplitude = frame.amplitude;
        self.history.push(frame);
        Ok(frame)
    }

    // ── Generation ──────────────────────────────────────────

    /// Generate a new phrase from `seed`, tracking progress as it goes.
    pub fn generate_melody(&mut self, seed: u64) -> Result<&Melody, RemixError> {
        self.remix_progress = 0;
        self.ensure_open()?;
        if self.clip.is_none() {
            return Err(RemixError::NoClipLoaded);
        }

        let generator = MelodyGenerator::new(self.config.melody.clone());
        let mut rng = StdRng::seed_from_u64(seed);
        let progress = &mut self.remix_progress;
        let melody = generator.generate(&mut rng, |p| *progress = p);

        self.current_time = melody.total_duration();
        self.remix_progress = 100;
        log::info!(
            "Generated {} notes in {} at {} BPM",
            melody.melody_notes().count(),
            melody.scale.scale().name,
            melody.tempo
        );
        Ok(self.melody.insert(melody))
    }

    /// Synthesize the current melody through the effect chain.
    pub fn render_remix(&self, seed: u64) -> Result<StereoBuffer, RemixError> {
        self.ensure_open()?;
        let melody = self.melody.as_ref().ok_or(RemixError::NoMelody)?;
        let engine = AudioEngine::new(self.sample_rate, self.config.synth.clone());
        let mut rng = StdRng::seed_from_u64(seed);
        engine.render_melody(melody, &mut rng)
    }

    pub fn close(&mut self) {
        if self.context != ContextState::Closed {
            log::info!("Audio context closed");
        }
        self.context = ContextState::Closed;
        self.is_playing = false;
    }

    // ── Views ───────────────────────────────────────────────

    pub fn waveform_image(&self, width: usize) -> Result<RgbaImage, RemixError> {
        self.ensure_open()?;
        if self.clip.is_none() {
            return Err(RemixError::NoClipLoaded);
        }
        render_waveform(&self.mono, width, &self.config.waveform, self.playback_progress())
    }

    pub fn spectrogram_image(&self, width: usize) -> Result<SpectrogramImage, RemixError> {
        self.ensure_open()?;
        let clip = self.clip.as_ref().ok_or(RemixError::NoClipLoaded)?;
        let spectrogram =
            compute_spectrogram(&self.mono, clip.sample_rate as f64, &self.config.spectrogram)?;
        Ok(render_spectrogram(&spectrogram, width, &self.config.spectrogram))
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn config(&self) -> &RemixConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn context_state(&self) -> ContextState {
        self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Playhead as a fraction of the clip, for the waveform cursor.
    pub fn playback_progress(&self) -> f64 {
        if self.mono.is_empty() {
            0.0
        } else {
            self.position as f64 / self.mono.len() as f64
        }
    }

    /// Latest dB spectrum read by `analyze_frame`.
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    pub fn dominant_frequency(&self) -> f64 {
        self.dominant_frequency
    }

    pub fn peak_amplitude(&self) -> f32 {
        self.peak_amplitude
    }

    pub fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    pub fn melody(&self) -> Option<&Melody> {
        self.melody.as_ref()
    }

    pub fn melody_mut(&mut self) -> Option<&mut Melody> {
        self.melody.as_mut()
    }

    pub fn remix_progress(&self) -> u8 {
        self.remix_progress
    }

    pub fn progress_visible(&self) -> bool {
        self.remix_progress > 0
    }
}
