//! Top-level configuration for a remix session.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyserConfig;
use crate::dsp::engine::SynthConfig;
use crate::error::RemixError;
use crate::melody::MelodyParams;
use crate::render::image::Rgba;
use crate::render::{SpectrogramConfig, WaveformStyle};

/// Every tunable of the remixer. Missing fields fall back to defaults,
/// so `{}` is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemixConfig {
    pub melody: MelodyParams,
    pub synth: SynthConfig,
    pub analyser: AnalyserConfig,
    pub waveform: WaveformStyle,
    pub spectrogram: SpectrogramConfig,
}

impl RemixConfig {
    pub fn from_json(json: &str) -> Result<Self, RemixError> {
        let config: RemixConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, RemixError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would only fail later, mid-session.
    pub fn validate(&self) -> Result<(), RemixError> {
        self.melody.validate()?;
        for size in [self.analyser.fft_size, self.spectrogram.fft_size] {
            if !size.is_power_of_two() || !(32..=32768).contains(&size) {
                return Err(RemixError::InvalidFftSize { size });
            }
        }
        for color in [
            &self.waveform.wave_color,
            &self.waveform.progress_color,
            &self.waveform.cursor_color,
        ] {
            Rgba::from_hex(color)?;
        }
        let synth = &self.synth;
        if !(synth.tuning_pitch.is_finite() && synth.tuning_pitch > 0.0) {
            return Err(RemixError::InvalidConfig(format!(
                "tuning pitch must be positive, got {}",
                synth.tuning_pitch
            )));
        }
        if synth.chorus_voices == 0 {
            return Err(RemixError::InvalidConfig("chorus voices must be at least 1".into()));
        }
        Ok(())
    }
}
