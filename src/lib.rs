pub mod analysis;
pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod melody;
pub mod render;
pub mod session;
pub mod theory;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

use crate::audio::AudioClip;
use crate::config::RemixConfig;
use crate::dsp::engine::SynthConfig;
use crate::melody::{Melody, MelodyGenerator, MelodyParams};
use crate::render::{SpectrogramConfig, WaveformStyle};
use crate::session::RemixSession;

pub use crate::error::RemixError;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_err)
}

/// WASM-exposed: return the remix-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: generate a melody with default parameters.
#[wasm_bindgen]
pub fn generate_melody(seed: u32) -> Result<JsValue, JsValue> {
    let mut rng = StdRng::seed_from_u64(seed as u64);
    let melody = MelodyGenerator::new(MelodyParams::default()).generate(&mut rng, |_| {});
    to_js(&melody)
}

/// WASM-exposed: synthesize a melody object to a 16-bit stereo WAV byte array.
#[wasm_bindgen]
pub fn render_melody_wav(melody: JsValue, sample_rate: u32, seed: u32) -> Result<Vec<u8>, JsValue> {
    let melody: Melody = serde_wasm_bindgen::from_value(melody).map_err(js_err)?;
    let mut rng = StdRng::seed_from_u64(seed as u64);
    dsp::renderer::render_wav(&melody, &SynthConfig::default(), sample_rate, &mut rng).map_err(js_err)
}

/// WASM-exposed: zero-crossing pitch of a mono chunk as a MIDI note.
#[wasm_bindgen]
pub fn detect_pitch(samples: &[f32], sample_rate: f64) -> Option<u8> {
    analysis::zero_crossing_pitch(samples, sample_rate)
}

/// WASM-exposed: RGBA pixels of a waveform strip (`width × style.height`).
#[wasm_bindgen]
pub fn waveform_image(
    samples: &[f32],
    width: usize,
    progress: f64,
    style_json: Option<String>,
) -> Result<Vec<u8>, JsValue> {
    let style: WaveformStyle = match style_json {
        Some(json) => serde_json::from_str(&json).map_err(js_err)?,
        None => WaveformStyle::default(),
    };
    let image = render::render_waveform(samples, width, &style, progress).map_err(js_err)?;
    Ok(image.pixels)
}

/// WASM-exposed: RGBA pixels of a spectrogram (`width × config.height`).
#[wasm_bindgen]
pub fn spectrogram_image(
    samples: &[f32],
    sample_rate: f64,
    width: usize,
    config_json: Option<String>,
) -> Result<Vec<u8>, JsValue> {
    let config: SpectrogramConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(js_err)?,
        None => SpectrogramConfig::default(),
    };
    let spectrogram = render::compute_spectrogram(samples, sample_rate, &config).map_err(js_err)?;
    Ok(render::render_spectrogram(&spectrogram, width, &config).image.pixels)
}

// ── Remixer ─────────────────────────────────────────────────

/// WASM-exposed remix session: transport, analysis, and generation state
/// for one page.
#[wasm_bindgen]
pub struct Remixer {
    session: RemixSession,
}

#[wasm_bindgen]
impl Remixer {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, config_json: Option<String>) -> Result<Remixer, JsValue> {
        console_error_panic_hook::set_once();
        let config = match config_json {
            Some(json) => RemixConfig::from_json(&json).map_err(js_err)?,
            None => RemixConfig::default(),
        };
        let session = RemixSession::new(sample_rate, config).map_err(js_err)?;
        Ok(Remixer { session })
    }

    pub fn initialize_audio_context(&mut self) -> Result<(), JsValue> {
        self.session.initialize_audio_context().map_err(js_err)
    }

    /// Load a decoded clip given as interleaved samples.
    pub fn load_clip(
        &mut self,
        samples: &[f32],
        channels: usize,
        sample_rate: u32,
        name: String,
    ) -> Result<(), JsValue> {
        let clip = AudioClip::from_interleaved(samples, channels, sample_rate, name).map_err(js_err)?;
        self.session.load_clip(clip).map_err(js_err)
    }

    pub fn toggle_playback(&mut self) -> Result<bool, JsValue> {
        self.session.toggle_playback().map_err(js_err)
    }

    pub fn advance(&mut self, seconds: f64) -> Result<Vec<f32>, JsValue> {
        self.session.advance(seconds).map(<[f32]>::to_vec).map_err(js_err)
    }

    pub fn analyze_frame(&mut self) -> Result<JsValue, JsValue> {
        let frame = self.session.analyze_frame().map_err(js_err)?;
        to_js(&frame)
    }

    pub fn analysis_bars(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.history().bars())
    }

    pub fn generate_melody(&mut self, seed: u32) -> Result<JsValue, JsValue> {
        let melody = self.session.generate_melody(seed as u64).map_err(js_err)?;
        to_js(melody)
    }

    /// Mark the notes sounding at `time` and return their indices.
    pub fn update_active_notes(&mut self, time: f64) -> Vec<u32> {
        self.session
            .melody_mut()
            .map(|m| m.update_active(time).into_iter().map(|i| i as u32).collect())
            .unwrap_or_default()
    }

    /// Render the current melody as interleaved stereo f32.
    pub fn render_remix(&self, seed: u32) -> Result<Vec<f32>, JsValue> {
        let audio = self.session.render_remix(seed as u64).map_err(js_err)?;
        Ok(audio.left.iter().zip(&audio.right).flat_map(|(&l, &r)| [l, r]).collect())
    }

    pub fn render_remix_wav(&self, seed: u32) -> Result<Vec<u8>, JsValue> {
        let audio = self.session.render_remix(seed as u64).map_err(js_err)?;
        Ok(dsp::renderer::encode_stereo(&audio))
    }

    pub fn waveform(&self, width: usize) -> Result<Vec<u8>, JsValue> {
        Ok(self.session.waveform_image(width).map_err(js_err)?.pixels)
    }

    pub fn spectrogram(&self, width: usize) -> Result<Vec<u8>, JsValue> {
        Ok(self.session.spectrogram_image(width).map_err(js_err)?.image.pixels)
    }

    pub fn spectrogram_labels(&self) -> Result<JsValue, JsValue> {
        let clip = self.session.clip().ok_or_else(|| js_err(RemixError::NoClipLoaded))?;
        let config = &self.session.config().spectrogram;
        let labels = if config.labels {
            render::frequency_labels(clip.sample_rate as f64 / 2.0, config.height)
        } else {
            Vec::new()
        };
        to_js(&labels)
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    #[wasm_bindgen(getter)]
    pub fn context_state(&self) -> String {
        self.session.context_state().as_str().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    #[wasm_bindgen(getter)]
    pub fn current_time(&self) -> f64 {
        self.session.current_time()
    }

    #[wasm_bindgen(getter)]
    pub fn playback_progress(&self) -> f64 {
        self.session.playback_progress()
    }

    #[wasm_bindgen(getter)]
    pub fn dominant_frequency(&self) -> f64 {
        self.session.dominant_frequency()
    }

    #[wasm_bindgen(getter)]
    pub fn peak_amplitude(&self) -> f32 {
        self.session.peak_amplitude()
    }

    #[wasm_bindgen(getter)]
    pub fn remix_progress(&self) -> u8 {
        self.session.remix_progress()
    }

    #[wasm_bindgen(getter)]
    pub fn progress_visible(&self) -> bool {
        self.session.progress_visible()
    }
}
