//! Pixel renderers for the clip view: the waveform strip and spectrogram.

pub mod image;
pub mod spectrogram;
pub mod waveform;

pub use image::{Rgba, RgbaImage};
pub use spectrogram::{
    ColorMap, FrequencyLabel, Spectrogram, SpectrogramConfig, SpectrogramImage,
    compute_spectrogram, frequency_labels, render_spectrogram,
};
pub use waveform::{WaveformStyle, render_waveform, waveform_peaks};
