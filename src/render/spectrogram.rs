//! Short-time spectrum images with frequency labels.
//!
//! Columns are Hann-windowed FFT frames at half-window hops. Each bin is
//! mapped to dB and then into 0..1 over a fixed range before colouring.

use std::f32::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::RemixError;

use super::image::{Rgba, RgbaImage};

/// Levels this far below full scale map to 0.
pub const DB_RANGE: f32 = 100.0;

/// Number of label bands; ticks sit on the inner boundaries.
const LABEL_BANDS: usize = 5;

// ── Colour map ──────────────────────────────────────────────

/// Evenly spaced `[r, g, b, a]` stops, rgb in 0..255 and alpha in 0..1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMap(pub Vec<[f32; 4]>);

impl Default for ColorMap {
    fn default() -> Self {
        ColorMap(vec![
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 74.0, 255.0, 1.0],
            [159.0, 110.0, 255.0, 1.0],
        ])
    }
}

impl ColorMap {
    /// Linear interpolation between the neighbouring stops of `t` in [0, 1].
    pub fn sample(&self, t: f32) -> Rgba {
        let stops = &self.0;
        let Some(last) = stops.len().checked_sub(1) else {
            return Rgba::TRANSPARENT;
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let frac = pos - i as f32;

        let mut out = [0u8; 4];
        for (c, px) in out.iter_mut().enumerate() {
            let v = stops[i][c] + (stops[j][c] - stops[i][c]) * frac;
            let v = if c == 3 { v * 255.0 } else { v };
            *px = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgba(out)
    }
}

// ── Config ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpectrogramConfig {
    pub fft_size: usize,
    pub height: usize,
    pub labels: bool,
    pub color_map: ColorMap,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        SpectrogramConfig {
            fft_size: 512,
            height: 100,
            labels: true,
            color_map: ColorMap::default(),
        }
    }
}

// ── Analysis ────────────────────────────────────────────────

/// STFT magnitudes, one column per frame, each with `fft_size / 2` bins
/// scaled to 0..1.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub columns: Vec<Vec<f32>>,
    pub bins: usize,
    pub sample_rate: f64,
}

impl Spectrogram {
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }
}

pub fn compute_spectrogram(
    samples: &[f32],
    sample_rate: f64,
    config: &SpectrogramConfig,
) -> Result<Spectrogram, RemixError> {
    let n = config.fft_size;
    if !n.is_power_of_two() || !(32..=32768).contains(&n) {
        return Err(RemixError::InvalidFftSize { size: n });
    }
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(RemixError::InvalidSampleRate { rate: sample_rate });
    }

    let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
    let window: Vec<f32> = (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect();
    // A full-scale sine on a bin centre reads 1.0.
    let norm = 2.0 / window.iter().sum::<f32>();

    let hop = n / 2;
    let frames = if samples.len() <= n { 1 } else { (samples.len() - n) / hop + 1 };
    let bins = n / 2;
    let mut buf = vec![Complex::new(0.0f32, 0.0); n];
    let mut columns = Vec::with_capacity(frames);

    for frame in 0..frames {
        let start = frame * hop;
        for (i, slot) in buf.iter_mut().enumerate() {
            let x = samples.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(x * window[i], 0.0);
        }
        fft.process(&mut buf);
        let column = buf[..bins]
            .iter()
            .map(|c| {
                let db = 20.0 * (c.norm() * norm).max(1e-10).log10();
                ((db + DB_RANGE) / DB_RANGE).clamp(0.0, 1.0)
            })
            .collect();
        columns.push(column);
    }

    log::debug!("spectrogram: {frames} columns × {bins} bins at {sample_rate} Hz");
    Ok(Spectrogram { columns, bins, sample_rate })
}

// ── Rendering ───────────────────────────────────────────────

/// A frequency tick on the label strip, `y` in image rows from the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyLabel {
    pub y: usize,
    pub frequency: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramImage {
    pub image: RgbaImage,
    pub labels: Vec<FrequencyLabel>,
}

/// `"500 Hz"` below 1 kHz, `"1.5 kHz"` above.
pub fn format_frequency(hz: f64) -> String {
    if hz >= 1000.0 {
        format!("{:.1} kHz", hz / 1000.0)
    } else {
        format!("{hz:.0} Hz")
    }
}

/// Ticks at the inner band boundaries between 0 Hz and `nyquist`, top
/// rows for high frequencies.
pub fn frequency_labels(nyquist: f64, height: usize) -> Vec<FrequencyLabel> {
    if height == 0 {
        return Vec::new();
    }
    (1..LABEL_BANDS)
        .map(|k| {
            let frac = k as f64 / LABEL_BANDS as f64;
            let frequency = nyquist * frac;
            FrequencyLabel {
                y: ((1.0 - frac) * height as f64) as usize,
                frequency,
                text: format_frequency(frequency),
            }
        })
        .collect()
}

/// Paint `spectrogram` into a `width × config.height` image, nearest
/// neighbour in both axes, with bin 0 on the bottom row.
pub fn render_spectrogram(
    spectrogram: &Spectrogram,
    width: usize,
    config: &SpectrogramConfig,
) -> SpectrogramImage {
    let height = config.height;
    let mut image = RgbaImage::new(width, height, Rgba::BLACK);
    let cols = spectrogram.columns.len();
    let bins = spectrogram.bins;

    if cols > 0 && bins > 0 {
        for x in 0..width {
            let column = &spectrogram.columns[x * cols / width];
            for y in 0..height {
                let bin = (height - 1 - y) * bins / height;
                let level = column.get(bin).copied().unwrap_or(0.0);
                image.set(x, y, config.color_map.sample(level));
            }
        }
    }

    let labels = if config.labels {
        frequency_labels(spectrogram.nyquist(), height)
    } else {
        Vec::new()
    };

    SpectrogramImage { image, labels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_map_interpolates() {
        let map = ColorMap::default();
        assert_eq!(map.sample(0.0), Rgba([0, 0, 0, 255]));
        assert_eq!(map.sample(1.0), Rgba([159, 110, 255, 255]));
        assert_eq!(map.sample(0.25), Rgba([0, 37, 128, 255]));
        assert_eq!(map.sample(0.5), Rgba([0, 74, 255, 255]));
        // Out-of-range input clamps.
        assert_eq!(map.sample(7.0), map.sample(1.0));
        assert_eq!(ColorMap(vec![]).sample(0.5), Rgba::TRANSPARENT);
        assert_eq!(ColorMap(vec![[10.0, 20.0, 30.0, 0.5]]).sample(0.9), Rgba([10, 20, 30, 128]));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let sr = 8000.0;
        let config = SpectrogramConfig::default();
        // Bin 64 of 512 at 8 kHz.
        let freq = 64.0 * sr as f32 / 512.0;
        let samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = compute_spectrogram(&samples, sr, &config).unwrap();
        assert_eq!(spec.bins, 256);
        assert_eq!(spec.columns.len(), (2048 - 512) / 256 + 1);

        let column = &spec.columns[2];
        let (peak, &level) = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(peak, 64);
        assert!(level > 0.95, "peak level {level}");
        assert!(column[200] < 0.2, "far bin {}", column[200]);
    }

    #[test]
    fn silence_and_short_input() {
        let config = SpectrogramConfig::default();
        let spec = compute_spectrogram(&[0.0; 100], 44100.0, &config).unwrap();
        assert_eq!(spec.columns.len(), 1);
        assert!(spec.columns[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rejects_bad_parameters() {
        let config = SpectrogramConfig { fft_size: 500, ..Default::default() };
        assert!(matches!(
            compute_spectrogram(&[0.0; 10], 44100.0, &config),
            Err(RemixError::InvalidFftSize { size: 500 })
        ));
        let config = SpectrogramConfig::default();
        assert!(compute_spectrogram(&[0.0; 10], 0.0, &config).is_err());
    }

    #[test]
    fn low_frequencies_at_the_bottom() {
        let spec = Spectrogram {
            columns: vec![vec![1.0, 0.0, 0.0, 0.0]],
            bins: 4,
            sample_rate: 8000.0,
        };
        let config = SpectrogramConfig { height: 4, labels: false, ..Default::default() };
        let out = render_spectrogram(&spec, 2, &config);
        assert_eq!((out.image.width, out.image.height), (2, 4));
        assert_eq!(out.image.get(1, 3), Some(Rgba([159, 110, 255, 255])));
        assert_eq!(out.image.get(1, 0), Some(Rgba([0, 0, 0, 255])));
        assert!(out.labels.is_empty());
    }

    #[test]
    fn labels_span_the_range() {
        let spec = Spectrogram { columns: vec![vec![0.0; 8]], bins: 8, sample_rate: 5000.0 };
        let out = render_spectrogram(&spec, 10, &SpectrogramConfig::default());
        let texts: Vec<&str> = out.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["500 Hz", "1.0 kHz", "1.5 kHz", "2.0 kHz"]);
        assert_eq!(out.labels[0].y, 80);
        assert!(out.labels.windows(2).all(|w| w[0].y > w[1].y), "higher goes up");
    }
}
