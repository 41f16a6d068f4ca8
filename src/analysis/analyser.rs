//! A frequency analyser with the semantics of a Web Audio `AnalyserNode`.
//!
//! Keeps the most recent `fft_size` samples, applies a Blackman window,
//! and reports magnitudes in decibels with exponential smoothing between
//! successive reads.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::RemixError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyserConfig {
    /// Power of two in 32..=32768.
    pub fft_size: usize,
    /// Weight of the previous frame, in [0, 1).
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        AnalyserConfig {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

pub struct Analyser {
    config: AnalyserConfig,
    sample_rate: f64,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Last `fft_size` input samples, oldest first.
    history: VecDeque<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(config: AnalyserConfig, sample_rate: f64) -> Result<Self, RemixError> {
        let n = config.fft_size;
        if !n.is_power_of_two() || !(32..=32768).contains(&n) {
            return Err(RemixError::InvalidFftSize { size: n });
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(RemixError::InvalidSampleRate { rate: sample_rate });
        }

        let fft = FftPlanner::new().plan_fft_forward(n);
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Ok(Analyser {
            config: AnalyserConfig {
                smoothing_time_constant: config.smoothing_time_constant.clamp(0.0, 1.0),
                ..config
            },
            sample_rate,
            fft,
            window,
            history: std::iter::repeat_n(0.0, n).collect(),
            scratch: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; n / 2],
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Number of usable frequency bins: half the FFT size.
    pub fn frequency_bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Feed newly played samples. Only the latest `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let overflow = (self.history.len() + tail.len()).saturating_sub(n);
        self.history.drain(..overflow);
        self.history.extend(tail);
    }

    /// Forget all input and smoothing state.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|s| *s = 0.0);
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Copy the current time-domain window into `out`.
    pub fn float_time_domain_data(&self, out: &mut [f32]) {
        for (dst, src) in out.iter_mut().zip(&self.history) {
            *dst = *src;
        }
    }

    /// Window, transform, and fold the new magnitudes into the smoothed spectrum.
    fn update_spectrum(&mut self) {
        let n = self.config.fft_size;
        for ((slot, &x), &w) in self.scratch.iter_mut().zip(&self.history).zip(&self.window) {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        for (prev, bin) in self.smoothed.iter_mut().zip(&self.scratch) {
            let magnitude = bin.norm() / n as f32;
            let next = tau * *prev + (1.0 - tau) * magnitude;
            *prev = if next.is_finite() { next } else { 0.0 };
        }
    }

    /// Current spectrum in dB, one value per bin. Silent bins read `-inf`.
    pub fn float_frequency_data(&mut self, out: &mut [f32]) {
        self.update_spectrum();
        for (dst, &mag) in out.iter_mut().zip(&self.smoothed) {
            *dst = 20.0 * mag.log10();
        }
    }

    /// Current spectrum scaled from `[min_decibels, max_decibels]` onto 0..=255.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.update_spectrum();
        let min = self.config.min_decibels;
        let range = (self.config.max_decibels - min).max(f32::EPSILON);
        for (dst, &mag) in out.iter_mut().zip(&self.smoothed) {
            let db = 20.0 * mag.log10();
            let scaled = 255.0 / range * (db - min);
            *dst = if scaled.is_finite() { scaled.clamp(0.0, 255.0) as u8 } else { 0 };
        }
    }

    /// Centre frequency of bin `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate / self.config.fft_size as f64
    }
}
