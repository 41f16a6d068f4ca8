//! Bar-style waveform rendering with a played/unplayed split and cursor.

use serde::{Deserialize, Serialize};

use crate::error::RemixError;

use super::image::{Rgba, RgbaImage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveformStyle {
    pub wave_color: String,
    pub progress_color: String,
    pub cursor_color: String,
    pub height: usize,
    pub bar_width: usize,
    pub bar_gap: usize,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        WaveformStyle {
            wave_color: "#4a9eff".to_string(),
            progress_color: "#9f6eff".to_string(),
            cursor_color: "#00ff88".to_string(),
            height: 100,
            bar_width: 2,
            bar_gap: 1,
        }
    }
}

/// Peak |x| per bucket, scaled so the loudest bucket is 1.0.
///
/// Silent input gives all zeros rather than dividing by zero.
pub fn waveform_peaks(samples: &[f32], buckets: usize) -> Vec<f32> {
    if buckets == 0 {
        return Vec::new();
    }
    let mut peaks = vec![0.0f32; buckets];
    if samples.is_empty() {
        return peaks;
    }
    for (b, peak) in peaks.iter_mut().enumerate() {
        let start = b * samples.len() / buckets;
        let end = ((b + 1) * samples.len() / buckets).max(start + 1).min(samples.len());
        *peak = samples[start..end].iter().fold(0.0, |m, s| m.max(s.abs()));
    }
    let loudest = peaks.iter().copied().fold(0.0, f32::max);
    if loudest > 0.0 {
        peaks.iter_mut().for_each(|p| *p /= loudest);
    }
    peaks
}

/// Draw the waveform as vertically centred bars on a transparent canvas.
///
/// `progress` in [0, 1] splits played bars (progress colour) from the
/// rest and places a 1 px cursor.
pub fn render_waveform(
    samples: &[f32],
    width: usize,
    style: &WaveformStyle,
    progress: f64,
) -> Result<RgbaImage, RemixError> {
    let wave = Rgba::from_hex(&style.wave_color)?;
    let played = Rgba::from_hex(&style.progress_color)?;
    let cursor = Rgba::from_hex(&style.cursor_color)?;

    let height = style.height;
    let mut img = RgbaImage::new(width, height, Rgba::TRANSPARENT);
    let stride = (style.bar_width + style.bar_gap).max(1);
    let bar_width = style.bar_width.max(1);
    let bars = width.div_ceil(stride);
    let peaks = waveform_peaks(samples, bars);

    let progress = progress.clamp(0.0, 1.0);
    let cursor_x = ((progress * width as f64) as usize).min(width.saturating_sub(1));
    let mid = height as f32 / 2.0;

    for (i, &peak) in peaks.iter().enumerate() {
        let x0 = i * stride;
        // Always draw at least one pixel so silence shows as a flat line.
        let half = (peak * mid).round().max(0.5);
        let y0 = (mid - half).max(0.0) as usize;
        let y1 = ((mid + half) as usize).min(height);
        let color = if x0 < cursor_x { played } else { wave };
        img.fill_rect(x0, y0, x0 + bar_width, y1.max(y0 + 1), color);
    }

    if width > 0 {
        img.fill_rect(cursor_x, 0, cursor_x + 1, height, cursor);
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_are_normalized() {
        let samples = [0.1, -0.2, 0.05, 0.0, -0.4, 0.2];
        let peaks = waveform_peaks(&samples, 3);
        assert_eq!(peaks.len(), 3);
        assert!((peaks[0] - 0.5).abs() < 1e-6);
        assert!((peaks[1] - 0.125).abs() < 1e-6);
        assert_eq!(peaks[2], 1.0);
    }

    #[test]
    fn peaks_of_silence_and_short_input() {
        assert!(waveform_peaks(&[0.0; 10], 4).iter().all(|&p| p == 0.0));
        assert_eq!(waveform_peaks(&[], 4), vec![0.0; 4]);
        assert!(waveform_peaks(&[1.0], 0).is_empty());
        // More buckets than samples: every bucket still reads a sample.
        assert_eq!(waveform_peaks(&[0.5, -1.0], 4), vec![0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn bars_split_at_progress() {
        let style = WaveformStyle::default();
        let samples = vec![1.0f32; 300];
        let img = render_waveform(&samples, 30, &style, 0.5).unwrap();
        assert_eq!((img.width, img.height), (30, 100));

        let wave = Rgba::from_hex(&style.wave_color).unwrap();
        let played = Rgba::from_hex(&style.progress_color).unwrap();
        let cursor = Rgba::from_hex(&style.cursor_color).unwrap();
        assert_eq!(img.get(0, 50), Some(played));
        assert_eq!(img.get(2, 50), Some(Rgba::TRANSPARENT), "gap column");
        assert_eq!(img.get(15, 10), Some(cursor));
        assert_eq!(img.get(27, 50), Some(wave));
    }

    #[test]
    fn bar_height_tracks_peak() {
        let style = WaveformStyle { height: 40, ..Default::default() };
        let mut samples = vec![0.5f32; 10];
        samples.extend(vec![1.0f32; 10]);
        let img = render_waveform(&samples, 6, &style, 0.0).unwrap();
        // Left bar is half height: rows 10..30. Right bar fills the canvas.
        // Column 0 carries the cursor, so look at the bar's second column.
        assert_eq!(img.get(1, 5), Some(Rgba::TRANSPARENT));
        assert_ne!(img.get(1, 15), Some(Rgba::TRANSPARENT));
        assert_ne!(img.get(3, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn bad_colour_is_an_error() {
        let style = WaveformStyle { wave_color: "blue".into(), ..Default::default() };
        assert!(render_waveform(&[0.0], 10, &style, 0.0).is_err());
    }
}
