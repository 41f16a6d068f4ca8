//! Per-frame spectrum metrics and the rolling history drawn under the
//! spectrogram.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Offset added to the peak dB so typical levels read as positive numbers.
pub const AMPLITUDE_OFFSET: f32 = 140.0;

/// Frames kept for the analysis bar graph.
pub const HISTORY_LEN: usize = 100;

/// What one animation frame saw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Dominant frequency in Hz.
    pub frequency: f64,
    /// Peak level in dB, shifted up by [`AMPLITUDE_OFFSET`].
    pub amplitude: f32,
    /// Playback time the frame was taken at, in seconds.
    pub timestamp: f64,
}

/// Pick the dominant bin of a dB spectrum and derive the frame metrics.
///
/// The first bin holding the maximum wins. When no bin beats `-inf`
/// (silence or an empty spectrum) bin 0 is reported.
pub fn analyze_frame(spectrum_db: &[f32], sample_rate: f64, timestamp: f64) -> FrameAnalysis {
    let mut max_db = f32::NEG_INFINITY;
    let mut dominant = 0usize;
    for (i, &db) in spectrum_db.iter().enumerate() {
        if db > max_db {
            max_db = db;
            dominant = i;
        }
    }

    let bins = spectrum_db.len().max(1) as f64;
    FrameAnalysis {
        frequency: dominant as f64 * sample_rate / (2.0 * bins),
        amplitude: max_db + AMPLITUDE_OFFSET,
        timestamp,
    }
}

/// One bar of the history graph, in CSS-friendly units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBar {
    pub left_percent: f64,
    pub height_percent: f64,
    /// Hue in degrees for `hsl(hue, 70%, 50%)`.
    pub hue: f64,
}

/// The most recent frames, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisHistory {
    frames: VecDeque<FrameAnalysis>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        AnalysisHistory { frames: VecDeque::with_capacity(HISTORY_LEN) }
    }

    pub fn push(&mut self, frame: FrameAnalysis) {
        if self.frames.len() == HISTORY_LEN {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn latest(&self) -> Option<&FrameAnalysis> {
        self.frames.back()
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameAnalysis> {
        self.frames.iter()
    }

    /// Lay the history out as bars across the full width.
    ///
    /// Silent frames (`-inf` amplitude) draw as zero-height bars.
    pub fn bars(&self) -> Vec<AnalysisBar> {
        let len = self.frames.len() as f64;
        self.frames
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let height = f.amplitude as f64 / AMPLITUDE_OFFSET as f64 * 100.0;
                AnalysisBar {
                    left_percent: i as f64 / len * 100.0,
                    height_percent: if height.is_finite() { height } else { 0.0 },
                    hue: f.frequency % 360.0,
                }
            })
            .collect()
    }
}
