//! Spectrum analysis and pitch estimation for the playing clip.

pub mod analyser;
pub mod metrics;
pub mod pitch;

pub use analyser::{Analyser, AnalyserConfig};
pub use metrics::{AnalysisBar, AnalysisHistory, FrameAnalysis, analyze_frame};
pub use pitch::{zero_crossing_frequency, zero_crossing_pitch};
