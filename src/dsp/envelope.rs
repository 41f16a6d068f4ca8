//! ADSR envelope generator.

use serde::{Deserialize, Serialize};

/// ADSR times in seconds and sustain level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeConfig {
    /// Fast strike, short decay, low sustain, long ring-out.
    pub const PIANO: EnvelopeConfig = EnvelopeConfig {
        attack: 0.002,
        decay: 0.2,
        sustain: 0.2,
        release: 1.8,
    };
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig::PIANO
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR envelope, advanced one sample at a time.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub config: EnvelopeConfig,
    stage: Stage,
    level: f64,
    sample_rate: f64,
    stage_samples: usize,
    stage_counter: usize,
    /// Level when the current stage began; attack and release ramp from it.
    start_level: f64,
}

impl Envelope {
    pub fn new(config: EnvelopeConfig, sample_rate: f64) -> Self {
        Envelope {
            config: EnvelopeConfig {
                sustain: config.sustain.clamp(0.0, 1.0),
                ..config
            },
            stage: Stage::Idle,
            level: 0.0,
            sample_rate,
            stage_samples: 0,
            stage_counter: 0,
            start_level: 0.0,
        }
    }

    /// Note on. Retriggering ramps up from the current level.
    pub fn gate_on(&mut self) {
        self.enter(Stage::Attack, self.config.attack);
    }

    /// Note off.
    pub fn gate_off(&mut self) {
        if self.stage != Stage::Idle {
            self.enter(Stage::Release, self.config.release);
        }
    }

    fn enter(&mut self, stage: Stage, seconds: f64) {
        self.stage = stage;
        self.stage_samples = (seconds.max(0.0) * self.sample_rate) as usize;
        self.stage_counter = 0;
        self.start_level = self.level;
    }

    /// Fraction of the current stage elapsed, or `None` once it is over.
    fn step(&mut self) -> Option<f64> {
        if self.stage_counter >= self.stage_samples {
            return None;
        }
        let t = self.stage_counter as f64 / self.stage_samples as f64;
        self.stage_counter += 1;
        Some(t)
    }

    /// Generate the next envelope sample in [0, 1].
    pub fn next_sample(&mut self) -> f64 {
        let sustain = self.config.sustain;
        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => match self.step() {
                Some(t) => self.level = self.start_level + (1.0 - self.start_level) * t,
                None => {
                    self.level = 1.0;
                    self.enter(Stage::Decay, self.config.decay);
                }
            },
            Stage::Decay => match self.step() {
                Some(t) => self.level = 1.0 - (1.0 - sustain) * t,
                None => {
                    self.level = sustain;
                    self.stage = Stage::Sustain;
                }
            },
            Stage::Sustain => self.level = sustain,
            Stage::Release => match self.step() {
                Some(t) => self.level = self.start_level * (1.0 - t),
                None => {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            },
        }
        self.level
    }

    /// True once the envelope is idle (never triggered or fully released).
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle
    }
}
