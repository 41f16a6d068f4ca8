//! DSP: pure Rust synthesis for generated melodies.
//!
//! The same code renders in the browser (via WASM, handing f32 buffers to
//! Web Audio) and natively (offline WAV export).

pub mod chorus;
pub mod engine;
pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod reverb;
pub mod voice;
