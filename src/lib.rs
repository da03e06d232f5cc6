//! Binaural - Two-Tone Beat Generator
//!
//! Plays a binaural beat: one sine tone hard-panned to each ear, the right
//! tone offset from the left by the beat frequency. A rotary dial gesture
//! shifts both tones by whole or fractional octaves while keeping their
//! ratio.
//!
//! # Architecture
//!
//! The system has two core components:
//! - `GestureMapper`: pure math from accumulated dial rotation to an octave
//!   offset and a scaled frequency pair
//! - `VoiceEngine`: owns the audio context and the single live voice, with
//!   click-free fade-in, glide and fade-out scheduled on the context clock
//!
//! `Session` ties them together for a display layer; the `cli` module is one
//! such layer.
//!
//! # Example
//! ```
//! use binaural::{FrequencyPair, GestureMapper};
//!
//! let mapper = GestureMapper::default();
//! let pair = mapper.map(FrequencyPair::new(126.22, 10.0), 0.0);
//! assert!((pair.base - 126.22).abs() < 1e-9);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod gesture;
pub mod presets;
pub mod session;

pub use config::{Config, EngineConfig, TuningConfig};
pub use engine::{VoiceEngine, VoiceState};
pub use error::{BinauralError, Result};
pub use frequency::FrequencyPair;
pub use gesture::{GestureMapper, OctaveRange};
pub use presets::{find_preset, CyclingPresets, Preset, PresetSource, RandomPresets, PRESETS};
pub use session::{Session, Snapshot, Track};
