//! Audio Engine Module
//!
//! Core audio engine including:
//! - Parameter automation timelines
//! - The oscillator / pan / gain render graph
//! - Rendering contexts (offline and audio device)
//! - The single-voice start / retune / stop state machine

pub mod context;
pub mod device;
pub mod graph;
pub mod param;
pub mod voice;

pub use context::{AudioBackend, AudioContext, ContextState, OfflineBackend, OfflineContext};
pub use device::{DeviceBackend, DeviceContext};
pub use graph::{pan_gains, ParamTarget, RenderGraph, SineOscillator, VoiceId, VoiceNode};
pub use param::{AudioParam, Automation};
pub use voice::{VoiceEngine, VoiceState};
