//! Audio Rendering Context
//!
//! The voice engine talks to audio hardware only through these traits, so
//! tests can swap the real device for an offline context that renders on
//! demand.
//!
//! A context starts `Suspended` (hosts may refuse to produce sound until the
//! user interacts) and must be resumed before it advances.

use std::fmt;

use crate::config::EngineConfig;
use crate::engine::graph::RenderGraph;
use crate::error::{BinauralError, Result};

/// Lifecycle of a rendering context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// Created but not producing audio
    #[default]
    Suspended,
    /// Pulling samples from the render graph
    Running,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Suspended => write!(f, "Suspended"),
            ContextState::Running => write!(f, "Running"),
        }
    }
}

/// A live rendering context owning a `RenderGraph`
pub trait AudioContext {
    /// Current lifecycle state
    fn state(&self) -> ContextState;

    /// Start (or restart) producing audio
    fn resume(&mut self) -> Result<()>;

    /// Context clock in seconds
    fn current_time(&self) -> f64;

    /// Run `f` against the render graph
    ///
    /// Implementations sharing the graph with an audio thread lock it for
    /// the duration of `f`; keep the closure short.
    fn with_graph<R>(&mut self, f: impl FnOnce(&mut RenderGraph) -> R) -> Result<R>;
}

/// Factory for rendering contexts
///
/// `VoiceEngine` calls `open` at most once and keeps the context for the
/// rest of its lifetime.
pub trait AudioBackend {
    type Context: AudioContext;

    /// Create a new, suspended context
    fn open(&mut self) -> Result<Self::Context>;
}

// ============================================================================
// Offline Backend
// ============================================================================

/// Context that renders only when asked to
///
/// Time stands still until `render` or `advance` is called, which makes
/// envelope timing fully deterministic.
#[derive(Debug, Clone)]
pub struct OfflineContext {
    graph: RenderGraph,
    state: ContextState,
    resume_count: usize,
}

impl OfflineContext {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            graph: RenderGraph::new(sample_rate),
            state: ContextState::Suspended,
            resume_count: 0,
        }
    }

    /// Put the context back to sleep, as a host might on its own
    pub fn suspend(&mut self) {
        self.state = ContextState::Suspended;
    }

    /// How many times `resume` has been called
    pub fn resume_count(&self) -> usize {
        self.resume_count
    }

    /// Render `frames` stereo frames; a suspended context renders nothing
    pub fn render(&mut self, frames: usize) -> Vec<[f32; 2]> {
        match self.state {
            ContextState::Running => self.graph.render_stereo(frames),
            ContextState::Suspended => Vec::new(),
        }
    }

    /// Render and discard `secs` worth of audio
    pub fn advance(&mut self, secs: f64) -> Vec<[f32; 2]> {
        let frames = (secs * self.graph.sample_rate() as f64).round() as usize;
        self.render(frames)
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }
}

impl AudioContext for OfflineContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        self.state = ContextState::Running;
        self.resume_count += 1;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.graph.current_time()
    }

    fn with_graph<R>(&mut self, f: impl FnOnce(&mut RenderGraph) -> R) -> Result<R> {
        Ok(f(&mut self.graph))
    }
}

/// Backend producing `OfflineContext`s
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    sample_rate: u32,
    opened: usize,
    unavailable: Option<String>,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            opened: 0,
            unavailable: None,
        }
    }

    /// Offline backend at the configured sample rate
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.sample_rate)
    }

    /// A backend whose `open` always fails, as when no device is present
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            sample_rate: 0,
            opened: 0,
            unavailable: Some(reason.into()),
        }
    }

    /// Number of contexts created so far
    pub fn opened(&self) -> usize {
        self.opened
    }
}

impl AudioBackend for OfflineBackend {
    type Context = OfflineContext;

    fn open(&mut self) -> Result<OfflineContext> {
        if let Some(reason) = &self.unavailable {
            return Err(BinauralError::AudioUnavailable {
                reason: reason.clone(),
                source: None,
            });
        }
        self.opened += 1;
        Ok(OfflineContext::new(self.sample_rate))
    }
}
