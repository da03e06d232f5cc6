//! Voice Engine
//!
//! Owns the rendering context and the single live binaural voice.
//!
//! ```text
//!            start                 stop
//!   Idle ------------> Active ------------> FadingOut --(release ends)--> Idle
//!                       ^  | start/retune       |
//!                       |  +-------------+      | start (fade reversed)
//!                       +----------------+------+
//! ```
//!
//! Every change is scheduled on the context clock and returns immediately;
//! nothing here waits for audio to finish.

use std::fmt;

use crate::config::EngineConfig;
use crate::engine::context::{AudioBackend, AudioContext, ContextState};
use crate::engine::graph::{ParamTarget, RenderGraph, VoiceId, VoiceNode};
use crate::error::{BinauralError, Result};
use crate::frequency::FrequencyPair;

/// Engine lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// No voice
    #[default]
    Idle,
    /// Voice connected and sounding
    Active,
    /// Stop requested; gain ramping to silence before teardown
    FadingOut,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Active => write!(f, "Active"),
            VoiceState::FadingOut => write!(f, "FadingOut"),
        }
    }
}

/// The voice currently sounding
#[derive(Debug, Clone, Copy)]
struct LiveVoice {
    id: VoiceId,
    pair: FrequencyPair,
}

/// A released voice whose fade-out is still scheduled
#[derive(Debug, Clone, Copy)]
struct FadingVoice {
    id: VoiceId,
    ends_at: f64,
}

/// Start / retune / stop controller for one binaural voice
///
/// # Example
/// ```
/// use binaural::engine::{OfflineBackend, VoiceEngine, VoiceState};
/// use binaural::{EngineConfig, FrequencyPair};
///
/// let mut engine = VoiceEngine::new(OfflineBackend::new(48000), EngineConfig::default());
/// engine.start(FrequencyPair::new(126.22, 10.0)).unwrap();
/// assert_eq!(engine.state(), VoiceState::Active);
///
/// engine.stop().unwrap();
/// assert_eq!(engine.state(), VoiceState::FadingOut);
/// ```
pub struct VoiceEngine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    /// Created on first start, kept for the engine's lifetime
    context: Option<B::Context>,
    voice: Option<LiveVoice>,
    fading: Option<FadingVoice>,
}

impl<B: AudioBackend> VoiceEngine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            context: None,
            voice: None,
            fading: None,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Start a voice playing `pair`, replacing any voice already present
    ///
    /// Opens the rendering context on first use and resumes it if the host
    /// suspended it. The gain fades in linearly over `attack_secs`. A voice
    /// that is still sounding (active or fading) is taken over in place: its
    /// gain ramps back up from wherever it is and its tones glide to `pair`.
    ///
    /// # Errors
    /// * `AudioUnavailable` / `NoOutputDevice` / `Stream` - the context
    ///   could not be created or resumed; the engine stays Idle
    pub fn start(&mut self, pair: FrequencyPair) -> Result<()> {
        self.replace_voice(pair)
    }

    /// Glide the live voice to `pair` over `retune_secs`
    ///
    /// A no-op while Idle or FadingOut. Each call supersedes the previous
    /// glide target on the same timeline.
    pub fn retune(&mut self, pair: FrequencyPair) -> Result<()> {
        let (Some(voice), Some(context)) = (self.voice, self.context.as_mut()) else {
            tracing::trace!("retune ignored: no live voice");
            return Ok(());
        };

        let now = context.current_time();
        let end = now + self.config.retune_secs;
        let scheduled = context.with_graph(|graph| -> Result<()> {
            glide_to(graph.voice_mut(voice.id)?, pair, now, end)
        });

        match scheduled.and_then(|inner| inner) {
            Ok(()) => {
                self.voice = Some(LiveVoice { id: voice.id, pair });
                tracing::debug!(base = pair.base, beat = pair.beat, "retuned voice");
                Ok(())
            }
            Err(e) => {
                self.abandon_voice(&e);
                Err(e)
            }
        }
    }

    /// Fade the live voice out over `release_secs` and release it
    ///
    /// The gain ramps exponentially toward `silence_floor`; both oscillators
    /// stop when the ramp ends. The handle is released right away, so the
    /// engine reports FadingOut until the context clock passes the end.
    /// A no-op while Idle or FadingOut.
    pub fn stop(&mut self) -> Result<()> {
        let (Some(voice), Some(context)) = (self.voice.take(), self.context.as_mut()) else {
            tracing::trace!("stop ignored: no live voice");
            return Ok(());
        };

        let now = context.current_time();
        let ends_at = now + self.config.release_secs;
        let floor = self.config.silence_floor;
        let scheduled = context.with_graph(|graph| -> Result<()> {
            let node = graph.voice_mut(voice.id)?;
            node.gain.cancel_and_hold_at_time(now)?;
            node.gain.exponential_ramp_to_value_at_time(floor, ends_at)?;
            node.left.stop(ends_at);
            node.right.stop(ends_at);
            Ok(())
        });

        match scheduled.and_then(|inner| inner) {
            Ok(()) => {
                self.fading = Some(FadingVoice {
                    id: voice.id,
                    ends_at,
                });
                tracing::info!(voice = voice.id, release = self.config.release_secs, "voice stopping");
                Ok(())
            }
            Err(e) => {
                self.voice = Some(voice);
                self.abandon_voice(&e);
                Err(e)
            }
        }
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Current lifecycle state
    pub fn state(&self) -> VoiceState {
        if self.voice.is_some() {
            return VoiceState::Active;
        }
        match (&self.fading, &self.context) {
            (Some(fading), Some(context)) if context.current_time() < fading.ends_at => {
                VoiceState::FadingOut
            }
            _ => VoiceState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.voice.is_some()
    }

    /// Pair the live voice is playing (or gliding toward)
    pub fn current_pair(&self) -> Option<FrequencyPair> {
        self.voice.map(|v| v.pair)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The rendering context, once created
    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut B::Context> {
        self.context.as_mut()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Open the context on first use; resume it whenever it is suspended
    fn ensure_context(&mut self) -> Result<&mut B::Context> {
        let context = match self.context {
            Some(ref mut context) => context,
            None => {
                let context = self.backend.open()?;
                tracing::info!("audio context created");
                self.context.insert(context)
            }
        };
        if context.state() == ContextState::Suspended {
            context.resume()?;
            tracing::debug!("audio context resumed");
        }
        Ok(context)
    }

    /// Take over the voice still in the graph, or build one, in one step
    ///
    /// This is the only place voices are created, and it only creates one
    /// when the previous voice is gone, so the graph never holds more than
    /// one. A reused node keeps its phase and its parameter timelines.
    fn replace_voice(&mut self, pair: FrequencyPair) -> Result<()> {
        let previous = self.voice.map(|v| v.id).or_else(|| self.fading.map(|f| f.id));
        let config = self.config.clone();

        let context = self.ensure_context()?;
        let now = context.current_time();
        let scheduled = context.with_graph(|graph| match previous {
            // A fading voice may already have been collected
            Some(id) if graph.is_connected(id) => {
                let revived = graph
                    .voice_mut(id)
                    .and_then(|node| revive_voice(node, pair, now, &config));
                match revived {
                    Ok(()) => Ok((id, true)),
                    Err(e) => {
                        graph.disconnect(id);
                        Err(e)
                    }
                }
            }
            _ => build_voice(graph, pair, now, &config).map(|id| (id, false)),
        });

        self.voice = None;
        self.fading = None;
        match scheduled.and_then(|inner| inner) {
            Ok((id, reused)) => {
                self.voice = Some(LiveVoice { id, pair });
                tracing::info!(
                    voice = id,
                    reused,
                    base = pair.base,
                    beat = pair.beat,
                    "voice started"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start voice");
                Err(e)
            }
        }
    }

    /// Scheduling failed on the live voice: drop it and return to Idle
    fn abandon_voice(&mut self, cause: &BinauralError) {
        tracing::warn!(error = %cause, "scheduling failed; abandoning voice");
        let ids: Vec<VoiceId> = self
            .voice
            .take()
            .map(|v| v.id)
            .into_iter()
            .chain(self.fading.take().map(|f| f.id))
            .collect();
        if let Some(context) = self.context.as_mut() {
            let _ = context.with_graph(|graph| {
                for id in ids {
                    graph.disconnect(id);
                }
            });
        }
    }
}

/// Connect a voice and schedule its fade-in
fn build_voice(
    graph: &mut RenderGraph,
    pair: FrequencyPair,
    now: f64,
    config: &EngineConfig,
) -> Result<VoiceId> {
    let id = graph.connect_voice(pair);
    let scheduled = graph.voice_mut(id).and_then(|node| {
        node.left.frequency.set_value_at_time(pair.left(), now)?;
        node.right.frequency.set_value_at_time(pair.right(), now)?;
        node.gain.set_value_at_time(0.0, now)?;
        node.gain
            .linear_ramp_to_value_at_time(config.target_gain, now + config.attack_secs)
    });
    if let Err(e) = scheduled {
        graph.disconnect(id);
        return Err(e);
    }
    Ok(id)
}

/// Bring a connected voice back to full level playing `pair`
///
/// The gain ramps from its current value (mid-fade or already at target)
/// and any pending oscillator stop is dropped.
fn revive_voice(
    node: &mut VoiceNode,
    pair: FrequencyPair,
    now: f64,
    config: &EngineConfig,
) -> Result<()> {
    node.left.cancel_stop();
    node.right.cancel_stop();
    glide_to(node, pair, now, now + config.retune_secs)?;
    node.gain.cancel_and_hold_at_time(now)?;
    node.gain
        .linear_ramp_to_value_at_time(config.target_gain, now + config.attack_secs)
}

/// Cut both frequency ramps where they stand and head linearly for `pair`
fn glide_to(node: &mut VoiceNode, pair: FrequencyPair, now: f64, end: f64) -> Result<()> {
    for (target, value) in [
        (ParamTarget::LeftFrequency, pair.left()),
        (ParamTarget::RightFrequency, pair.right()),
    ] {
        let param = node.param_mut(target);
        param.cancel_and_hold_at_time(now)?;
        param.linear_ramp_to_value_at_time(value, end)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::{OfflineBackend, OfflineContext};

    const ALPHA: FrequencyPair = FrequencyPair {
        base: 126.22,
        beat: 10.0,
    };

    fn engine() -> VoiceEngine<OfflineBackend> {
        VoiceEngine::new(OfflineBackend::new(48000), EngineConfig::default())
    }

    fn context(engine: &mut VoiceEngine<OfflineBackend>) -> &mut OfflineContext {
        engine.context_mut().unwrap()
    }

    // ------------------------------------------------------------------------
    // State Machine Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_default_state_is_idle() {
        let engine = engine();
        assert_eq!(engine.state(), VoiceState::Idle);
        assert!(engine.context().is_none());
        assert_eq!(engine.current_pair(), None);
    }

    #[test]
    fn test_start_creates_and_resumes_context() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();

        assert_eq!(engine.state(), VoiceState::Active);
        assert_eq!(engine.backend().opened(), 1);
        assert_eq!(engine.context().unwrap().state(), ContextState::Running);
        assert_eq!(engine.current_pair(), Some(ALPHA));
    }

    #[test]
    fn test_context_created_once() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        engine.stop().unwrap();
        engine.start(ALPHA).unwrap();
        engine.start(ALPHA).unwrap();
        assert_eq!(engine.backend().opened(), 1);
    }

    #[test]
    fn test_suspended_context_is_resumed() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).suspend();

        engine.start(ALPHA).unwrap();
        assert_eq!(engine.context().unwrap().state(), ContextState::Running);
        assert_eq!(engine.context().unwrap().resume_count(), 2);
    }

    #[test]
    fn test_stop_fades_then_idles() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).advance(1.0);

        engine.stop().unwrap();
        assert_eq!(engine.state(), VoiceState::FadingOut);
        assert_eq!(engine.current_pair(), None);

        context(&mut engine).advance(0.25);
        assert_eq!(engine.state(), VoiceState::FadingOut);

        context(&mut engine).advance(0.3);
        assert_eq!(engine.state(), VoiceState::Idle);
        assert_eq!(engine.context().unwrap().graph().voice_count(), 0);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut engine = engine();
        assert!(engine.stop().is_ok());
        assert_eq!(engine.state(), VoiceState::Idle);
        assert!(engine.context().is_none());
    }

    #[test]
    fn test_retune_while_idle_is_noop() {
        let mut engine = engine();
        assert!(engine.retune(ALPHA).is_ok());
        assert_eq!(engine.state(), VoiceState::Idle);
        assert!(engine.context().is_none());
    }

    #[test]
    fn test_retune_while_fading_is_noop() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        engine.stop().unwrap();
        assert!(engine.retune(ALPHA.scaled(2.0)).is_ok());
        assert_eq!(engine.state(), VoiceState::FadingOut);
    }

    #[test]
    fn test_double_stop_is_noop() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        engine.stop().unwrap();
        assert!(engine.stop().is_ok());
        assert_eq!(engine.state(), VoiceState::FadingOut);
    }

    // ------------------------------------------------------------------------
    // Single Voice Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_restart_leaves_one_voice() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        engine.start(ALPHA.scaled(2.0)).unwrap();
        engine.start(ALPHA.scaled(0.5)).unwrap();

        assert_eq!(engine.context().unwrap().graph().voice_count(), 1);
        assert_eq!(engine.current_pair(), Some(ALPHA.scaled(0.5)));
    }

    #[test]
    fn test_start_during_fade_supersedes_it() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).advance(1.0);
        engine.stop().unwrap();
        context(&mut engine).advance(0.1);

        engine.start(ALPHA).unwrap();
        assert_eq!(engine.state(), VoiceState::Active);
        assert_eq!(engine.context().unwrap().graph().voice_count(), 1);

        // The old stop time passes without affecting the new voice
        context(&mut engine).advance(1.0);
        assert_eq!(engine.state(), VoiceState::Active);
        assert_eq!(engine.context().unwrap().graph().voice_count(), 1);
    }

    #[test]
    fn test_restart_while_active_reuses_voice() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).advance(1.5);

        let target = ALPHA.scaled(2.0);
        engine.start(target).unwrap();
        let now = context(&mut engine).current_time();
        let graph = engine.context().unwrap().graph();
        assert_eq!(graph.voice_count(), 1);

        // Same node, gain held at full level, tones gliding to the new pair
        let voice = graph.voice(1).unwrap();
        assert!((voice.param(ParamTarget::Gain).value_at(now) - 0.15).abs() < 1e-12);
        let left = voice.param(ParamTarget::LeftFrequency);
        assert!((left.value_at(now) - ALPHA.left()).abs() < 1e-9);
        assert!((left.value_at(now + 0.05) - target.left()).abs() < 1e-9);
        assert_eq!(engine.current_pair(), Some(target));
    }

    #[test]
    fn test_restart_during_fade_cancels_stop() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).advance(1.0);
        engine.stop().unwrap();
        context(&mut engine).advance(0.2);

        engine.start(ALPHA).unwrap();
        let now = context(&mut engine).current_time();
        let voice = engine.context().unwrap().graph().voice(1).unwrap();
        assert_eq!(voice.left.stop_time(), None);
        assert_eq!(voice.right.stop_time(), None);

        // Gain climbs back from the faded level rather than jumping
        let gain = voice.param(ParamTarget::Gain);
        let held = gain.value_at(now);
        assert!(held > 0.0 && held < 0.15);
        assert!(gain.value_at(now + 0.5) > held);
        assert!((gain.value_at(now + 1.0) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_start_after_release_builds_new_voice() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        engine.stop().unwrap();
        context(&mut engine).advance(0.6);
        assert_eq!(engine.context().unwrap().graph().voice_count(), 0);

        engine.start(ALPHA).unwrap();
        let graph = engine.context().unwrap().graph();
        assert!(graph.is_connected(2));
        assert_eq!(graph.voice_count(), 1);
    }

    // ------------------------------------------------------------------------
    // Scheduling Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_retune_glides_frequencies() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        context(&mut engine).advance(0.1);

        let target = ALPHA.scaled(2.0);
        engine.retune(target).unwrap();
        assert_eq!(engine.current_pair(), Some(target));

        let context = context(&mut engine);
        let now = context.current_time();
        let voice = context.graph().voice(1).unwrap();
        let left = voice.param(ParamTarget::LeftFrequency);
        let right = voice.param(ParamTarget::RightFrequency);

        assert!((left.value_at(now) - ALPHA.left()).abs() < 1e-9);
        let halfway = left.value_at(now + 0.025);
        assert!((halfway - (ALPHA.left() + target.left()) / 2.0).abs() < 1e-6);
        assert!((left.value_at(now + 0.05) - target.left()).abs() < 1e-9);
        assert!((right.value_at(now + 0.05) - target.right()).abs() < 1e-9);
    }

    #[test]
    fn test_fade_in_is_linear() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        let gain = engine
            .context()
            .unwrap()
            .graph()
            .voice(1)
            .unwrap()
            .param(ParamTarget::Gain)
            .clone();
        assert_eq!(gain.value_at(0.0), 0.0);
        assert!((gain.value_at(0.5) - 0.075).abs() < 1e-12);
        assert!((gain.value_at(1.0) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_start_fails_when_audio_unavailable() {
        let mut engine = VoiceEngine::new(
            OfflineBackend::unavailable("blocked by host policy"),
            EngineConfig::default(),
        );
        let err = engine.start(ALPHA).unwrap_err();
        assert_eq!(err.error_code(), "AUDIO_UNAVAILABLE");
        assert_eq!(engine.state(), VoiceState::Idle);
    }

    #[test]
    fn test_lost_voice_forces_idle() {
        let mut engine = engine();
        engine.start(ALPHA).unwrap();
        // Something outside the engine dropped the voice
        context(&mut engine)
            .with_graph(|graph| graph.disconnect(1))
            .unwrap();

        let err = engine.retune(ALPHA.scaled(2.0)).unwrap_err();
        assert_eq!(err.error_code(), "VOICE_NOT_FOUND");
        assert_eq!(engine.state(), VoiceState::Idle);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(VoiceState::Idle.to_string(), "Idle");
        assert_eq!(VoiceState::Active.to_string(), "Active");
        assert_eq!(VoiceState::FadingOut.to_string(), "FadingOut");
    }
}
