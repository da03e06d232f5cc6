//! Render Graph
//!
//! The sample-level side of the engine. Each voice is two sine oscillators,
//! each routed through a fixed stereo pan, summed into one master gain:
//!
//! ```text
//! left osc  -> pan(-1) --\
//!                          +--> gain --> output
//! right osc -> pan(+1) --/
//! ```
//!
//! The graph advances its own sample clock as it renders; that clock is the
//! context time all automation is scheduled against.

use std::f64::consts::PI;

use crate::engine::param::AudioParam;
use crate::error::{BinauralError, Result};
use crate::frequency::FrequencyPair;

/// Pan position of the left oscillator route
pub const PAN_LEFT: f64 = -1.0;

/// Pan position of the right oscillator route
pub const PAN_RIGHT: f64 = 1.0;

/// Handle to a voice connected to the graph
pub type VoiceId = u64;

/// Which parameter of a voice to automate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTarget {
    LeftFrequency,
    RightFrequency,
    Gain,
}

// ============================================================================
// Nodes
// ============================================================================

/// Phase-accumulating sine oscillator with an automated frequency
#[derive(Debug, Clone)]
pub struct SineOscillator {
    /// Current phase (0.0 to 1.0)
    phase: f64,
    pub frequency: AudioParam,
    /// Time after which the oscillator outputs silence
    stop_time: Option<f64>,
}

impl SineOscillator {
    pub fn new(frequency: f64) -> Self {
        Self {
            phase: 0.0,
            frequency: AudioParam::new(frequency),
            stop_time: None,
        }
    }

    /// Schedule the oscillator to fall silent at `time`
    pub fn stop(&mut self, time: f64) {
        self.stop_time = Some(time);
    }

    /// Drop a pending stop so the oscillator keeps running
    pub fn cancel_stop(&mut self) {
        self.stop_time = None;
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    fn is_stopped_at(&self, time: f64) -> bool {
        matches!(self.stop_time, Some(stop) if time >= stop)
    }

    fn next_sample(&mut self, time: f64, sample_rate: f64) -> f64 {
        if self.is_stopped_at(time) {
            return 0.0;
        }
        let sample = (self.phase * 2.0 * PI).sin();
        self.phase += self.frequency.value_at(time) / sample_rate;
        self.phase -= self.phase.floor();
        sample
    }
}

/// Equal-power stereo panner for a mono input
///
/// Returns `(left_gain, right_gain)`; -1 is hard left, +1 hard right.
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) / 2.0;
    ((x * PI / 2.0).cos(), (x * PI / 2.0).sin())
}

/// One connected binaural voice
#[derive(Debug, Clone)]
pub struct VoiceNode {
    id: VoiceId,
    pub left: SineOscillator,
    pub right: SineOscillator,
    left_pan: (f64, f64),
    right_pan: (f64, f64),
    pub gain: AudioParam,
}

impl VoiceNode {
    fn new(id: VoiceId, pair: FrequencyPair) -> Self {
        Self {
            id,
            left: SineOscillator::new(pair.left()),
            right: SineOscillator::new(pair.right()),
            left_pan: pan_gains(PAN_LEFT),
            right_pan: pan_gains(PAN_RIGHT),
            gain: AudioParam::new(0.0),
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn param_mut(&mut self, target: ParamTarget) -> &mut AudioParam {
        match target {
            ParamTarget::LeftFrequency => &mut self.left.frequency,
            ParamTarget::RightFrequency => &mut self.right.frequency,
            ParamTarget::Gain => &mut self.gain,
        }
    }

    pub fn param(&self, target: ParamTarget) -> &AudioParam {
        match target {
            ParamTarget::LeftFrequency => &self.left.frequency,
            ParamTarget::RightFrequency => &self.right.frequency,
            ParamTarget::Gain => &self.gain,
        }
    }

    /// Both oscillators have passed their scheduled stop
    fn is_finished(&self, time: f64) -> bool {
        self.left.is_stopped_at(time) && self.right.is_stopped_at(time)
    }

    fn render_frame(&mut self, time: f64, sample_rate: f64) -> (f64, f64) {
        let l = self.left.next_sample(time, sample_rate);
        let r = self.right.next_sample(time, sample_rate);
        let gain = self.gain.value_at(time);
        (
            (l * self.left_pan.0 + r * self.right_pan.0) * gain,
            (l * self.left_pan.1 + r * self.right_pan.1) * gain,
        )
    }

    fn compact(&mut self, time: f64) {
        self.left.frequency.compact(time);
        self.right.frequency.compact(time);
        self.gain.compact(time);
    }
}

// ============================================================================
// RenderGraph
// ============================================================================

/// Frames rendered between timeline compactions
const COMPACT_INTERVAL: u64 = 1024;

/// All voices connected to an output, plus the sample clock
#[derive(Debug, Clone)]
pub struct RenderGraph {
    sample_rate: u32,
    frames_rendered: u64,
    voices: Vec<VoiceNode>,
    next_id: VoiceId,
}

impl RenderGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames_rendered: 0,
            voices: Vec::new(),
            next_id: 1,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Context time in seconds: frames rendered so far / sample rate
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    /// Number of voices still connected (including ones fading out)
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Connect a new voice with silent gain; returns its handle
    pub fn connect_voice(&mut self, pair: FrequencyPair) -> VoiceId {
        let id = self.next_id;
        self.next_id += 1;
        self.voices.push(VoiceNode::new(id, pair));
        id
    }

    /// Remove a voice from the output immediately
    ///
    /// Returns false if the voice was already gone (e.g. its stop fired).
    pub fn disconnect(&mut self, id: VoiceId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != id);
        self.voices.len() != before
    }

    pub fn is_connected(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|v| v.id == id)
    }

    pub fn voice(&self, id: VoiceId) -> Result<&VoiceNode> {
        self.voices
            .iter()
            .find(|v| v.id == id)
            .ok_or(BinauralError::VoiceNotFound { id })
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Result<&mut VoiceNode> {
        self.voices
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(BinauralError::VoiceNotFound { id })
    }

    /// Render interleaved frames into `out`
    ///
    /// Stereo goes to the first two channels of each frame; further channels
    /// get the mid signal and a mono output gets the sum.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let sample_rate = self.sample_rate as f64;

        for frame in out.chunks_mut(channels) {
            let time = self.current_time();
            let (mut left, mut right) = (0.0, 0.0);
            for voice in &mut self.voices {
                let (l, r) = voice.render_frame(time, sample_rate);
                left += l;
                right += r;
            }

            match frame.len() {
                1 => frame[0] = (left + right) as f32,
                _ => {
                    frame[0] = left as f32;
                    frame[1] = right as f32;
                    for extra in frame.iter_mut().skip(2) {
                        *extra = ((left + right) / 2.0) as f32;
                    }
                }
            }

            self.frames_rendered += 1;
            if self.frames_rendered % COMPACT_INTERVAL == 0 {
                self.collect_finished();
            }
        }
        self.collect_finished();
    }

    /// Render `frames` stereo frames into a fresh buffer
    pub fn render_stereo(&mut self, frames: usize) -> Vec<[f32; 2]> {
        let mut interleaved = vec![0.0_f32; frames * 2];
        self.render(&mut interleaved, 2);
        interleaved
            .chunks_exact(2)
            .map(|frame| [frame[0], frame[1]])
            .collect()
    }

    /// Drop voices whose oscillators have stopped and shorten timelines
    fn collect_finished(&mut self) {
        let time = self.current_time();
        self.voices.retain(|v| !v.is_finished(time));
        for voice in &mut self.voices {
            voice.compact(time);
        }
    }
}
