//! Listening Session
//!
//! Glue between the display layer and the two core components: it turns
//! play toggles and pointer events into engine calls, and keeps the resting
//! track that drags start from.

use serde::Serialize;

use crate::config::Config;
use crate::engine::{AudioBackend, VoiceEngine};
use crate::error::Result;
use crate::frequency::FrequencyPair;
use crate::gesture::{GestureMapper, GestureState};
use crate::presets::PresetSource;

/// The resting state between drags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub pair: FrequencyPair,
    pub inspiration: String,
}

/// What the display layer needs to draw the dial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub playing: bool,
    pub dragging: bool,
    /// Offset implied by the current drag; the range midpoint otherwise
    pub octave_offset: f64,
    /// Pointer angle for the handle indicator while dragging
    pub handle_angle: Option<f64>,
    pub track: Track,
}

/// One user's session with the dial
pub struct Session<B: AudioBackend, P: PresetSource> {
    engine: VoiceEngine<B>,
    presets: P,
    mapper: GestureMapper,
    track: Track,
    playing: bool,
    gesture: Option<GestureState>,
}

impl<B: AudioBackend, P: PresetSource> Session<B, P> {
    /// Create a session; the first track comes from `presets`
    pub fn new(backend: B, mut presets: P, config: &Config) -> Self {
        let track = Track {
            pair: presets.next_pair(),
            inspiration: presets.inspiration(),
        };
        tracing::info!(pair = %track.pair, inspiration = %track.inspiration, "session ready");
        Self {
            engine: VoiceEngine::new(backend, config.engine.clone()),
            presets,
            mapper: GestureMapper::from_config(&config.tuning),
            track,
            playing: false,
            gesture: None,
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Start or stop the current track; returns whether it is now playing
    ///
    /// A failed start leaves the session paused.
    pub fn toggle_play(&mut self) -> Result<bool> {
        if self.playing {
            self.gesture = None;
            self.playing = false;
            self.engine.stop()?;
        } else {
            self.engine.start(self.track.pair)?;
            self.playing = true;
        }
        Ok(self.playing)
    }

    // ========================================================================
    // Dragging
    // ========================================================================

    /// Begin tuning at pointer angle `angle_deg`
    ///
    /// Only possible while playing; returns whether a drag started.
    pub fn begin_drag(&mut self, angle_deg: f64) -> bool {
        if !self.playing {
            return false;
        }
        self.gesture = Some(GestureState::begin(angle_deg, self.track.pair));
        tracing::debug!(angle = angle_deg, "drag started");
        true
    }

    /// Feed a pointer-move sample; retunes the voice
    ///
    /// Returns the new pair, or `None` when no drag is in progress. A failed
    /// retune loses the voice, so the session ends the drag and pauses.
    pub fn drag_to(&mut self, angle_deg: f64) -> Result<Option<FrequencyPair>> {
        let Some(gesture) = self.gesture.as_mut() else {
            return Ok(None);
        };
        let accumulated = gesture.update(angle_deg);
        let pair = self.mapper.map(gesture.baseline(), accumulated);
        if let Err(e) = self.engine.retune(pair) {
            self.halt();
            return Err(e);
        }
        Ok(Some(pair))
    }

    /// Finish the drag; the last mapped pair becomes the resting track
    ///
    /// Returns the new track, or `None` when no drag was in progress.
    pub fn end_drag(&mut self) -> Result<Option<Track>> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(None);
        };
        let pair = self.mapper.map(gesture.baseline(), gesture.accumulated_deg());
        if let Err(e) = self.engine.retune(pair) {
            self.halt();
            return Err(e);
        }

        self.track = Track {
            pair,
            inspiration: self.presets.inspiration(),
        };
        tracing::info!(
            pair = %pair,
            rotation = gesture.accumulated_deg(),
            "drag finished"
        );
        Ok(Some(self.track.clone()))
    }

    /// The engine dropped the voice; mirror that here
    fn halt(&mut self) {
        self.gesture = None;
        self.playing = false;
        tracing::warn!("voice lost; session paused");
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Instantaneous octave offset for visual feedback
    pub fn octave_offset(&self) -> f64 {
        match &self.gesture {
            Some(gesture) => self.mapper.octave_offset(gesture.accumulated_deg()),
            None => self.mapper.range().midpoint(),
        }
    }

    /// Current pointer angle while dragging
    pub fn handle_angle(&self) -> Option<f64> {
        self.gesture.as_ref().map(|g| g.angle_deg())
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn mapper(&self) -> &GestureMapper {
        &self.mapper
    }

    pub fn engine(&self) -> &VoiceEngine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut VoiceEngine<B> {
        &mut self.engine
    }

    /// Everything the display layer draws, in one value
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            playing: self.playing,
            dragging: self.is_dragging(),
            octave_offset: self.octave_offset(),
            handle_angle: self.handle_angle(),
            track: self.track.clone(),
        }
    }
}
