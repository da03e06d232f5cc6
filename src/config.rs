//! Configuration
//!
//! Envelope timings for the voice engine and the bounds of the tuning
//! gesture. Every field has a default, so a config file only needs to name
//! what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BinauralError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Linear fade-in on start (seconds)
pub const DEFAULT_ATTACK_SECS: f64 = 1.0;

/// Exponential fade-out on stop (seconds)
pub const DEFAULT_RELEASE_SECS: f64 = 0.5;

/// Frequency glide on retune (seconds)
pub const DEFAULT_RETUNE_SECS: f64 = 0.05;

/// Master gain once the fade-in completes
pub const DEFAULT_TARGET_GAIN: f64 = 0.15;

/// Gain the fade-out approaches; exponential ramps cannot reach zero
pub const DEFAULT_SILENCE_FLOOR: f64 = 0.0001;

/// Sample rate used when no device dictates one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Lowest octave offset reachable by the dial
pub const DEFAULT_MIN_OCTAVE_OFFSET: f64 = -2.0;

/// Highest octave offset reachable by the dial
pub const DEFAULT_MAX_OCTAVE_OFFSET: f64 = 2.0;

/// Full turns of the dial per low -> high -> low cycle
pub const DEFAULT_ROTATION_SENSITIVITY: f64 = 4.0;

// ============================================================================
// Engine Configuration
// ============================================================================

/// Envelope and output settings for `VoiceEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fade-in duration in seconds
    pub attack_secs: f64,
    /// Fade-out duration in seconds
    pub release_secs: f64,
    /// Retune glide duration in seconds
    pub retune_secs: f64,
    /// Master gain after fade-in (linear)
    pub target_gain: f64,
    /// Fade-out target gain (linear, > 0)
    pub silence_floor: f64,
    /// Sample rate for `OfflineBackend::from_config` (devices use their own)
    pub sample_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attack_secs: DEFAULT_ATTACK_SECS,
            release_secs: DEFAULT_RELEASE_SECS,
            retune_secs: DEFAULT_RETUNE_SECS,
            target_gain: DEFAULT_TARGET_GAIN,
            silence_floor: DEFAULT_SILENCE_FLOOR,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl EngineConfig {
    /// Validate envelope settings
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("attack_secs", self.attack_secs),
            ("release_secs", self.release_secs),
            ("retune_secs", self.retune_secs),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BinauralError::invalid_config(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }
        if !(self.target_gain.is_finite() && self.target_gain > 0.0) {
            return Err(BinauralError::invalid_config(format!(
                "target_gain must be positive, got {}",
                self.target_gain
            )));
        }
        if !(self.silence_floor > 0.0 && self.silence_floor < self.target_gain) {
            return Err(BinauralError::invalid_config(format!(
                "silence_floor must lie in (0, {}), got {}",
                self.target_gain, self.silence_floor
            )));
        }
        if self.sample_rate == 0 {
            return Err(BinauralError::invalid_config("sample_rate must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Tuning Configuration
// ============================================================================

/// Bounds and sensitivity of the rotary tuning gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Lowest octave offset
    pub min_octave_offset: f64,
    /// Highest octave offset
    pub max_octave_offset: f64,
    /// Full 360 degree turns per complete cycle
    pub rotation_sensitivity: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            min_octave_offset: DEFAULT_MIN_OCTAVE_OFFSET,
            max_octave_offset: DEFAULT_MAX_OCTAVE_OFFSET,
            rotation_sensitivity: DEFAULT_ROTATION_SENSITIVITY,
        }
    }
}

impl TuningConfig {
    /// Validate gesture bounds
    pub fn validate(&self) -> Result<()> {
        if !(self.min_octave_offset.is_finite() && self.max_octave_offset.is_finite()) {
            return Err(BinauralError::invalid_config("octave offsets must be finite"));
        }
        if self.min_octave_offset >= self.max_octave_offset {
            return Err(BinauralError::invalid_config(format!(
                "min_octave_offset ({}) must be below max_octave_offset ({})",
                self.min_octave_offset, self.max_octave_offset
            )));
        }
        if !(self.rotation_sensitivity.is_finite() && self.rotation_sensitivity > 0.0) {
            return Err(BinauralError::invalid_config(format!(
                "rotation_sensitivity must be positive, got {}",
                self.rotation_sensitivity
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub tuning: TuningConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    ///
    /// # Errors
    /// * `Io` - the file cannot be read
    /// * `Serialization` - the file is not valid JSON for `Config`
    /// * `InvalidConfig` - a value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.tuning.validate()
    }
}
