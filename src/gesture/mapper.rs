//! Rotation to octave mapping
//!
//! The accumulated dial rotation drives a sine wave whose output is stretched
//! over the configured octave range. Turning the dial keeps sweeping
//! low -> high -> low forever without ever leaving the range or jumping.

use std::f64::consts::PI;

use crate::config::TuningConfig;
use crate::frequency::FrequencyPair;

/// Closed range of octave offsets the dial can reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveRange {
    pub min: f64,
    pub max: f64,
}

impl OctaveRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Centre of the range; the offset at zero rotation
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Width of the range in octaves
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.min && offset <= self.max
    }
}

impl Default for OctaveRange {
    fn default() -> Self {
        let tuning = TuningConfig::default();
        Self::new(tuning.min_octave_offset, tuning.max_octave_offset)
    }
}

/// Converts accumulated rotation into an octave offset and a retuned pair
///
/// # Example
/// ```
/// use binaural::{FrequencyPair, GestureMapper};
///
/// let mapper = GestureMapper::default();
/// let alpha = FrequencyPair::new(126.22, 10.0);
///
/// // One full cycle (4 turns by default) lands back on the baseline
/// let tuned = mapper.map(alpha, 1440.0);
/// assert!((tuned.base - alpha.base).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureMapper {
    range: OctaveRange,
    sensitivity: f64,
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::from_config(&TuningConfig::default())
    }
}

impl GestureMapper {
    /// Create a mapper
    ///
    /// # Arguments
    /// * `range` - Octave offsets reachable by the dial
    /// * `sensitivity` - Full 360 degree turns per low -> high -> low cycle
    pub fn new(range: OctaveRange, sensitivity: f64) -> Self {
        Self { range, sensitivity }
    }

    pub fn from_config(tuning: &TuningConfig) -> Self {
        Self::new(
            OctaveRange::new(tuning.min_octave_offset, tuning.max_octave_offset),
            tuning.rotation_sensitivity,
        )
    }

    pub fn range(&self) -> OctaveRange {
        self.range
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Octave offset for a total rotation in degrees
    pub fn octave_offset(&self, accumulated_deg: f64) -> f64 {
        let cycle_radians = (accumulated_deg / (360.0 * self.sensitivity)) * 2.0 * PI;
        let offset = self.range.midpoint() + cycle_radians.sin() * (self.range.span() / 2.0);
        // sin() may overshoot by an ulp
        offset.clamp(self.range.min, self.range.max)
    }

    /// Frequency multiplier for a total rotation (`2^offset`)
    pub fn multiplier(&self, accumulated_deg: f64) -> f64 {
        self.octave_offset(accumulated_deg).exp2()
    }

    /// Retune `baseline` by the offset implied by `accumulated_deg`
    pub fn map(&self, baseline: FrequencyPair, accumulated_deg: f64) -> FrequencyPair {
        baseline.scaled(self.multiplier(accumulated_deg))
    }
}
