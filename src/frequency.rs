//! Frequency pair shared by the gesture mapper and the voice engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// A binaural tone pair
///
/// `base` is played on the left channel, `base + beat` on the right. The
/// perceived beat is the difference between the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPair {
    /// Left-channel tone in Hz
    pub base: f64,
    /// Offset of the right-channel tone in Hz
    pub beat: f64,
}

impl FrequencyPair {
    /// Create a new pair
    ///
    /// # Example
    /// ```
    /// use binaural::FrequencyPair;
    /// let pair = FrequencyPair::new(126.22, 10.0);
    /// assert_eq!(pair.right(), 136.22);
    /// ```
    pub fn new(base: f64, beat: f64) -> Self {
        Self { base, beat }
    }

    /// Frequency of the left oscillator
    pub fn left(&self) -> f64 {
        self.base
    }

    /// Frequency of the right oscillator
    pub fn right(&self) -> f64 {
        self.base + self.beat
    }

    /// Scale both tones by the same factor
    ///
    /// The `beat / base` ratio is unchanged, so the binaural effect carries
    /// across octaves.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            base: self.base * multiplier,
            beat: self.beat * multiplier,
        }
    }

    /// Both values positive and finite
    pub fn is_valid(&self) -> bool {
        self.base.is_finite() && self.beat.is_finite() && self.base > 0.0 && self.beat > 0.0
    }
}

impl fmt::Display for FrequencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz / {:.2} Hz beat", self.base, self.beat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        let pair = FrequencyPair::new(132.0, 18.0);
        assert_eq!(pair.left(), 132.0);
        assert_eq!(pair.right(), 150.0);
    }

    #[test]
    fn test_scaled_preserves_ratio() {
        let pair = FrequencyPair::new(144.72, 35.0);
        let scaled = pair.scaled(0.25);
        assert!((scaled.beat / scaled.base - pair.beat / pair.base).abs() < 1e-12);
        assert!(scaled.is_valid());
    }

    #[test]
    fn test_is_valid() {
        assert!(FrequencyPair::new(100.0, 5.0).is_valid());
        assert!(!FrequencyPair::new(0.0, 5.0).is_valid());
        assert!(!FrequencyPair::new(100.0, f64::NAN).is_valid());
        assert!(!FrequencyPair::new(f64::INFINITY, 5.0).is_valid());
    }

    #[test]
    fn test_display() {
        let pair = FrequencyPair::new(126.22, 10.0);
        assert_eq!(pair.to_string(), "126.22 Hz / 10.00 Hz beat");
    }
}
