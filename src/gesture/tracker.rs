//! Pointer angle tracking
//!
//! Raw pointer angles come from `atan2` and live in (-180, 180]. A drag can
//! turn the dial many times over, so consecutive samples are diffed and
//! unwrapped into an unbounded running total.

use crate::frequency::FrequencyPair;

/// A point in screen coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Angle of `pointer` around `center`, in degrees
///
/// 0 points right; positive angles turn clockwise on screen because the
/// y axis points down.
///
/// # Example
/// ```
/// use binaural::gesture::{pointer_angle, Point};
/// let center = Point::new(100.0, 100.0);
/// assert_eq!(pointer_angle(center, Point::new(200.0, 100.0)), 0.0);
/// assert!((pointer_angle(center, Point::new(100.0, 200.0)) - 90.0).abs() < 1e-9);
/// ```
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees()
}

/// Shortest signed rotation from `previous` to `current`, in degrees
///
/// Crossing the +/-180 seam is treated as a small step, never a near-full turn.
pub fn unwrap_delta(previous: f64, current: f64) -> f64 {
    let mut delta = current - previous;
    if delta > 180.0 {
        delta -= 360.0;
    }
    if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// State of one drag on the dial
///
/// Created on drag-start with the currently playing pair as baseline,
/// updated on every pointer move, and dropped on drag-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    last_angle_deg: f64,
    accumulated_deg: f64,
    baseline: FrequencyPair,
}

impl GestureState {
    /// Start a drag at `angle_deg`
    pub fn begin(angle_deg: f64, baseline: FrequencyPair) -> Self {
        Self {
            last_angle_deg: angle_deg,
            accumulated_deg: 0.0,
            baseline,
        }
    }

    /// Feed the next raw pointer angle; returns the new accumulated rotation
    pub fn update(&mut self, angle_deg: f64) -> f64 {
        self.accumulated_deg += unwrap_delta(self.last_angle_deg, angle_deg);
        self.last_angle_deg = angle_deg;
        self.accumulated_deg
    }

    /// Total rotation since the drag began, in degrees
    pub fn accumulated_deg(&self) -> f64 {
        self.accumulated_deg
    }

    /// Most recent raw pointer angle
    pub fn angle_deg(&self) -> f64 {
        self.last_angle_deg
    }

    /// The pair that was playing when the drag began
    pub fn baseline(&self) -> FrequencyPair {
        self.baseline
    }
}
