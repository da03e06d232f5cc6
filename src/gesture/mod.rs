//! Gesture Module
//!
//! Turns a circular drag on the dial into a retuned frequency pair:
//! - Pointer angle tracking and wrap-free accumulation
//! - Rotation to octave-offset mapping

pub mod mapper;
pub mod tracker;

pub use mapper::{GestureMapper, OctaveRange};
pub use tracker::{pointer_angle, unwrap_delta, GestureState, Point};
