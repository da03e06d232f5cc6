//! Parameter Automation
//!
//! An `AudioParam` holds a value that changes over time according to a
//! timeline of scheduled events: immediate sets, linear ramps and
//! exponential ramps. A ramp always starts from the value and time of the
//! event before it. Values are queried by absolute context time (seconds).

use crate::error::{BinauralError, Result};

// ============================================================================
// Events
// ============================================================================

/// One scheduled change on a parameter timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `time`
    SetValue { value: f64, time: f64 },
    /// Interpolate linearly to `value`, arriving at `end_time`
    LinearRamp { value: f64, end_time: f64 },
    /// Interpolate geometrically to `value`, arriving at `end_time`
    ExponentialRamp { value: f64, end_time: f64 },
}

impl Automation {
    /// Time at which the event's value is reached
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. } => time,
            Automation::LinearRamp { end_time, .. } => end_time,
            Automation::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    /// Value held once the event completes
    pub fn value(&self) -> f64 {
        match *self {
            Automation::SetValue { value, .. } => value,
            Automation::LinearRamp { value, .. } => value,
            Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

// ============================================================================
// AudioParam
// ============================================================================

/// A time-automated parameter (frequency, gain, pan)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    /// Value and time every timeline event starts from
    anchor_value: f64,
    anchor_time: f64,
    /// Scheduled events, ordered by `Automation::time`
    events: Vec<Automation>,
}

impl AudioParam {
    /// Create a parameter holding `value` with an empty timeline
    pub fn new(value: f64) -> Self {
        Self {
            anchor_value: value,
            anchor_time: 0.0,
            events: Vec::new(),
        }
    }

    /// Number of events still on the timeline
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Schedule an immediate jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> Result<()> {
        check_finite(value, time)?;
        self.insert(Automation::SetValue { value, time });
        Ok(())
    }

    /// Schedule a linear ramp reaching `value` at `end_time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) -> Result<()> {
        check_finite(value, end_time)?;
        self.insert(Automation::LinearRamp { value, end_time });
        Ok(())
    }

    /// Schedule an exponential ramp reaching `value` at `end_time`
    ///
    /// # Errors
    /// * `Scheduling` - `value` is zero or negative; an exponential curve
    ///   can only approach zero
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) -> Result<()> {
        check_finite(value, end_time)?;
        if value <= 0.0 {
            return Err(BinauralError::scheduling(format!(
                "exponential ramp target must be positive, got {}",
                value
            )));
        }
        self.insert(Automation::ExponentialRamp { value, end_time });
        Ok(())
    }

    /// Drop every event at or after `time`, freezing the value held at `time`
    ///
    /// A ramp in flight is cut where it stands, so a new ramp scheduled
    /// afterwards starts from the current value rather than the old target.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> Result<()> {
        check_finite(0.0, time)?;
        let held = self.value_at(time);
        let keep = self.events.partition_point(|e| e.time() < time);
        self.events.truncate(keep);
        self.events.push(Automation::SetValue { value: held, time });
        Ok(())
    }

    /// Value of the parameter at `time`
    pub fn value_at(&self, time: f64) -> f64 {
        let mut prev_time = self.anchor_time;
        let mut prev_value = self.anchor_value;

        for event in &self.events {
            match *event {
                Automation::SetValue { value, time: at } => {
                    if at > time {
                        return prev_value;
                    }
                    prev_time = at;
                    prev_value = value;
                }
                Automation::LinearRamp { value, end_time } => {
                    if end_time > time {
                        return linear(prev_value, prev_time, value, end_time, time);
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
                Automation::ExponentialRamp { value, end_time } => {
                    if end_time > time {
                        return exponential(prev_value, prev_time, value, end_time, time);
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
            }
        }

        prev_value
    }

    /// Fold events that finished before `time` into the anchor
    ///
    /// Called by the renderer so long-running timelines stay short.
    pub fn compact(&mut self, time: f64) {
        let done = self.events.partition_point(|e| e.time() <= time);
        if done == 0 {
            return;
        }
        let last = self.events[done - 1];
        self.anchor_time = last.time();
        self.anchor_value = last.value();
        self.events.drain(..done);
    }

    fn insert(&mut self, event: Automation) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}

fn check_finite(value: f64, time: f64) -> Result<()> {
    if !value.is_finite() || !time.is_finite() {
        return Err(BinauralError::scheduling(format!(
            "non-finite automation event (value {}, time {})",
            value, time
        )));
    }
    Ok(())
}

fn linear(v0: f64, t0: f64, v1: f64, t1: f64, t: f64) -> f64 {
    if t <= t0 || t1 <= t0 {
        return v0;
    }
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

fn exponential(v0: f64, t0: f64, v1: f64, t1: f64, t: f64) -> f64 {
    // Undefined from zero or across a sign change: hold the start value
    if v0 <= 0.0 || t <= t0 || t1 <= t0 {
        return v0;
    }
    v0 * (v1 / v0).powf((t - t0) / (t1 - t0))
}
