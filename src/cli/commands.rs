//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::engine::DeviceBackend;
use crate::error::{BinauralError, Result};
use crate::frequency::FrequencyPair;
use crate::gesture::GestureMapper;
use crate::presets::{find_preset, CyclingPresets, Preset, PRESETS};
use crate::session::Session;

/// Pointer samples per second during a sweep
const SWEEP_RATE_HZ: f64 = 50.0;

/// Result of `map`, printed as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapReport {
    pub preset: String,
    pub accumulated_deg: f64,
    pub octave_offset: f64,
    pub multiplier: f64,
    pub baseline: FrequencyPair,
    pub mapped: FrequencyPair,
    pub left_hz: f64,
    pub right_hz: f64,
}

/// Resolve a preset name or report the valid ones
pub fn lookup_preset(name: &str) -> Result<&'static Preset> {
    find_preset(name).ok_or_else(|| {
        let names: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
        BinauralError::invalid_config(format!(
            "unknown preset '{}' (expected one of: {})",
            name,
            names.join(", ")
        ))
    })
}

/// Print the preset table.
pub fn list_presets() -> Result<()> {
    println!("{:<8} {:>10} {:>8}  {}", "Name", "Base (Hz)", "Beat", "Description");
    println!("{:-<60}", "");
    for preset in PRESETS.iter() {
        println!(
            "{:<8} {:>10.2} {:>8.2}  {}",
            preset.name, preset.base, preset.beat, preset.description
        );
    }
    Ok(())
}

/// Compute what a given rotation does to a preset.
pub fn map_report(config: &Config, preset: &str, angle: f64) -> Result<MapReport> {
    let preset = lookup_preset(preset)?;
    let mapper = GestureMapper::from_config(&config.tuning);
    let baseline = preset.pair();
    let mapped = mapper.map(baseline, angle);

    Ok(MapReport {
        preset: preset.name.to_string(),
        accumulated_deg: angle,
        octave_offset: mapper.octave_offset(angle),
        multiplier: mapper.multiplier(angle),
        baseline,
        mapped,
        left_hz: mapped.left(),
        right_hz: mapped.right(),
    })
}

/// Print the mapped pair as JSON.
pub fn map(config: &Config, preset: &str, angle: f64) -> Result<()> {
    let report = map_report(config, preset, angle)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Play a preset for a while, then fade out.
pub fn play(config: &Config, preset: &str, seconds: f64) -> Result<()> {
    let preset = lookup_preset(preset)?;
    let mut session = device_session(config, preset);

    session.toggle_play()?;
    println!(
        "Playing {} ({}) - {} [{}]",
        preset.name,
        preset.description,
        session.track().pair,
        session.track().inspiration
    );

    thread::sleep(secs(seconds));
    session.toggle_play()?;
    wait_for_release(config);

    println!("Stopped.");
    Ok(())
}

/// Play a preset while rotating the dial by `degrees` over `seconds`.
pub fn sweep(config: &Config, preset: &str, degrees: f64, seconds: f64) -> Result<()> {
    let preset = lookup_preset(preset)?;
    let mut session = device_session(config, preset);

    session.toggle_play()?;
    // Let the fade-in finish before the dial moves
    thread::sleep(secs(config.engine.attack_secs));

    let steps = ((seconds * SWEEP_RATE_HZ).ceil() as usize).max(1);
    let interval = secs(seconds / steps as f64);
    let started = Instant::now();

    session.begin_drag(0.0);
    for step in 1..=steps {
        let accumulated = degrees * step as f64 / steps as f64;
        if let Some(pair) = session.drag_to(wrap_angle(accumulated))? {
            if step % SWEEP_RATE_HZ as usize == 0 || step == steps {
                info!(
                    rotation = accumulated,
                    offset = session.octave_offset(),
                    pair = %pair,
                    "sweep"
                );
            }
        }

        let due = interval * step as u32;
        if let Some(remaining) = due.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    if let Some(track) = session.end_drag()? {
        println!("Settled on {} [{}]", track.pair, track.inspiration);
    }

    session.toggle_play()?;
    wait_for_release(config);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn device_session(config: &Config, preset: &Preset) -> Session<DeviceBackend, CyclingPresets> {
    Session::new(
        DeviceBackend::new(),
        CyclingPresets::starting_at(preset.name),
        config,
    )
}

/// Fold an accumulated rotation into a raw pointer angle in (-180, 180]
pub fn wrap_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn secs(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds.max(0.0))
}

/// The context keeps rendering only while the process lives
fn wait_for_release(config: &Config) {
    thread::sleep(secs(config.engine.release_secs + 0.1));
}
