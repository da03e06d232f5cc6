//! Integration Tests
//!
//! End-to-end tests for the voice engine, rendered through the offline
//! backend so every sample can be inspected.

use binaural::engine::{AudioContext, OfflineBackend, OfflineContext, VoiceEngine, VoiceState};
use binaural::{EngineConfig, FrequencyPair, GestureMapper};

const SAMPLE_RATE: u32 = 48000;

const ALPHA: FrequencyPair = FrequencyPair {
    base: 126.22,
    beat: 10.0,
};

fn engine() -> VoiceEngine<OfflineBackend> {
    VoiceEngine::new(OfflineBackend::new(SAMPLE_RATE), EngineConfig::default())
}

fn context(engine: &mut VoiceEngine<OfflineBackend>) -> &mut OfflineContext {
    engine.context_mut().expect("context created on start")
}

/// Largest absolute sample on one channel
fn peak(frames: &[[f32; 2]], channel: usize) -> f32 {
    frames.iter().map(|f| f[channel].abs()).fold(0.0, f32::max)
}

/// Largest jump between consecutive samples on either channel
fn max_step(frames: &[[f32; 2]]) -> f32 {
    frames
        .windows(2)
        .flat_map(|w| [(w[1][0] - w[0][0]).abs(), (w[1][1] - w[0][1]).abs()])
        .fold(0.0, f32::max)
}

/// Frequency estimate from sign changes over the buffer
fn estimate_frequency(frames: &[[f32; 2]], channel: usize) -> f64 {
    let crossings = frames
        .windows(2)
        .filter(|w| (w[0][channel] < 0.0) != (w[1][channel] < 0.0))
        .count();
    let secs = frames.len() as f64 / SAMPLE_RATE as f64;
    crossings as f64 / 2.0 / secs
}

// ----------------------------------------------------------------------------
// Routing
// ----------------------------------------------------------------------------

#[test]
fn test_each_ear_hears_its_own_tone() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(1.0);

    let frames = context(&mut engine).advance(1.0);
    assert!((estimate_frequency(&frames, 0) - ALPHA.left()).abs() < 1.0);
    assert!((estimate_frequency(&frames, 1) - ALPHA.right()).abs() < 1.0);

    // Full gain on both channels, nothing more
    assert!((peak(&frames, 0) - 0.15).abs() < 1e-3);
    assert!((peak(&frames, 1) - 0.15).abs() < 1e-3);
}

#[test]
fn test_start_resumes_rendering() {
    let mut engine = engine();
    assert!(engine.context().is_none());
    engine.start(ALPHA).unwrap();
    let frames = context(&mut engine).render(128);
    assert_eq!(frames.len(), 128);
}

// ----------------------------------------------------------------------------
// Envelope
// ----------------------------------------------------------------------------

#[test]
fn test_fade_in_starts_silent() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();

    let frames = context(&mut engine).advance(1.0);
    let first = &frames[..480];
    assert!(peak(first, 0) < 0.002, "first 10 ms too loud");

    // Window peaks grow across the attack
    let windows: Vec<f32> = frames.chunks(4800).map(|w| peak(w, 0)).collect();
    for pair in windows.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    assert!(*windows.last().unwrap() > 0.13);
}

#[test]
fn test_fade_out_reaches_silence_and_releases() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(1.5);

    engine.stop().unwrap();
    assert_eq!(engine.state(), VoiceState::FadingOut);

    let fade = context(&mut engine).advance(0.5);
    let windows: Vec<f32> = fade.chunks(2400).map(|w| peak(w, 0)).collect();
    for pair in windows.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
    assert!(peak(&fade[fade.len() - 480..], 0) < 0.001);
    assert!(max_step(&fade) < 0.01);

    let after = context(&mut engine).advance(0.1);
    assert_eq!(peak(&after, 0), 0.0);
    assert_eq!(peak(&after, 1), 0.0);
    assert_eq!(engine.state(), VoiceState::Idle);
    assert_eq!(engine.context().unwrap().graph().voice_count(), 0);
}

#[test]
fn test_stop_during_attack_fades_from_current_level() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(0.2);

    engine.stop().unwrap();
    let fade = context(&mut engine).advance(0.5);
    // Never louder than where the attack was cut off
    assert!(peak(&fade, 0) <= 0.15 * 0.2 + 1e-3);
    assert!(max_step(&fade) < 0.01);
}

// ----------------------------------------------------------------------------
// Retuning
// ----------------------------------------------------------------------------

#[test]
fn test_retune_is_click_free() {
    let mut engine = engine();
    let mapper = GestureMapper::default();
    engine.start(ALPHA).unwrap();
    let mut frames = context(&mut engine).advance(1.0);

    // A fast drag: one pointer sample every 10 ms
    for step in 1..=72 {
        engine.retune(mapper.map(ALPHA, step as f64 * 10.0)).unwrap();
        frames.extend(context(&mut engine).advance(0.01));
    }
    frames.extend(context(&mut engine).advance(0.2));

    // The highest tone (~545 Hz at 0.15) moves at most ~0.011 per sample
    assert!(max_step(&frames) < 0.015);
}

#[test]
fn test_retune_lands_on_target() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(1.0);

    let target = ALPHA.scaled(2.0);
    engine.retune(target).unwrap();
    context(&mut engine).advance(0.1);

    let frames = context(&mut engine).advance(1.0);
    assert!((estimate_frequency(&frames, 0) - target.left()).abs() < 1.0);
    assert!((estimate_frequency(&frames, 1) - target.right()).abs() < 1.0);
}

// ----------------------------------------------------------------------------
// Single Voice
// ----------------------------------------------------------------------------

#[test]
fn test_rapid_restarts_never_stack_voices() {
    let mut engine = engine();
    for i in 0..20 {
        engine.start(ALPHA.scaled(1.0 + i as f64 * 0.05)).unwrap();
        context(&mut engine).advance(0.01);
        if i % 3 == 0 {
            engine.stop().unwrap();
            context(&mut engine).advance(0.01);
        }
        assert!(engine.context().unwrap().graph().voice_count() <= 1);
    }

    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(1.0);
    let frames = context(&mut engine).advance(0.5);
    // One voice at full gain, not a sum of several
    assert!(peak(&frames, 0) <= 0.15 + 1e-3);
}

#[test]
fn test_restart_while_active_is_click_free() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    let mut frames = context(&mut engine).advance(1.5);

    engine.start(ALPHA.scaled(2.0)).unwrap();
    frames.extend(context(&mut engine).advance(0.5));

    assert_eq!(engine.context().unwrap().graph().voice_count(), 1);
    assert!(max_step(&frames) < 0.015);
    // Still at full level right after the restart
    assert!(peak(&frames[72000..72480], 0) > 0.1);
}

#[test]
fn test_restart_during_fade_is_click_free() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    let mut frames = context(&mut engine).advance(1.5);

    engine.stop().unwrap();
    frames.extend(context(&mut engine).advance(0.1));
    engine.start(ALPHA.scaled(0.5)).unwrap();
    frames.extend(context(&mut engine).advance(1.5));

    assert_eq!(engine.state(), VoiceState::Active);
    assert!(max_step(&frames) < 0.015);
    let tail = &frames[frames.len() - 4800..];
    assert!((peak(tail, 0) - 0.15).abs() < 2e-3);
}

#[test]
fn test_restart_after_full_release() {
    let mut engine = engine();
    engine.start(ALPHA).unwrap();
    context(&mut engine).advance(1.0);
    engine.stop().unwrap();
    context(&mut engine).advance(1.0);
    assert_eq!(engine.state(), VoiceState::Idle);

    engine.start(ALPHA).unwrap();
    assert_eq!(engine.state(), VoiceState::Active);
    assert_eq!(engine.backend().opened(), 1);
    assert!(engine.context().unwrap().current_time() > 1.9);
}
