//! Presets and inspiration words
//!
//! Each preset sits near 130-145 Hz with a beat in one brainwave band.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::frequency::FrequencyPair;

/// A named starting point for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub base: f64,
    pub beat: f64,
    pub description: &'static str,
}

impl Preset {
    pub fn pair(&self) -> FrequencyPair {
        FrequencyPair::new(self.base, self.beat)
    }
}

/// Brainwave presets, slowest beat first
pub const PRESETS: [Preset; 5] = [
    Preset {
        name: "Delta",
        base: 136.1,
        beat: 3.0,
        description: "Deep Sleep & Restoration",
    },
    Preset {
        name: "Theta",
        base: 140.25,
        beat: 6.0,
        description: "Meditation & Intuition",
    },
    Preset {
        name: "Alpha",
        base: 126.22,
        beat: 10.0,
        description: "Relaxed Focus & Calm",
    },
    Preset {
        name: "Beta",
        base: 132.0,
        beat: 18.0,
        description: "Alertness & Concentration",
    },
    Preset {
        name: "Gamma",
        base: 144.72,
        beat: 35.0,
        description: "Peak Awareness & Insight",
    },
];

/// Words shown when a track is created or retuned
pub const INSPIRATION_WORDS: [&str; 40] = [
    "Stillness", "Flow", "Source", "Unfold", "Listen", "Breathe", "Resonance", "Echo", "Bloom",
    "Drift", "Calm", "Deep", "Quiet", "Aware", "Present", "Open", "Release", "Emerge", "Reflect",
    "Wander", "Center", "Ground", "Peace", "Clarity", "Expand", "Surrender", "Balance", "Harmony",
    "Ripple", "Linger", "Gentle", "Vast", "Infinite", "Serene", "Luminous", "Silence", "Grace",
    "Abide", "Witness", "Space",
];

/// Look up a preset by name, ignoring case
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Supplies starting pairs and inspiration text to a session
pub trait PresetSource {
    /// Pair for a new session
    fn next_pair(&mut self) -> FrequencyPair;

    /// A short word to display with the current track
    fn inspiration(&mut self) -> String;
}

/// Uniformly random presets and words
#[derive(Debug, Default)]
pub struct RandomPresets<R: Rng> {
    rng: R,
}

impl RandomPresets<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl<R: Rng> RandomPresets<R> {
    /// Use a specific generator (seeded for reproducible demos)
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> PresetSource for RandomPresets<R> {
    fn next_pair(&mut self) -> FrequencyPair {
        let index = self.rng.gen_range(0..PRESETS.len());
        PRESETS[index].pair()
    }

    fn inspiration(&mut self) -> String {
        INSPIRATION_WORDS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Listen")
            .to_string()
    }
}

/// Walks the preset and word lists in order, wrapping around
#[derive(Debug, Clone, Default)]
pub struct CyclingPresets {
    preset_index: usize,
    word_index: usize,
}

impl CyclingPresets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a named preset; unknown names start at the first one
    pub fn starting_at(name: &str) -> Self {
        let preset_index = PRESETS
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .unwrap_or(0);
        Self {
            preset_index,
            word_index: 0,
        }
    }
}

impl PresetSource for CyclingPresets {
    fn next_pair(&mut self) -> FrequencyPair {
        let pair = PRESETS[self.preset_index % PRESETS.len()].pair();
        self.preset_index += 1;
        pair
    }

    fn inspiration(&mut self) -> String {
        let word = INSPIRATION_WORDS[self.word_index % INSPIRATION_WORDS.len()];
        self.word_index += 1;
        word.to_string()
    }
}
