//! CLI Module
//!
//! Command-line interface for the binaural beat generator.

pub mod commands;
pub mod dial;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Binaural - two-tone beat generator with an octave dial
#[derive(Parser, Debug)]
#[command(name = "binaural-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file (defaults apply when absent)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the brainwave presets
    #[command(name = "presets")]
    Presets,

    /// Print the pair a dial rotation maps to, as JSON
    #[command(name = "map")]
    Map {
        /// Preset supplying the baseline pair
        #[arg(short, long, default_value = "Alpha")]
        preset: String,

        /// Accumulated rotation in degrees
        #[arg(short, long, allow_hyphen_values = true)]
        angle: f64,
    },

    /// Play a preset on the default output device
    #[command(name = "play")]
    Play {
        /// Preset to play
        #[arg(short, long, default_value = "Alpha")]
        preset: String,

        /// Seconds to play before fading out
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,
    },

    /// Play a preset while turning the dial automatically
    #[command(name = "sweep")]
    Sweep {
        /// Preset supplying the baseline pair
        #[arg(short, long, default_value = "Alpha")]
        preset: String,

        /// Total rotation in degrees (negative turns counter-clockwise)
        #[arg(short, long, default_value_t = 1440.0, allow_hyphen_values = true)]
        degrees: f64,

        /// Duration of the sweep
        #[arg(short, long, default_value_t = 20.0)]
        seconds: f64,
    },

    /// Interactive terminal dial
    #[command(name = "dial")]
    Dial,
}
