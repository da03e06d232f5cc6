//! Error handling for Binaural
//!
//! Retuning or stopping while Idle is a no-op, not an error (see
//! `VoiceEngine`); everything here is platform trouble or bad input.

use thiserror::Error;

/// Result type alias for Binaural operations
pub type Result<T> = std::result::Result<T, BinauralError>;

/// Main error type for Binaural operations
#[derive(Error, Debug)]
pub enum BinauralError {
    // Platform Errors
    #[error("Audio unavailable: {reason}")]
    AudioUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Unsupported sample format: {format}")]
    UnsupportedSampleFormat { format: String },

    #[error("Audio stream error: {reason}")]
    Stream { reason: String },

    // Graph Errors
    #[error("Voice {id} is not connected to the render graph")]
    VoiceNotFound { id: u64 },

    #[error("Scheduling failed: {reason}")]
    Scheduling { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BinauralError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BinauralError::AudioUnavailable { .. } => "AUDIO_UNAVAILABLE",
            BinauralError::NoOutputDevice => "NO_OUTPUT_DEVICE",
            BinauralError::UnsupportedSampleFormat { .. } => "UNSUPPORTED_SAMPLE_FORMAT",
            BinauralError::Stream { .. } => "STREAM_ERROR",
            BinauralError::VoiceNotFound { .. } => "VOICE_NOT_FOUND",
            BinauralError::Scheduling { .. } => "SCHEDULING_ERROR",
            BinauralError::InvalidConfig { .. } => "INVALID_CONFIG",
            BinauralError::Io(_) => "IO_ERROR",
            BinauralError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the engine usable: the caller may simply
    /// try `start` again (e.g. after the user plugs in headphones).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BinauralError::AudioUnavailable { .. }
                | BinauralError::NoOutputDevice
                | BinauralError::Stream { .. }
                | BinauralError::VoiceNotFound { .. }
                | BinauralError::Scheduling { .. }
        )
    }

    /// Build a `Scheduling` error from anything displayable
    pub(crate) fn scheduling(reason: impl std::fmt::Display) -> Self {
        BinauralError::Scheduling {
            reason: reason.to_string(),
        }
    }

    /// Build an `InvalidConfig` error from anything displayable
    pub(crate) fn invalid_config(reason: impl std::fmt::Display) -> Self {
        BinauralError::InvalidConfig {
            reason: reason.to_string(),
        }
    }
}
