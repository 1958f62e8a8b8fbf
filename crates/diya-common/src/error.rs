//! Error types for Diya.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for Diya operations.
#[derive(Debug, Error)]
pub enum DiyaError {
    /// The host could not provide a drawable surface.
    #[error("No drawable surface available")]
    SurfaceUnavailable,

    /// Audio errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding errors
    #[error("Image encoding failed: {0}")]
    Image(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Music playback errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open an output device.
    #[error("Failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    /// The host refused to start playback (autoplay policy, muted device, ...).
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// Failed to open the track file.
    #[error("Failed to load audio file '{path}': {message}")]
    LoadFailed {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to decode audio data.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),

    /// The track resource was already released.
    #[error("Audio track already released")]
    Released,
}

/// Result type alias for Diya operations.
pub type DiyaResult<T> = Result<T, DiyaError>;

/// Result type alias for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;
