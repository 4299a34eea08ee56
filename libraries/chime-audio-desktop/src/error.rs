/// Desktop audio output errors
use thiserror::Error;

/// Result type alias using `AudioOutputError`
pub type Result<T> = std::result::Result<T, AudioOutputError>;

/// Errors from the CPAL output layer
#[derive(Error, Debug)]
pub enum AudioOutputError {
    /// No output device available
    #[error("No audio output device found")]
    DeviceNotFound,

    /// Stream could not be built or started
    #[error("Failed to open audio stream: {0}")]
    StreamBuild(String),

    /// The audio thread is gone
    #[error("Audio thread disconnected: {0}")]
    Disconnected(String),
}
