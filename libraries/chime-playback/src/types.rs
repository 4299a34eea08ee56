//! Core types for the playback engine

use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track loaded, or playback stopped
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Initial settings for the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Initial volume (0.0 to 1.0, default: 1.0)
    pub volume: f32,

    /// Whether the fade envelope is applied (default: false)
    pub fade_enabled: bool,

    /// Fade-in duration at stream start, in seconds (default: 1.0)
    pub fade_in_secs: f32,

    /// Fade-out duration approaching stream end, in seconds (default: 1.0)
    pub fade_out_secs: f32,

    /// Playback speed (0.5 to 2.0, default: 1.0); applied at load time
    pub speed: f32,

    /// Whether the time-stretcher runs at load when speed != 1.0
    /// (default: false)
    pub speed_adjustment: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fade_enabled: false,
            fade_in_secs: 1.0,
            fade_out_secs: 1.0,
            speed: 1.0,
            speed_adjustment: false,
        }
    }
}
