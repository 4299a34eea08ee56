//! Read-only playback queries
//!
//! `MediaClock` is a cheap cloneable handle for UI/status code that wants
//! position and state without touching the control surface. Every query
//! takes the engine lock for a minimal window.

use crate::engine::PlaybackEngine;
use std::sync::{Arc, Mutex};

/// Read-only query surface over a shared playback engine
#[derive(Clone)]
pub struct MediaClock {
    engine: Arc<Mutex<PlaybackEngine>>,
}

impl MediaClock {
    /// Create a clock observing the given engine
    pub fn new(engine: Arc<Mutex<PlaybackEngine>>) -> Self {
        Self { engine }
    }

    /// Current playback position in seconds
    pub fn position_seconds(&self) -> f64 {
        self.engine.lock().unwrap().position_seconds()
    }

    /// Duration of the loaded stream in seconds (0.0 with nothing loaded)
    pub fn duration_seconds(&self) -> f64 {
        self.engine.lock().unwrap().duration_seconds()
    }

    /// True while actively rendering
    pub fn is_playing(&self) -> bool {
        self.engine.lock().unwrap().is_playing()
    }

    /// True while paused mid-track
    pub fn is_paused(&self) -> bool {
        self.engine.lock().unwrap().is_paused()
    }
}
