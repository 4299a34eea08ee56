//! Chime Playback
//!
//! Platform-agnostic playback engine for Chime.
//!
//! This crate provides:
//! - `PlaybackEngine`: the state machine (load/pause/resume/stop/seek) and
//!   the realtime render path that feeds the output callback
//! - `FadeEnvelope`: linear fade-in/fade-out tied to stream position
//! - `MediaClock`: read-only position/duration/state queries
//! - `SleepTimer`: countdown that preempts playback from a worker thread
//! - `PlayerConfig`: serializable initial settings
//!
//! The engine is shared between a control thread and the audio callback as
//! `Arc<Mutex<PlaybackEngine>>`. The callback locks it once per block and
//! calls [`PlaybackEngine::render_block`]; everything on that path is
//! allocation-free and never calls user code. Platform crates own the
//! actual output stream and the decoder.
//!
//! # Example
//!
//! ```rust
//! use chime_playback::{PlaybackEngine, PlayerConfig, RenderOutcome};
//! use chime_core::DecodedAudio;
//!
//! let mut engine = PlaybackEngine::new(&PlayerConfig::default());
//! engine.load(DecodedAudio::new(vec![0.25; 2 * 44100], 44100)).unwrap();
//!
//! let mut block = vec![0.0f32; 1024];
//! assert_eq!(engine.render_block(&mut block), RenderOutcome::Rendered);
//! ```

mod clock;
mod engine;
mod error;
mod fade;
mod graph;
mod timer;
pub mod types;

pub use clock::MediaClock;
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use fade::FadeEnvelope;
pub use graph::RenderOutcome;
pub use timer::SleepTimer;
pub use types::{PlaybackState, PlayerConfig};
