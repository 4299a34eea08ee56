//! Chime Core
//!
//! Shared types and traits for the Chime playback engine.
//!
//! This crate provides:
//! - `DecodedAudio`: the immutable in-memory representation of a decoded
//!   track (interleaved stereo f32)
//! - `SampleRate`: sample-rate newtype with common-rate constants
//! - `AudioDecoder`: the decoder collaborator trait implemented by
//!   platform decoders
//! - `ChimeError`: the cross-crate error type

mod error;
mod traits;
mod types;

pub use error::{ChimeError, Result};
pub use traits::AudioDecoder;
pub use types::{DecodedAudio, SampleRate};
