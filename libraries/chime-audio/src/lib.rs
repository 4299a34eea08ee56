//! Chime Audio
//!
//! Audio decoding and DSP for the Chime playback engine.
//!
//! This crate provides:
//! - Audio decoding via Symphonia (MP3, FLAC, OGG, WAV, AAC, M4A)
//! - Whole-buffer resampling via rubato (load-time rate conversion)
//! - Pitch-preserving time-stretch via signalsmith-stretch
//! - A fixed 10-band peaking equalizer for the realtime render path
//!
//! # Example: Decoding and equalizing
//!
//! ```rust,no_run
//! use chime_audio::SymphoniaDecoder;
//! use chime_audio::effects::EqualizerBank;
//! use chime_core::AudioDecoder;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut decoder = SymphoniaDecoder::new();
//! let mut audio = decoder.decode(Path::new("/music/song.flac"))?;
//! audio.sanitize();
//!
//! let mut eq = EqualizerBank::new(audio.sample_rate);
//! eq.set_band_gain(0, 6.0); // +6 dB at 60 Hz
//! eq.process(&mut audio.samples);
//! # Ok(())
//! # }
//! ```

mod decoder;
pub mod effects;
mod error;
mod resample;
mod stretch;

pub use decoder::SymphoniaDecoder;
pub use error::{AudioError, Result};
pub use resample::resample_to;
pub use stretch::{time_stretch, MAX_STRETCH_RATE, MIN_STRETCH_RATE};
