//! Audio effects for the realtime render path
//!
//! All effects operate in-place on interleaved stereo f32 samples in the
//! [-1.0, 1.0] range and are allocation-free once constructed.

mod eq;

pub use eq::{EqualizerBank, EQ_BAND_COUNT, EQ_BAND_FREQUENCIES, EQ_GAIN_RANGE_DB};
