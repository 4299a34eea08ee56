/// Audio-related types
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);
    pub const HIGH_RES_96: Self = Self(96_000);
    pub const HIGH_RES_192: Self = Self(192_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }
}

/// Decoded audio, immutable after load
///
/// Samples are stored as f32 in the range [-1.0, 1.0], interleaved stereo:
/// `[L, R, L, R, ...]`. Mono sources are promoted to stereo by duplication
/// at decode time, so everything downstream is stereo-only.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Audio samples (f32, interleaved stereo)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Create a new decoded buffer
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Replace non-finite samples (NaN, infinity) with silence
    ///
    /// Decoders occasionally emit garbage on corrupt packets; a single NaN
    /// would otherwise poison every biquad it passes through. Returns the
    /// number of samples that were cleaned.
    pub fn sanitize(&mut self) -> usize {
        let mut cleaned = 0;
        for sample in &mut self.samples {
            if !sample.is_finite() {
                *sample = 0.0;
                cleaned += 1;
            }
        }
        cleaned
    }
}
