//! Load-time time-stretching via signalsmith-stretch
//!
//! Changes playback duration without changing pitch. The stretch happens
//! once per load over the full decoded buffer; streaming the phase vocoder
//! inside the render callback is deliberately out of scope, so mid-playback
//! speed changes take effect on the next load.

use chime_core::DecodedAudio;
use signalsmith_stretch::Stretch;

/// Slowest supported playback rate
pub const MIN_STRETCH_RATE: f32 = 0.5;

/// Fastest supported playback rate
pub const MAX_STRETCH_RATE: f32 = 2.0;

/// Number of channels (stereo)
const CHANNELS: u32 = 2;

/// Stretch a decoded buffer to `1/rate` of its duration, preserving pitch
///
/// `rate` is the playback speed: 2.0 halves the duration, 0.5 doubles it.
/// Values outside [0.5, 2.0] are clamped. A rate within 0.001 of 1.0
/// returns the input unchanged.
pub fn time_stretch(audio: &DecodedAudio, rate: f32) -> DecodedAudio {
    let rate = rate.clamp(MIN_STRETCH_RATE, MAX_STRETCH_RATE);
    if (rate - 1.0).abs() < 1e-3 || audio.is_empty() {
        return DecodedAudio::new(audio.samples.clone(), audio.sample_rate);
    }

    let input_frames = audio.frames();
    let output_frames = (input_frames as f64 / rate as f64).round() as usize;
    let mut output = vec![0.0f32; output_frames * 2];

    // The stretch ratio is implied by the relative input/output lengths
    let mut stretcher = Stretch::preset_default(CHANNELS, audio.sample_rate);
    stretcher.process(&audio.samples, &mut output);

    DecodedAudio::new(output, audio.sample_rate)
}
