/// Load-time sample-rate conversion via rubato
use crate::error::{AudioError, Result};
use chime_core::DecodedAudio;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Resample a decoded buffer to the output device rate
///
/// The whole buffer is converted in one pass at load time; the render path
/// never resamples. Returns the input unchanged when the rates already
/// match or the buffer is empty.
pub fn resample_to(audio: &DecodedAudio, target_rate: u32) -> Result<DecodedAudio> {
    if audio.sample_rate == target_rate || audio.is_empty() {
        return Ok(DecodedAudio::new(audio.samples.clone(), audio.sample_rate));
    }

    let frames = audio.frames();

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.99,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 512,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        target_rate as f64 / audio.sample_rate as f64,
        2.0,
        params,
        frames,
        2,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    // Deinterleave into per-channel buffers for rubato
    let mut deinterleaved = vec![Vec::with_capacity(frames); 2];
    for frame in audio.samples.chunks_exact(2) {
        deinterleaved[0].push(frame[0]);
        deinterleaved[1].push(frame[1]);
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    // Interleave back
    let output_frames = resampled[0].len();
    let mut interleaved = Vec::with_capacity(output_frames * 2);
    for i in 0..output_frames {
        interleaved.push(resampled[0][i]);
        interleaved.push(resampled[1][i]);
    }

    Ok(DecodedAudio::new(interleaved, target_rate))
}
