/// Audio decoder implementation using Symphonia
use crate::error::{AudioError, Result};
use chime_core::{AudioDecoder as AudioDecoderTrait, DecodedAudio};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Audio decoder using Symphonia
///
/// Supports: MP3, FLAC, OGG, WAV, AAC, M4A
///
/// Decodes the entire file into an interleaved stereo f32 buffer at the
/// source sample rate. Mono input is duplicated to both channels; input
/// with more than two channels is downmixed to stereo.
pub struct SymphoniaDecoder;

/// -3 dB coefficient for center/surround contributions in the downmix
const SURROUND_MIX: f32 = 0.707;

impl SymphoniaDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Convert a decoded Symphonia buffer to interleaved stereo f32
    ///
    /// Signed integers use symmetric scaling (divide by 2^(N-1)) so the
    /// [-1.0, 1.0] range is symmetric; unsigned formats are recentered
    /// around zero.
    fn append_as_stereo(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
        match decoded {
            AudioBufferRef::F32(buf) => {
                Self::mix_to_stereo(buf, out, |s| s.clamp(-1.0, 1.0));
            }
            AudioBufferRef::F64(buf) => {
                Self::mix_to_stereo(buf, out, |s| (s as f32).clamp(-1.0, 1.0));
            }
            AudioBufferRef::S32(buf) => {
                Self::mix_to_stereo(buf, out, |s| s as f32 / 2147483648.0);
            }
            AudioBufferRef::S24(buf) => {
                Self::mix_to_stereo(buf, out, |s| s.inner() as f32 / 8388608.0);
            }
            AudioBufferRef::S16(buf) => {
                Self::mix_to_stereo(buf, out, |s| s as f32 / 32768.0);
            }
            AudioBufferRef::S8(buf) => {
                Self::mix_to_stereo(buf, out, |s| s as f32 / 128.0);
            }
            AudioBufferRef::U32(buf) => {
                Self::mix_to_stereo(buf, out, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
            }
            AudioBufferRef::U24(buf) => {
                Self::mix_to_stereo(buf, out, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0);
            }
            AudioBufferRef::U16(buf) => {
                Self::mix_to_stereo(buf, out, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0);
            }
            AudioBufferRef::U8(buf) => {
                Self::mix_to_stereo(buf, out, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0);
            }
        }
    }

    /// Normalize any channel layout to interleaved stereo
    ///
    /// Mono is duplicated. Stereo passes through. Wider layouts keep the
    /// front pair and fold the remaining channels in at -3 dB: center and
    /// LFE feed both sides, surrounds alternate left/right.
    fn mix_to_stereo<T, F>(
        buf: &symphonia::core::audio::AudioBuffer<T>,
        out: &mut Vec<f32>,
        normalize: F,
    ) where
        T: symphonia::core::sample::Sample + Copy,
        F: Fn(T) -> f32,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        out.reserve(frames * 2);

        match channels {
            0 => {
                out.extend(std::iter::repeat(0.0).take(frames * 2));
            }
            1 => {
                let mono = buf.chan(0);
                for i in 0..frames {
                    let sample = normalize(mono[i]);
                    out.push(sample);
                    out.push(sample);
                }
            }
            2 => {
                let left = buf.chan(0);
                let right = buf.chan(1);
                for i in 0..frames {
                    out.push(normalize(left[i]));
                    out.push(normalize(right[i]));
                }
            }
            n => {
                let left = buf.chan(0);
                let right = buf.chan(1);
                for i in 0..frames {
                    let mut l = normalize(left[i]);
                    let mut r = normalize(right[i]);
                    for ch in 2..n {
                        let s = normalize(buf.chan(ch)[i]) * SURROUND_MIX;
                        // Channels 2/3 are center/LFE in the common layouts
                        if ch < 4 {
                            l += s;
                            r += s;
                        } else if ch % 2 == 0 {
                            l += s;
                        } else {
                            r += s;
                        }
                    }
                    out.push(l.clamp(-1.0, 1.0));
                    out.push(r.clamp(-1.0, 1.0));
                }
            }
        }
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDecoderTrait for SymphoniaDecoder {
    fn decode(&mut self, path: &Path) -> chime_core::Result<DecodedAudio> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()).into());
        }

        let file = std::fs::File::open(path).map_err(AudioError::Io)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // A hint helps the format registry guess the container
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Symphonia(format!("Failed to probe file: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    return Err(
                        AudioError::Symphonia(format!("Error reading packet: {}", e)).into()
                    );
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::append_as_stereo(&decoded, &mut samples),
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packets are skippable; the stream continues
                    log::warn!("recoverable decode error, skipping packet: {}", e);
                }
                Err(e) => {
                    return Err(AudioError::DecodeError(format!("Decode error: {}", e)).into());
                }
            }
        }

        Ok(DecodedAudio::new(samples, sample_rate))
    }

    fn supports_format(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            matches!(
                ext.to_lowercase().as_str(),
                "mp3" | "flac" | "ogg" | "wav" | "m4a" | "aac"
            )
        } else {
            false
        }
    }
}
