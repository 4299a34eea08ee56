//! Realtime render path
//!
//! The audio-plane half of `PlaybackEngine`, kept apart from the control
//! plane in `engine.rs`. `render_block` runs on the output device's
//! callback thread with the engine lock held for the duration of one
//! block. It must not allocate, log, block on I/O, or call user code.

use crate::engine::PlaybackEngine;
use crate::types::PlaybackState;

/// What a call to [`PlaybackEngine::render_block`] produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing to render (stopped, paused, or no audio); output was
    /// zero-filled and the position did not advance
    Idle,

    /// A block was rendered and the stream continues
    Rendered,

    /// The stream was exhausted within this block. Reported exactly once
    /// per stream: the engine is now Stopped, so subsequent calls are
    /// `Idle`. The caller dispatches the end-of-stream notification from a
    /// non-realtime thread.
    Finished,
}

impl PlaybackEngine {
    /// Fill an interleaved stereo block from the loaded stream
    ///
    /// Pipeline per block: copy from the decoded buffer at the current
    /// position, equalize, scale by volume, apply the fade envelope, clamp
    /// to [-1, 1], advance. Any tail past end-of-stream is zero-filled.
    pub fn render_block(&mut self, out: &mut [f32]) -> RenderOutcome {
        debug_assert!(out.len() % 2 == 0, "output must be interleaved stereo");

        let Some(audio) = self.audio.as_ref() else {
            out.fill(0.0);
            return RenderOutcome::Idle;
        };

        // Paused keeps the decoder position; stopped idles until a load
        if self.state != PlaybackState::Playing {
            out.fill(0.0);
            return RenderOutcome::Idle;
        }

        let frames = out.len() / 2;
        let total = audio.frames();
        let start = self.current_frame;
        let copied = total.saturating_sub(start).min(frames);

        out[..copied * 2].copy_from_slice(&audio.samples[start * 2..(start + copied) * 2]);
        out[copied * 2..].fill(0.0);

        // The silent tail needs no processing
        let active = &mut out[..copied * 2];

        self.equalizer.process(active);

        let volume = self.volume;
        if (volume - 1.0).abs() >= 1e-6 {
            for sample in active.iter_mut() {
                *sample *= volume;
            }
        }

        if self.fade_enabled {
            if let Some(fade) = &self.fade {
                fade.apply(active, start);
            }
        }

        for sample in active.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        self.current_frame = start + copied;

        if self.current_frame >= total {
            self.state = PlaybackState::Stopped;
            RenderOutcome::Finished
        } else {
            RenderOutcome::Rendered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerConfig;
    use chime_core::DecodedAudio;

    const SR: u32 = 44100;

    fn engine_with_constant(value: f32, frames: usize) -> PlaybackEngine {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine
            .load(DecodedAudio::new(vec![value; frames * 2], SR))
            .unwrap();
        engine
    }

    #[test]
    fn no_audio_renders_silence() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        let mut out = vec![1.0f32; 512];

        assert_eq!(engine.render_block(&mut out), RenderOutcome::Idle);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn volume_multiplies_exactly() {
        let mut engine = engine_with_constant(0.8, 4096);
        engine.set_volume(0.5);

        let mut out = vec![0.0f32; 512];
        assert_eq!(engine.render_block(&mut out), RenderOutcome::Rendered);

        for sample in &out {
            assert!((sample - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn unity_volume_is_untouched() {
        let mut engine = engine_with_constant(0.8, 4096);

        let mut out = vec![0.0f32; 512];
        engine.render_block(&mut out);

        for sample in &out {
            assert_eq!(*sample, 0.8);
        }
    }

    #[test]
    fn clip_guard_bounds_output() {
        // +12 dB at 60 Hz on a near-full-scale 60 Hz sine must clip, not
        // overflow
        let frames = 8192;
        let samples: Vec<f32> = (0..frames)
            .flat_map(|i| {
                let t = i as f32 / SR as f32;
                let s = 0.9 * (2.0 * std::f32::consts::PI * 60.0 * t).sin();
                [s, s]
            })
            .collect();

        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine.load(DecodedAudio::new(samples, SR)).unwrap();
        engine.equalizer_mut().set_band_gain(0, 12.0);

        let mut out = vec![0.0f32; frames * 2];
        engine.render_block(&mut out);

        let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(peak, 1.0, "the boosted sine should have hit the guard");
    }

    #[test]
    fn pause_zero_fills_without_advancing() {
        let mut engine = engine_with_constant(0.5, 44100);

        let mut out = vec![0.0f32; 1024];
        engine.render_block(&mut out);
        let position = engine.position_seconds();
        assert!(position > 0.0);

        engine.pause();
        for _ in 0..10 {
            assert_eq!(engine.render_block(&mut out), RenderOutcome::Idle);
            assert!(out.iter().all(|s| *s == 0.0));
        }
        assert_eq!(engine.position_seconds(), position);

        engine.resume();
        assert_eq!(engine.render_block(&mut out), RenderOutcome::Rendered);
        assert!(out.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn seek_lands_on_the_requested_frame() {
        // Encode the frame index in the samples so reads are verifiable
        let frames = SR as usize;
        let samples: Vec<f32> = (0..frames)
            .flat_map(|i| {
                let v = i as f32 / frames as f32;
                [v, v]
            })
            .collect();

        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine.load(DecodedAudio::new(samples, SR)).unwrap();

        engine.seek_seconds(0.25).unwrap();
        let expected_frame = (0.25f64 * f64::from(SR)).round() as usize;

        let mut out = vec![0.0f32; 8];
        engine.render_block(&mut out);
        assert_eq!(out[0], expected_frame as f32 / frames as f32);
    }

    #[test]
    fn seek_clears_filter_ringing() {
        // Loud low-frequency content, heavily boosted, then a seek into a
        // silent region: any non-zero output would be pre-seek ring-down
        let frames = SR as usize;
        let mut samples = vec![0.0f32; frames * 2];
        for i in 0..frames / 2 {
            let t = i as f32 / SR as f32;
            let s = 0.9 * (2.0 * std::f32::consts::PI * 60.0 * t).sin();
            samples[i * 2] = s;
            samples[i * 2 + 1] = s;
        }
        // Second half stays silent

        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine.load(DecodedAudio::new(samples, SR)).unwrap();
        engine.equalizer_mut().set_band_gain(0, 12.0);

        // Ring the filters on the loud half
        let mut out = vec![0.0f32; 8192];
        engine.render_block(&mut out);

        // Seek into the silent half
        engine.seek_seconds(0.75).unwrap();
        engine.render_block(&mut out);
        assert!(
            out.iter().all(|s| *s == 0.0),
            "pre-seek samples leaked through the filter state"
        );
    }

    #[test]
    fn finishes_exactly_once() {
        let mut engine = engine_with_constant(0.5, 1000);

        let mut out = vec![0.0f32; 512]; // 256 frames
        let mut finishes = 0;
        for _ in 0..10 {
            if engine.render_block(&mut out) == RenderOutcome::Finished {
                finishes += 1;
            }
        }

        assert_eq!(finishes, 1);
        assert_eq!(engine.state(), PlaybackState::Stopped);
        // After EOS the engine idles
        assert_eq!(engine.render_block(&mut out), RenderOutcome::Idle);
    }

    #[test]
    fn final_block_zero_fills_the_tail() {
        let mut engine = engine_with_constant(0.5, 300);

        let mut out = vec![0.0f32; 512]; // 256 frames
        assert_eq!(engine.render_block(&mut out), RenderOutcome::Rendered);

        // 44 frames remain; the rest of the block must be silence
        assert_eq!(engine.render_block(&mut out), RenderOutcome::Finished);
        assert!(out[..88].iter().all(|s| *s == 0.5));
        assert!(out[88..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn explicit_stop_never_reports_finished() {
        let mut engine = engine_with_constant(0.5, 1000);

        let mut out = vec![0.0f32; 512];
        engine.render_block(&mut out);
        engine.stop();

        for _ in 0..10 {
            assert_eq!(engine.render_block(&mut out), RenderOutcome::Idle);
        }
    }

    #[test]
    fn fade_envelope_shapes_the_stream() {
        let frames = SR as usize; // 1 s
        let mut engine = PlaybackEngine::new(&PlayerConfig {
            fade_enabled: true,
            fade_in_secs: 0.25,
            fade_out_secs: 0.25,
            ..PlayerConfig::default()
        });
        engine
            .load(DecodedAudio::new(vec![0.8; frames * 2], SR))
            .unwrap();

        let mut all = vec![0.0f32; frames * 2];
        let mut rendered = 0;
        while rendered < frames {
            let block_frames = 1024.min(frames - rendered);
            let range = rendered * 2..(rendered + block_frames) * 2;
            engine.render_block(&mut all[range]);
            rendered += block_frames;
        }

        // Start silent, unity in the middle, silent again at the end
        assert_eq!(all[0], 0.0);
        let mid = frames; // frame SR/2, left channel
        assert_eq!(all[mid], 0.8);
        assert!(all[(frames - 1) * 2] < 0.01);
    }

    #[test]
    fn fade_disabled_leaves_stream_untouched() {
        let mut engine = PlaybackEngine::new(&PlayerConfig {
            fade_enabled: false,
            fade_in_secs: 0.5,
            fade_out_secs: 0.5,
            ..PlayerConfig::default()
        });
        engine
            .load(DecodedAudio::new(vec![0.8; 2048], SR))
            .unwrap();

        let mut out = vec![0.0f32; 512];
        engine.render_block(&mut out);
        assert!(out.iter().all(|s| *s == 0.8));
    }
}
