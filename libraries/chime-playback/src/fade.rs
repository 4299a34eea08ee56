//! Fade envelope tied to stream position
//!
//! Linear fade-in over the first `fade_in_secs` of the stream and linear
//! fade-out over the last `fade_out_secs`. The envelope is a pure function
//! of absolute frame position, so pause/seek need no bookkeeping here.

/// Linear fade-in/fade-out envelope over a whole stream
#[derive(Debug, Clone, Copy)]
pub struct FadeEnvelope {
    /// Frames in the fade-in region `[0, fade_in_frames)`
    fade_in_frames: usize,

    /// First frame of the fade-out region
    fade_out_start: usize,

    /// Total frames in the stream
    total_frames: usize,
}

impl FadeEnvelope {
    /// Build an envelope for a stream of `total_frames` frames
    ///
    /// Negative durations are treated as zero. A fade-in longer than the
    /// stream is truncated to the stream length.
    pub fn new(
        fade_in_secs: f32,
        fade_out_secs: f32,
        sample_rate: u32,
        total_frames: usize,
    ) -> Self {
        let to_frames =
            |secs: f32| (f64::from(secs.max(0.0)) * f64::from(sample_rate)).round() as usize;

        let fade_in_frames = to_frames(fade_in_secs).min(total_frames);
        let fade_out_frames = to_frames(fade_out_secs);
        let fade_out_start = total_frames.saturating_sub(fade_out_frames);

        Self {
            fade_in_frames,
            fade_out_start,
            total_frames,
        }
    }

    /// Envelope gain at an absolute frame position
    #[inline]
    pub fn gain_at(&self, frame: usize) -> f32 {
        if frame < self.fade_in_frames {
            frame as f32 / self.fade_in_frames as f32
        } else if frame >= self.fade_out_start && self.total_frames > self.fade_out_start {
            1.0 - (frame - self.fade_out_start) as f32
                / (self.total_frames - self.fade_out_start) as f32
        } else {
            1.0
        }
    }

    /// True when no frame would be attenuated
    pub fn is_transparent(&self) -> bool {
        self.fade_in_frames == 0 && self.fade_out_start >= self.total_frames
    }

    /// Apply the envelope to an interleaved stereo block starting at
    /// `start_frame`
    ///
    /// Frames in the middle region pass through untouched. Never allocates.
    pub fn apply(&self, block: &mut [f32], start_frame: usize) {
        if self.is_transparent() {
            return;
        }

        // Blocks entirely inside the unity region skip the per-frame walk
        let frames = block.len() / 2;
        if start_frame >= self.fade_in_frames && start_frame + frames <= self.fade_out_start {
            return;
        }

        for (i, frame) in block.chunks_exact_mut(2).enumerate() {
            let gain = self.gain_at(start_frame + i);
            if gain != 1.0 {
                frame[0] *= gain;
                frame[1] *= gain;
            }
        }
    }
}
