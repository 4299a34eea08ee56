//! Playback engine - state machine and control plane
//!
//! `PlaybackEngine` owns the decoded buffer, the read position, the
//! equalizer bank, and the fade envelope. Control threads mutate it under
//! a mutex; the audio callback locks the same mutex once per block and
//! calls `render_block` (in `graph.rs`, kept separate so the realtime hot
//! path stays inspectable at a glance).

use crate::error::{PlaybackError, Result};
use crate::fade::FadeEnvelope;
use crate::types::{PlaybackState, PlayerConfig};
use chime_audio::effects::EqualizerBank;
use chime_audio::{MAX_STRETCH_RATE, MIN_STRETCH_RATE};
use chime_core::DecodedAudio;

/// Playback state machine and audio-graph state
///
/// One engine instance is shared as `Arc<Mutex<PlaybackEngine>>` between
/// the control surface and the audio callback. All control operations are
/// idempotent where they semantically can be: pausing while paused,
/// stopping while stopped, and seeking with nothing loaded are no-ops.
pub struct PlaybackEngine {
    /// Decoded stream at the output rate; replaced on load
    pub(crate) audio: Option<DecodedAudio>,

    /// Next frame the render path will read
    pub(crate) current_frame: usize,

    pub(crate) state: PlaybackState,

    /// Linear output gain, 0.0 to 1.0
    pub(crate) volume: f32,

    pub(crate) equalizer: EqualizerBank,

    /// Envelope for the currently loaded stream
    pub(crate) fade: Option<FadeEnvelope>,
    pub(crate) fade_enabled: bool,
    fade_in_secs: f32,
    fade_out_secs: f32,

    /// Playback speed for the next load
    speed: f32,
    speed_adjustment: bool,
}

impl PlaybackEngine {
    /// Create an engine with no audio loaded
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            audio: None,
            current_frame: 0,
            state: PlaybackState::Stopped,
            volume: config.volume.clamp(0.0, 1.0),
            equalizer: EqualizerBank::new(44100),
            fade: None,
            fade_enabled: config.fade_enabled,
            fade_in_secs: config.fade_in_secs.max(0.0),
            fade_out_secs: config.fade_out_secs.max(0.0),
            speed: config.speed.clamp(MIN_STRETCH_RATE, MAX_STRETCH_RATE),
            speed_adjustment: config.speed_adjustment,
        }
    }

    // ===== Loading =====

    /// Install a new decoded stream and start playing from its beginning
    ///
    /// The buffer must already be at the output device rate (and
    /// time-stretched, if requested); the engine never resamples. The
    /// equalizer is retuned to the stream rate and its filter memory
    /// cleared, and the fade envelope is rebuilt for the new length.
    pub fn load(&mut self, audio: DecodedAudio) -> Result<()> {
        if audio.is_empty() {
            return Err(PlaybackError::InvalidOperation(
                "cannot load an empty audio buffer".to_string(),
            ));
        }

        self.equalizer.set_sample_rate(audio.sample_rate);
        self.equalizer.reset_state();
        self.fade = Some(FadeEnvelope::new(
            self.fade_in_secs,
            self.fade_out_secs,
            audio.sample_rate,
            audio.frames(),
        ));
        self.current_frame = 0;
        self.audio = Some(audio);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    // ===== Transport =====

    /// Pause playback; the render path zero-fills without advancing
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume paused playback
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop playback and rewind
    ///
    /// The loaded stream is kept so duration queries stay meaningful.
    /// Stopping never reports end-of-stream.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.current_frame = 0;
    }

    /// Seek to a position in seconds
    ///
    /// The position is clamped to [0, duration]. All EQ filter memory is
    /// cleared so no pre-seek sample can ring into post-seek output.
    pub fn seek_seconds(&mut self, seconds: f64) -> Result<()> {
        let Some(audio) = self.audio.as_ref() else {
            return Err(PlaybackError::NoTrackLoaded);
        };

        let clamped = seconds.clamp(0.0, audio.duration_secs());
        let frame = (clamped * f64::from(audio.sample_rate)).round() as usize;
        self.current_frame = frame.min(audio.frames());
        self.equalizer.reset_state();
        Ok(())
    }

    // ===== Volume =====

    /// Set output volume, clamped to [0, 1]; the next block picks it up
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Get output volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    // ===== Fade =====

    /// Enable or disable the fade envelope
    pub fn set_fade_enabled(&mut self, enabled: bool) {
        self.fade_enabled = enabled;
    }

    /// Whether the fade envelope is applied
    pub fn fade_enabled(&self) -> bool {
        self.fade_enabled
    }

    /// Update fade durations; `None` keeps the current value
    ///
    /// Takes effect immediately for the loaded stream.
    pub fn set_fade_durations(&mut self, fade_in_secs: Option<f32>, fade_out_secs: Option<f32>) {
        if let Some(fade_in) = fade_in_secs {
            self.fade_in_secs = fade_in.max(0.0);
        }
        if let Some(fade_out) = fade_out_secs {
            self.fade_out_secs = fade_out.max(0.0);
        }
        if let Some(audio) = self.audio.as_ref() {
            self.fade = Some(FadeEnvelope::new(
                self.fade_in_secs,
                self.fade_out_secs,
                audio.sample_rate,
                audio.frames(),
            ));
        }
    }

    // ===== Speed =====

    /// Set playback speed for the next load, clamped to [0.5, 2.0]
    ///
    /// Time-stretch happens once at load time, so a speed change during
    /// playback applies when the next stream is loaded.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_STRETCH_RATE, MAX_STRETCH_RATE);
    }

    /// Playback speed for the next load
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Enable or disable load-time time-stretching
    pub fn set_speed_adjustment(&mut self, enabled: bool) {
        self.speed_adjustment = enabled;
    }

    /// Whether load-time time-stretching is enabled
    pub fn speed_adjustment(&self) -> bool {
        self.speed_adjustment
    }

    // ===== Queries =====

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True while actively rendering
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// True while paused mid-track
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Playback position in seconds (0.0 with nothing loaded)
    pub fn position_seconds(&self) -> f64 {
        self.audio
            .as_ref()
            .map(|a| self.current_frame as f64 / f64::from(a.sample_rate))
            .unwrap_or(0.0)
    }

    /// Duration of the loaded stream in seconds (0.0 with nothing loaded)
    pub fn duration_seconds(&self) -> f64 {
        self.audio.as_ref().map(|a| a.duration_secs()).unwrap_or(0.0)
    }

    /// The equalizer bank
    pub fn equalizer(&self) -> &EqualizerBank {
        &self.equalizer
    }

    /// The equalizer bank, mutable
    ///
    /// Callers reach this through the engine mutex, which is the same lock
    /// the audio callback holds while rendering: a block always sees one
    /// consistent gain vector.
    pub fn equalizer_mut(&mut self) -> &mut EqualizerBank {
        &mut self.equalizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_audio(frames: usize) -> PlaybackEngine {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine
            .load(DecodedAudio::new(vec![0.5; frames * 2], 44100))
            .unwrap();
        engine
    }

    #[test]
    fn load_starts_playing_from_zero() {
        let engine = engine_with_audio(44100);
        assert!(engine.is_playing());
        assert_eq!(engine.position_seconds(), 0.0);
        assert!((engine.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn load_rejects_empty_buffer() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        assert!(engine.load(DecodedAudio::new(Vec::new(), 44100)).is_err());
        assert_eq!(engine.state(), PlaybackState::Stopped);
    }

    #[test]
    fn pause_resume_stop_transitions() {
        let mut engine = engine_with_audio(44100);

        engine.pause();
        assert!(engine.is_paused());

        engine.resume();
        assert!(engine.is_playing());

        engine.stop();
        assert_eq!(engine.state(), PlaybackState::Stopped);
        assert_eq!(engine.position_seconds(), 0.0);
    }

    #[test]
    fn transport_is_idempotent() {
        let mut engine = engine_with_audio(44100);

        engine.stop();
        engine.stop();
        assert_eq!(engine.state(), PlaybackState::Stopped);

        // Resume from stopped is a no-op, not a restart
        engine.resume();
        assert_eq!(engine.state(), PlaybackState::Stopped);

        // Pause while stopped is a no-op
        engine.pause();
        assert_eq!(engine.state(), PlaybackState::Stopped);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut engine = engine_with_audio(44100);

        engine.seek_seconds(0.5).unwrap();
        assert!((engine.position_seconds() - 0.5).abs() < 1e-6);

        engine.seek_seconds(100.0).unwrap();
        assert!((engine.position_seconds() - 1.0).abs() < 1e-6);

        engine.seek_seconds(-5.0).unwrap();
        assert_eq!(engine.position_seconds(), 0.0);
    }

    #[test]
    fn seek_without_audio_is_rejected() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        assert!(matches!(
            engine.seek_seconds(1.0),
            Err(PlaybackError::NoTrackLoaded)
        ));
    }

    #[test]
    fn volume_clamps() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());

        engine.set_volume(1.5);
        assert_eq!(engine.volume(), 1.0);

        engine.set_volume(-0.5);
        assert_eq!(engine.volume(), 0.0);

        engine.set_volume(0.3);
        assert_eq!(engine.volume(), 0.3);
    }

    #[test]
    fn speed_clamps() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());

        engine.set_speed(5.0);
        assert_eq!(engine.speed(), 2.0);

        engine.set_speed(0.1);
        assert_eq!(engine.speed(), 0.5);
    }

    #[test]
    fn load_retunes_equalizer() {
        let mut engine = PlaybackEngine::new(&PlayerConfig::default());
        engine.equalizer_mut().set_band_gain(0, 6.0);

        engine
            .load(DecodedAudio::new(vec![0.1; 2 * 48000], 48000))
            .unwrap();

        assert_eq!(engine.equalizer().sample_rate(), 48000);
        // Gains survive a reload
        assert_eq!(engine.equalizer().band_gain(0), Some(6.0));
    }
}
