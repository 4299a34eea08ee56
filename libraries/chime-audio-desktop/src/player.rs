//! Desktop player
//!
//! Ties the platform pieces together: the Symphonia decoder, the shared
//! playback engine, the CPAL output thread, the sleep timer, and the
//! end-of-stream dispatch worker. This is the consumer-facing surface;
//! everything here runs on non-realtime threads.

use crate::equalizer::Equalizer;
use crate::error::{AudioOutputError, Result};
use crate::output::{AudioOutput, PlayerEvent};
use chime_audio::{resample_to, time_stretch, SymphoniaDecoder};
use chime_core::AudioDecoder;
use chime_playback::{MediaClock, PlaybackEngine, PlaybackError, PlayerConfig, SleepTimer};
use crossbeam_channel::{bounded, Receiver};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// End-of-stream callback storage, shared with the dispatch worker
type EndCallback = Arc<Mutex<Option<Box<dyn FnMut() + Send>>>>;

/// Music player: decoded file -> EQ -> volume -> fade -> output device
///
/// All control methods are safe to call from any thread and idempotent
/// where they semantically can be. Failures of `play` are logged and
/// reported as `false`; the previous stream stays stopped.
pub struct Player {
    engine: Arc<Mutex<PlaybackEngine>>,
    output: AudioOutput,
    decoder: SymphoniaDecoder,
    timer: SleepTimer,
    on_end: EndCallback,
    _event_worker: JoinHandle<()>,
}

impl Player {
    /// Create a player on the default output device
    ///
    /// # Errors
    /// Returns an error if no output device is available
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let engine = Arc::new(Mutex::new(PlaybackEngine::new(&config)));

        let (event_tx, event_rx) = bounded::<PlayerEvent>(32);
        let output = AudioOutput::new(Arc::clone(&engine), event_tx)?;

        let on_end: EndCallback = Arc::new(Mutex::new(None));
        let event_worker = Self::spawn_event_worker(event_rx, Arc::clone(&on_end));

        Ok(Self {
            engine,
            output,
            decoder: SymphoniaDecoder::new(),
            timer: SleepTimer::new(),
            on_end,
            _event_worker: event_worker,
        })
    }

    /// Dispatch worker: runs user callbacks off the audio thread
    ///
    /// Exits when every event sender is gone (player dropped).
    fn spawn_event_worker(event_rx: Receiver<PlayerEvent>, on_end: EndCallback) -> JoinHandle<()> {
        thread::spawn(move || {
            while let Ok(event) = event_rx.recv() {
                match event {
                    PlayerEvent::TrackFinished => {
                        // The engine is already Stopped; the idle stream
                        // stays open until the next play or stop so a
                        // stale event can never tear down a fresh stream
                        log::debug!("stream finished");
                        if let Some(callback) = on_end.lock().unwrap().as_mut() {
                            callback();
                        }
                    }
                }
            }
        })
    }

    // ===== Transport =====

    /// Load a file and start playing it
    ///
    /// Stops the current stream first. Returns false (with the failure
    /// logged) if the file cannot be decoded or the device refuses a
    /// stream; the player is left stopped in that case.
    pub fn play(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_play(path) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to play {}: {}", path.display(), e);
                self.output.stop();
                self.engine.lock().unwrap().stop();
                false
            }
        }
    }

    fn try_play(&mut self, path: &Path) -> std::result::Result<(), chime_core::ChimeError> {
        let mut audio = self.decoder.decode(path)?;

        let cleaned = audio.sanitize();
        if cleaned > 0 {
            log::warn!(
                "{}: replaced {} non-finite samples with silence",
                path.display(),
                cleaned
            );
        }

        // Speed is read under the lock, but the heavy lifting below runs
        // without it
        let (speed, speed_adjustment) = {
            let engine = self.engine.lock().unwrap();
            (engine.speed(), engine.speed_adjustment())
        };

        if speed_adjustment && (speed - 1.0).abs() > 1e-3 {
            log::debug!("time-stretching at {:.2}x", speed);
            audio = time_stretch(&audio, speed);
        }

        if audio.sample_rate != self.output.sample_rate() {
            log::debug!(
                "resampling {} Hz -> {} Hz",
                audio.sample_rate,
                self.output.sample_rate()
            );
            audio = resample_to(&audio, self.output.sample_rate())?;
        }

        // Implicitly stop the previous stream (an armed sleep timer keeps
        // counting across track changes)
        self.output.stop();

        self.engine
            .lock()
            .unwrap()
            .load(audio)
            .map_err(|e: PlaybackError| chime_core::ChimeError::audio(e.to_string()))?;

        self.output.start().map_err(|e: AudioOutputError| {
            self.engine.lock().unwrap().stop();
            chime_core::ChimeError::audio(e.to_string())
        })?;

        Ok(())
    }

    /// Pause playback; the stream keeps running and renders silence
    pub fn pause(&self) {
        self.engine.lock().unwrap().pause();
    }

    /// Resume paused playback
    pub fn resume(&self) {
        self.engine.lock().unwrap().resume();
    }

    /// Stop playback, close the output stream, and cancel any sleep timer
    ///
    /// The end-of-stream callback does not fire on an explicit stop.
    pub fn stop(&self) {
        self.output.stop();
        self.engine.lock().unwrap().stop();
        self.timer.cancel();
    }

    /// Seek to a position in seconds, clamped to [0, duration]
    ///
    /// A no-op when nothing is loaded.
    pub fn seek(&self, position_seconds: f64) {
        if let Err(e) = self.engine.lock().unwrap().seek_seconds(position_seconds) {
            log::debug!("seek ignored: {}", e);
        }
    }

    // ===== Volume =====

    /// Set output volume, clamped to [0, 1]
    pub fn set_volume(&self, volume: f32) {
        self.engine.lock().unwrap().set_volume(volume);
    }

    /// Get output volume
    pub fn volume(&self) -> f32 {
        self.engine.lock().unwrap().volume()
    }

    // ===== Queries =====

    /// True while actively rendering
    pub fn is_playing(&self) -> bool {
        self.engine.lock().unwrap().is_playing()
    }

    /// True while paused mid-track
    pub fn is_paused(&self) -> bool {
        self.engine.lock().unwrap().is_paused()
    }

    /// Playback position in seconds
    pub fn position(&self) -> f64 {
        self.engine.lock().unwrap().position_seconds()
    }

    /// Duration of the loaded stream in seconds
    pub fn duration(&self) -> f64 {
        self.engine.lock().unwrap().duration_seconds()
    }

    /// A cheap cloneable handle for position/state queries
    pub fn clock(&self) -> MediaClock {
        MediaClock::new(Arc::clone(&self.engine))
    }

    // ===== Fade =====

    /// Enable or disable the fade envelope
    pub fn set_fade_enabled(&self, enabled: bool) {
        self.engine.lock().unwrap().set_fade_enabled(enabled);
    }

    /// Update fade durations in seconds; `None` keeps the current value
    pub fn set_fade_duration(&self, fade_in_secs: Option<f32>, fade_out_secs: Option<f32>) {
        self.engine
            .lock()
            .unwrap()
            .set_fade_durations(fade_in_secs, fade_out_secs);
    }

    // ===== Speed =====

    /// Set playback speed (0.5 to 2.0) for the next load
    ///
    /// The time-stretch runs once at load, so changing speed mid-playback
    /// takes effect when the next file is played.
    pub fn set_playback_speed(&self, speed: f32) {
        self.engine.lock().unwrap().set_speed(speed);
    }

    /// Get playback speed
    pub fn playback_speed(&self) -> f32 {
        self.engine.lock().unwrap().speed()
    }

    /// Enable or disable load-time time-stretching
    pub fn enable_speed_adjustment(&self, enabled: bool) {
        self.engine.lock().unwrap().set_speed_adjustment(enabled);
    }

    // ===== Sleep timer =====

    /// Stop playback after `minutes`; supersedes any armed timer
    ///
    /// Returns false for a non-positive or non-finite duration.
    pub fn set_sleep_timer(&self, minutes: f64) -> bool {
        let engine = Arc::clone(&self.engine);
        let controller = self.output.controller();
        self.timer.arm(minutes, move || {
            controller.stop();
            engine.lock().unwrap().stop();
        })
    }

    /// Cancel an armed sleep timer
    pub fn cancel_sleep_timer(&self) {
        self.timer.cancel();
    }

    /// Minutes until the sleep timer fires, or 0.0 when inactive
    pub fn sleep_timer_remaining(&self) -> f64 {
        self.timer.remaining_minutes()
    }

    /// True while a sleep timer is counting down
    pub fn has_sleep_timer(&self) -> bool {
        self.timer.is_armed()
    }

    // ===== Equalizer =====

    /// Handle to the 10-band equalizer
    pub fn equalizer(&self) -> Equalizer {
        Equalizer::new(Arc::clone(&self.engine))
    }

    // ===== End-of-stream callback =====

    /// Set the callback invoked when a stream ends of its own accord
    ///
    /// Fires once per stream, from a worker thread, never on explicit
    /// `stop`.
    pub fn set_on_playback_end<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        *self.on_end.lock().unwrap() = Some(Box::new(callback));
    }

    /// Remove the end-of-stream callback
    pub fn clear_on_playback_end(&self) {
        *self.on_end.lock().unwrap() = None;
    }

    /// Number of output stream errors observed so far
    pub fn stream_error_count(&self) -> usize {
        self.output.stream_error_count()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.timer.cancel();
        // AudioOutput's Drop shuts the audio thread down; once its event
        // senders are gone the dispatch worker exits on its own
    }
}
