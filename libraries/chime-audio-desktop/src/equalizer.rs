/// Equalizer handle
///
/// Cloneable control surface over the engine's filter bank. Every call
/// takes the engine lock, which is the same lock the audio callback holds
/// while rendering: a gain update is observed atomically by the next block.
use chime_audio::effects::{EQ_BAND_COUNT, EQ_BAND_FREQUENCIES};
use chime_playback::PlaybackEngine;
use std::sync::{Arc, Mutex};

/// Handle to the player's 10-band equalizer
#[derive(Clone)]
pub struct Equalizer {
    engine: Arc<Mutex<PlaybackEngine>>,
}

impl Equalizer {
    pub(crate) fn new(engine: Arc<Mutex<PlaybackEngine>>) -> Self {
        Self { engine }
    }

    /// The fixed band center frequencies in Hz
    pub fn frequencies(&self) -> [f32; EQ_BAND_COUNT] {
        EQ_BAND_FREQUENCIES
    }

    /// Set one band's gain in dB (clamped to [-12, +12])
    ///
    /// Returns false for an out-of-range band index.
    pub fn set_band_gain(&self, index: usize, gain_db: f32) -> bool {
        self.engine
            .lock()
            .unwrap()
            .equalizer_mut()
            .set_band_gain(index, gain_db)
    }

    /// Set all ten band gains at once; false unless exactly ten values
    pub fn set_all_gains(&self, gains: &[f32]) -> bool {
        self.engine
            .lock()
            .unwrap()
            .equalizer_mut()
            .set_all_gains(gains)
    }

    /// Get one band's gain in dB
    pub fn band_gain(&self, index: usize) -> Option<f32> {
        self.engine.lock().unwrap().equalizer().band_gain(index)
    }

    /// Get all band gains
    pub fn gains(&self) -> [f32; EQ_BAND_COUNT] {
        self.engine.lock().unwrap().equalizer().gains()
    }

    /// Reset every band to flat
    pub fn reset(&self) {
        self.engine.lock().unwrap().equalizer_mut().reset();
    }

    /// Combined magnitude response for UI plotting: `num_points`
    /// log-spaced frequencies and the chain's gain at each, in dB
    pub fn frequency_response(&self, num_points: usize) -> (Vec<f32>, Vec<f32>) {
        self.engine
            .lock()
            .unwrap()
            .equalizer()
            .frequency_response(num_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_playback::PlayerConfig;

    fn handle() -> Equalizer {
        let engine = Arc::new(Mutex::new(PlaybackEngine::new(&PlayerConfig::default())));
        Equalizer::new(engine)
    }

    #[test]
    fn gain_round_trip_through_the_lock() {
        let eq = handle();

        assert!(eq.set_band_gain(3, 4.5));
        assert_eq!(eq.band_gain(3), Some(4.5));

        // Clones share the bank
        let clone = eq.clone();
        assert_eq!(clone.band_gain(3), Some(4.5));
    }

    #[test]
    fn invalid_index_returns_false() {
        let eq = handle();
        assert!(!eq.set_band_gain(10, 3.0));
        assert_eq!(eq.band_gain(10), None);
    }

    #[test]
    fn clamping_applies() {
        let eq = handle();
        eq.set_band_gain(0, 99.0);
        assert_eq!(eq.band_gain(0), Some(12.0));
    }

    #[test]
    fn reset_flattens() {
        let eq = handle();
        eq.set_all_gains(&[6.0; EQ_BAND_COUNT]);
        eq.reset();
        assert_eq!(eq.gains(), [0.0; EQ_BAND_COUNT]);
    }

    #[test]
    fn response_has_requested_resolution() {
        let eq = handle();
        let (freqs, mags) = eq.frequency_response(128);
        assert_eq!(freqs.len(), 128);
        assert_eq!(mags.len(), 128);
    }
}
