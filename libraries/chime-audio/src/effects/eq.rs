//! 10-band peaking equalizer
//!
//! Fixed-frequency peaking filter bank for the playback render path:
//! - Ten serially chained RBJ peaking biquads
//! - Per-band gain control (-12 to +12 dB), Q fixed at 1.0
//! - Bands within 0.01 dB of flat collapse to identity and are skipped
//! - Combined frequency response query for UI plotting

use std::f32::consts::PI;

/// Number of bands in the bank
pub const EQ_BAND_COUNT: usize = 10;

/// Fixed band center frequencies (Hz)
pub const EQ_BAND_FREQUENCIES: [f32; EQ_BAND_COUNT] = [
    60.0, 170.0, 310.0, 600.0, 1000.0, 3000.0, 6000.0, 12000.0, 14000.0, 16000.0,
];

/// Band gain limit in dB (gains are clamped to +/- this value)
pub const EQ_GAIN_RANGE_DB: f32 = 12.0;

/// Gains within this distance of 0 dB are treated as flat (band bypassed);
/// gain updates within this distance of the current value are no-ops.
const GAIN_EPSILON_DB: f32 = 0.01;

/// Bandwidth of each peak (shared by all bands)
const BAND_Q: f32 = 1.0;

/// One peaking biquad section with per-channel Direct-Form-I state
///
/// Coefficients come from the RBJ cookbook peaking-EQ recipe, normalized by
/// a0. A band whose gain is flat, or whose center frequency cannot be
/// represented at the current sample rate (f0 <= 0 or 2*f0 >= fs), holds
/// identity coefficients and reports itself as bypassed.
#[derive(Debug, Clone)]
struct PeakingBand {
    // Band parameters
    frequency: f32,
    gain_db: f32,
    q: f32,

    // Normalized coefficients (a0 folded in)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Direct-Form-I state, left channel
    x1_l: f32,
    x2_l: f32,
    y1_l: f32,
    y2_l: f32,

    // Direct-Form-I state, right channel
    x1_r: f32,
    x2_r: f32,
    y1_r: f32,
    y2_r: f32,
}

impl PeakingBand {
    fn new(frequency: f32) -> Self {
        Self {
            frequency,
            gain_db: 0.0,
            q: BAND_Q,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1_l: 0.0,
            x2_l: 0.0,
            y1_l: 0.0,
            y2_l: 0.0,
            x1_r: 0.0,
            x2_r: 0.0,
            y1_r: 0.0,
            y2_r: 0.0,
        }
    }

    /// A flat or unrepresentable band passes signal through untouched
    #[inline]
    fn is_bypass(&self) -> bool {
        self.b0 == 1.0 && self.b1 == 0.0 && self.b2 == 0.0 && self.a1 == 0.0 && self.a2 == 0.0
    }

    fn set_identity(&mut self) {
        self.b0 = 1.0;
        self.b1 = 0.0;
        self.b2 = 0.0;
        self.a1 = 0.0;
        self.a2 = 0.0;
    }

    fn update_coefficients(&mut self, sample_rate: f32) {
        if sample_rate < 1.0 {
            return;
        }

        // Flat band: computationally free
        if self.gain_db.abs() < GAIN_EPSILON_DB {
            self.set_identity();
            return;
        }

        // Center frequency must sit strictly below Nyquist; a band that
        // cannot be represented degrades to identity instead of raising
        if self.frequency <= 0.0 || 2.0 * self.frequency >= sample_rate {
            self.set_identity();
            return;
        }

        let a = 10.0_f32.powf(self.gain_db / 40.0);
        let omega = 2.0 * PI * self.frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        // Normalize by a0
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Process one stereo frame
    #[inline]
    fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        // Left channel
        let mut out_l = self.b0 * left + self.b1 * self.x1_l + self.b2 * self.x2_l
            - self.a1 * self.y1_l
            - self.a2 * self.y2_l;

        // Flush denormals so the feedback path never drags the CPU
        if out_l.abs() < 1e-15 {
            out_l = 0.0;
        }

        self.x2_l = self.x1_l;
        self.x1_l = left;
        self.y2_l = self.y1_l;
        self.y1_l = out_l;

        // Right channel
        let mut out_r = self.b0 * right + self.b1 * self.x1_r + self.b2 * self.x2_r
            - self.a1 * self.y1_r
            - self.a2 * self.y2_r;

        if out_r.abs() < 1e-15 {
            out_r = 0.0;
        }

        self.x2_r = self.x1_r;
        self.x1_r = right;
        self.y2_r = self.y1_r;
        self.y1_r = out_r;

        (out_l, out_r)
    }

    /// Zero the filter memory (coefficients untouched)
    fn reset_state(&mut self) {
        self.x1_l = 0.0;
        self.x2_l = 0.0;
        self.y1_l = 0.0;
        self.y2_l = 0.0;
        self.x1_r = 0.0;
        self.x2_r = 0.0;
        self.y1_r = 0.0;
        self.y2_r = 0.0;
    }

    /// Magnitude of this section at normalized angular frequency omega, in dB
    fn magnitude_db_at(&self, omega: f32) -> f32 {
        let (cos1, sin1) = (omega.cos(), omega.sin());
        let (cos2, sin2) = ((2.0 * omega).cos(), (2.0 * omega).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        let num_sq = num_re * num_re + num_im * num_im;
        let den_sq = den_re * den_re + den_im * den_im;

        10.0 * (num_sq / den_sq.max(f32::MIN_POSITIVE)).log10()
    }
}

/// Ten serially chained peaking bands at the fixed frequency list
///
/// Gain updates zero the affected band's filter memory: a coefficient swap
/// mid-ring would otherwise produce a loud click, and the one-sample
/// transient from cleared state is far smaller. Updates that do not change
/// the gain leave the state untouched, so a sustained tone is unaffected.
pub struct EqualizerBank {
    bands: [PeakingBand; EQ_BAND_COUNT],
    sample_rate: u32,
}

impl EqualizerBank {
    /// Create a flat bank tuned to the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let bands = EQ_BAND_FREQUENCIES.map(PeakingBand::new);
        let mut bank = Self { bands, sample_rate };
        bank.retune();
        bank
    }

    /// Get the sample rate the bank is tuned to
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Retune the bank to a new sample rate
    ///
    /// Recomputes every band's coefficients and clears all filter state,
    /// since state from a different rate is meaningless.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.retune();
            self.reset_state();
        }
    }

    fn retune(&mut self) {
        let sr = self.sample_rate as f32;
        for band in &mut self.bands {
            band.update_coefficients(sr);
        }
    }

    /// Set one band's gain in dB
    ///
    /// The gain is clamped to [-12, +12]. Updates within 0.01 dB of the
    /// current value are no-ops and leave the filter state alone. Returns
    /// false for an out-of-range band index.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> bool {
        let Some(band) = self.bands.get_mut(index) else {
            return false;
        };

        let gain_db = gain_db.clamp(-EQ_GAIN_RANGE_DB, EQ_GAIN_RANGE_DB);
        if (gain_db - band.gain_db).abs() < GAIN_EPSILON_DB {
            return true;
        }

        band.gain_db = gain_db;
        band.update_coefficients(self.sample_rate as f32);
        // Clear memory so the coefficient discontinuity cannot ring
        band.reset_state();
        true
    }

    /// Set all ten band gains at once
    ///
    /// Returns false (and changes nothing) unless exactly ten values are
    /// given. Per-band semantics match `set_band_gain`.
    pub fn set_all_gains(&mut self, gains: &[f32]) -> bool {
        if gains.len() != EQ_BAND_COUNT {
            return false;
        }
        for (index, &gain) in gains.iter().enumerate() {
            self.set_band_gain(index, gain);
        }
        true
    }

    /// Get one band's gain in dB
    pub fn band_gain(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(|b| b.gain_db)
    }

    /// Get one band's center frequency in Hz
    pub fn band_frequency(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(|b| b.frequency)
    }

    /// Get all band gains
    pub fn gains(&self) -> [f32; EQ_BAND_COUNT] {
        let mut gains = [0.0; EQ_BAND_COUNT];
        for (slot, band) in gains.iter_mut().zip(self.bands.iter()) {
            *slot = band.gain_db;
        }
        gains
    }

    /// Reset all bands to flat and clear all filter state
    pub fn reset(&mut self) {
        for band in &mut self.bands {
            band.gain_db = 0.0;
            band.set_identity();
            band.reset_state();
        }
    }

    /// Clear all filter state (gains untouched)
    ///
    /// Called on seek and stream reload so no pre-seek sample can leak
    /// into post-seek output.
    pub fn reset_state(&mut self) {
        for band in &mut self.bands {
            band.reset_state();
        }
    }

    /// Process an interleaved stereo buffer in place
    ///
    /// Bands are applied in ascending frequency order; flat bands are
    /// skipped. Never allocates.
    pub fn process(&mut self, buffer: &mut [f32]) {
        for chunk in buffer.chunks_exact_mut(2) {
            let mut left = chunk[0];
            let mut right = chunk[1];

            for band in &mut self.bands {
                if band.is_bypass() {
                    continue;
                }
                (left, right) = band.process_frame(left, right);
            }

            chunk[0] = left;
            chunk[1] = right;
        }
    }

    /// Combined magnitude response of the chain, for UI plotting
    ///
    /// Returns `num_points` log-spaced frequencies from 10 Hz up to Nyquist
    /// together with the chain's magnitude at each, in dB.
    pub fn frequency_response(&self, num_points: usize) -> (Vec<f32>, Vec<f32>) {
        let nyquist = self.sample_rate as f32 / 2.0;
        let min_freq = 10.0_f32.min(nyquist / 2.0);
        let points = num_points.max(2);

        let mut freqs = Vec::with_capacity(points);
        let mut magnitudes = Vec::with_capacity(points);

        let log_min = min_freq.ln();
        let log_max = nyquist.ln();

        for i in 0..points {
            let t = i as f32 / (points - 1) as f32;
            let freq = (log_min + t * (log_max - log_min)).exp();
            let omega = 2.0 * PI * freq / self.sample_rate as f32;

            let mut db = 0.0;
            for band in &self.bands {
                if band.is_bypass() {
                    continue;
                }
                db += band.magnitude_db_at(omega);
            }

            freqs.push(freq);
            magnitudes.push(db);
        }

        (freqs, magnitudes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::{generate_sine_with_amplitude, rms};

    #[test]
    fn band_frequencies_are_fixed_and_ascending() {
        assert_eq!(EQ_BAND_FREQUENCIES.len(), EQ_BAND_COUNT);
        for window in EQ_BAND_FREQUENCIES.windows(2) {
            assert!(window[0] < window[1]);
        }
        assert_eq!(EQ_BAND_FREQUENCIES[0], 60.0);
        assert_eq!(EQ_BAND_FREQUENCIES[9], 16000.0);
    }

    #[test]
    fn new_bank_is_flat() {
        let bank = EqualizerBank::new(44100);
        assert_eq!(bank.gains(), [0.0; EQ_BAND_COUNT]);
        for band in &bank.bands {
            assert!(band.is_bypass());
        }
    }

    #[test]
    fn gain_clamping() {
        let mut bank = EqualizerBank::new(44100);

        assert!(bank.set_band_gain(0, 20.0));
        assert_eq!(bank.band_gain(0), Some(12.0));

        assert!(bank.set_band_gain(0, -20.0));
        assert_eq!(bank.band_gain(0), Some(-12.0));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut bank = EqualizerBank::new(44100);
        let before = bank.gains();

        assert!(!bank.set_band_gain(EQ_BAND_COUNT, 6.0));
        assert!(!bank.set_band_gain(usize::MAX, 6.0));
        assert_eq!(bank.gains(), before);
        assert_eq!(bank.band_gain(EQ_BAND_COUNT), None);
    }

    #[test]
    fn set_all_gains_requires_ten_values() {
        let mut bank = EqualizerBank::new(44100);

        assert!(!bank.set_all_gains(&[1.0; 9]));
        assert!(!bank.set_all_gains(&[1.0; 11]));
        assert_eq!(bank.gains(), [0.0; EQ_BAND_COUNT]);

        let gains = [1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        assert!(bank.set_all_gains(&gains));
        assert_eq!(bank.gains(), gains);
    }

    #[test]
    fn identity_at_zero_gain() {
        let mut bank = EqualizerBank::new(44100);

        // 1 second of deterministic pseudo-noise
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(42);
        let input: Vec<f32> = (0..44100 * 2).map(|_| rng.gen_range(-0.9..0.9)).collect();

        let mut output = input.clone();
        bank.process(&mut output);

        let max_dev = input
            .iter()
            .zip(output.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_dev < 1e-3, "flat bank deviated by {}", max_dev);
    }

    #[test]
    fn tiny_gain_is_bypass() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(4, 0.005);
        assert!(bank.bands[4].is_bypass());
    }

    #[test]
    fn boost_raises_rms_cut_lowers_it() {
        // 60 Hz sine at band 0's center, long enough for the filter to settle
        let input = generate_sine_with_amplitude(60.0, 44100, 0.1, 0.1);
        let input_rms = rms(&input);

        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(0, 12.0);
        let mut boosted = input.clone();
        bank.process(&mut boosted);
        assert!(
            rms(&boosted) > input_rms,
            "+12 dB at center should raise RMS"
        );

        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(0, -12.0);
        let mut cut = input.clone();
        bank.process(&mut cut);
        assert!(rms(&cut) < input_rms, "-12 dB at center should lower RMS");
    }

    #[test]
    fn unchanged_gain_does_not_reset_state() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(0, 6.0);

        let mut buffer = generate_sine_with_amplitude(60.0, 44100, 0.05, 0.5);
        bank.process(&mut buffer);

        let state_before = (bank.bands[0].y1_l, bank.bands[0].y2_l);
        assert_ne!(state_before, (0.0, 0.0));

        // Same value again: must be a no-op, state preserved
        assert!(bank.set_band_gain(0, 6.0));
        assert_eq!((bank.bands[0].y1_l, bank.bands[0].y2_l), state_before);

        // A real change zeroes the memory
        assert!(bank.set_band_gain(0, -6.0));
        assert_eq!((bank.bands[0].y1_l, bank.bands[0].y2_l), (0.0, 0.0));
    }

    #[test]
    fn seek_style_state_reset_clears_memory() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(2, 9.0);

        let mut buffer = generate_sine_with_amplitude(310.0, 44100, 0.05, 0.5);
        bank.process(&mut buffer);
        assert_ne!(bank.bands[2].y1_l, 0.0);

        bank.reset_state();
        assert_eq!(bank.bands[2].y1_l, 0.0);
        assert_eq!(bank.bands[2].x1_r, 0.0);
        // Gains survive a state reset
        assert_eq!(bank.band_gain(2), Some(9.0));
    }

    #[test]
    fn reset_flattens_and_clears() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_all_gains(&[6.0; EQ_BAND_COUNT]);

        let mut buffer = generate_sine_with_amplitude(1000.0, 44100, 0.02, 0.5);
        bank.process(&mut buffer);

        bank.reset();
        assert_eq!(bank.gains(), [0.0; EQ_BAND_COUNT]);
        for band in &bank.bands {
            assert!(band.is_bypass());
            assert_eq!(band.y1_l, 0.0);
        }
    }

    #[test]
    fn band_above_nyquist_degrades_to_identity() {
        // At 22.05 kHz output rate, Nyquist is 11.025 kHz: the top three
        // bands (12, 14, 16 kHz) cannot be represented
        let mut bank = EqualizerBank::new(22050);
        assert!(bank.set_band_gain(9, 12.0));
        assert_eq!(bank.band_gain(9), Some(12.0));
        assert!(bank.bands[9].is_bypass());

        // Processing must remain a pass-through for that band
        let input = generate_sine_with_amplitude(440.0, 22050, 0.02, 0.5);
        let mut output = input.clone();
        bank.process(&mut output);
        for (a, b) in input.iter().zip(output.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn frequency_response_shape() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(4, 12.0); // +12 dB at 1 kHz

        let (freqs, mags) = bank.frequency_response(256);
        assert_eq!(freqs.len(), 256);
        assert_eq!(mags.len(), 256);

        // Peak near 1 kHz should be close to +12 dB; far away, near 0
        let at = |target: f32| {
            let idx = freqs
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    (a.1 - target)
                        .abs()
                        .partial_cmp(&(b.1 - target).abs())
                        .unwrap()
                })
                .map(|(i, _)| i)
                .unwrap();
            mags[idx]
        };

        assert!((at(1000.0) - 12.0).abs() < 1.0);
        assert!(at(60.0).abs() < 1.0);
        assert!(at(16000.0).abs() < 1.0);
    }

    #[test]
    fn flat_bank_response_is_zero_db() {
        let bank = EqualizerBank::new(48000);
        let (_, mags) = bank.frequency_response(64);
        for db in mags {
            assert_eq!(db, 0.0);
        }
    }

    #[test]
    fn retune_clears_state_and_recomputes() {
        let mut bank = EqualizerBank::new(44100);
        bank.set_band_gain(0, 6.0);

        let mut buffer = generate_sine_with_amplitude(60.0, 44100, 0.02, 0.5);
        bank.process(&mut buffer);
        assert_ne!(bank.bands[0].y1_l, 0.0);

        bank.set_sample_rate(48000);
        assert_eq!(bank.sample_rate(), 48000);
        assert_eq!(bank.bands[0].y1_l, 0.0);
        assert_eq!(bank.band_gain(0), Some(6.0));
    }
}
