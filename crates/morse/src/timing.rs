//! Morse timing expressed in audio samples.
//!
//! Timing follows the PARIS reference word: 31 signal elements plus 19 gap
//! elements make 50 elements per word, so one element lasts `1.2 / wpm`
//! seconds. Farnsworth timing keeps the elements at 18 WPM and stretches the
//! character and word gaps until the overall rate matches the requested
//! speed, per the ARRL paper "A Standard for Morse Timing Using the
//! Farnsworth Technique" (Jon Bloom, KE3Z).
//!
//! Every duration is rounded to a whole sample on its own. Nothing carries
//! fractional time between durations.

use serde::Serialize;

pub const MIN_WPM: u32 = 5;
pub const MAX_WPM: u32 = 60;
pub const MAX_AMPLITUDE: u32 = 100;

/// Element speed used in Farnsworth mode for slower requested speeds.
pub const FARNSWORTH_WPM: u32 = 18;

/// Maps an amplitude percentage onto the positive half of i16.
const AMPLITUDE_SCALE: f64 = 327.67;

/// Round half up to a whole number of samples.
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn clamp_wpm(wpm: u32) -> u32 {
    wpm.clamp(MIN_WPM, MAX_WPM)
}

pub fn clamp_amplitude(amplitude: u32) -> u32 {
    amplitude.min(MAX_AMPLITUDE)
}

/// Derived timing constants, all durations in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    /// Full-scale tone amplitude.
    pub peak_amplitude: i16,
    /// One dit, and the gap between elements of a character.
    pub bit_time: u32,
    /// Gap between characters.
    pub char_delay: u32,
    /// Gap between words.
    pub word_delay: u32,
}

impl Timing {
    /// Compute timing for the given settings.
    ///
    /// `wpm` is clamped to 5..=60 and `amplitude` to 0..=100 without
    /// complaint. The result depends only on the arguments.
    pub fn compute(wpm: u32, farnsworth: bool, amplitude: u32, sample_rate: u32) -> Self {
        let wpm = clamp_wpm(wpm);
        let amplitude = clamp_amplitude(amplitude);
        let rate = sample_rate as f64;

        let peak_amplitude = round_half_up(amplitude as f64 * AMPLITUDE_SCALE) as i16;

        let stretched = farnsworth && wpm < FARNSWORTH_WPM;
        let effective_wpm = if stretched {
            FARNSWORTH_WPM as f64
        } else {
            wpm as f64
        };

        let element_time = 1.2 / effective_wpm;
        let bit_time = round_half_up(rate * element_time);

        // The 19 gap elements of PARIS absorb the time the faster elements
        // save, so the word still takes 60/wpm seconds.
        let gap_time = if stretched {
            (60.0 / wpm as f64 - 37.2 / effective_wpm) / 19.0
        } else {
            element_time
        };

        let char_delay = round_half_up(rate * gap_time * 3.0);
        let word_delay = round_half_up(rate * gap_time * 7.0);

        Timing {
            peak_amplitude,
            bit_time: to_samples(bit_time),
            char_delay: to_samples(char_delay),
            word_delay: to_samples(word_delay),
        }
    }

    pub fn dit_time(&self) -> u32 {
        self.bit_time
    }

    pub fn dah_time(&self) -> u32 {
        self.bit_time * 3
    }
}

/// Durations never collapse to zero, even at absurd sample rates.
fn to_samples(value: i64) -> u32 {
    value.clamp(1, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    #[test]
    fn test_reference_speeds() {
        let t = Timing::compute(18, false, 85, RATE);
        assert_eq!(t.bit_time, 2940);
        assert_eq!(t.char_delay, 8820);
        assert_eq!(t.word_delay, 20580);

        let t = Timing::compute(20, false, 85, RATE);
        assert_eq!(t.bit_time, 2646);
        assert_eq!(t.char_delay, 7938);
        assert_eq!(t.word_delay, 18522);
        assert_eq!(t.dah_time(), 7938);
    }

    #[test]
    fn test_peak_amplitude() {
        assert_eq!(Timing::compute(20, false, 85, RATE).peak_amplitude, 27852);
        assert_eq!(Timing::compute(20, false, 100, RATE).peak_amplitude, 32767);
        assert_eq!(Timing::compute(20, false, 0, RATE).peak_amplitude, 0);
        assert_eq!(Timing::compute(20, false, 250, RATE).peak_amplitude, 32767);
    }

    #[test]
    fn test_wpm_is_clamped() {
        assert_eq!(
            Timing::compute(1, false, 85, RATE),
            Timing::compute(5, false, 85, RATE)
        );
        assert_eq!(
            Timing::compute(200, false, 85, RATE),
            Timing::compute(60, false, 85, RATE)
        );
    }

    #[test]
    fn test_gaps_follow_element_multiples() {
        for wpm in MIN_WPM..=MAX_WPM {
            let t = Timing::compute(wpm, false, 85, RATE);
            let char_diff = t.char_delay as i64 - 3 * t.bit_time as i64;
            let word_diff = t.word_delay as i64 - 7 * t.bit_time as i64;
            // Each value is rounded on its own, so the multiple can be off by
            // at most half the multiplier.
            assert!(char_diff.abs() <= 1, "wpm {} char diff {}", wpm, char_diff);
            assert!(word_diff.abs() <= 3, "wpm {} word diff {}", wpm, word_diff);
        }
    }

    #[test]
    fn test_independent_rounding_is_preserved() {
        // 13 WPM: 4070.77 samples per element
        let t = Timing::compute(13, false, 85, RATE);
        assert_eq!(t.bit_time, 4071);
        assert_eq!(t.char_delay, 12212);
        assert_eq!(t.word_delay, 28495);
    }

    #[test]
    fn test_farnsworth_pins_element_speed() {
        let reference = Timing::compute(FARNSWORTH_WPM, false, 85, RATE);
        for wpm in MIN_WPM..FARNSWORTH_WPM {
            let plain = Timing::compute(wpm, false, 85, RATE);
            let fw = Timing::compute(wpm, true, 85, RATE);
            assert_eq!(fw.bit_time, reference.bit_time, "wpm {}", wpm);
            assert!(fw.char_delay > plain.char_delay, "wpm {}", wpm);
            assert!(fw.word_delay > plain.word_delay, "wpm {}", wpm);
        }
    }

    #[test]
    fn test_farnsworth_values() {
        let t = Timing::compute(5, true, 85, RATE);
        assert_eq!(t.bit_time, 2940);
        assert_eq!(t.char_delay, 69167);
        assert_eq!(t.word_delay, 161391);
    }

    #[test]
    fn test_farnsworth_ignored_at_or_above_18() {
        for wpm in FARNSWORTH_WPM..=MAX_WPM {
            assert_eq!(
                Timing::compute(wpm, true, 85, RATE),
                Timing::compute(wpm, false, 85, RATE)
            );
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        for wpm in [5, 12, 18, 33, 60] {
            for farnsworth in [false, true] {
                let a = Timing::compute(wpm, farnsworth, 70, 48000);
                let b = Timing::compute(wpm, farnsworth, 70, 48000);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_durations_stay_positive() {
        let t = Timing::compute(60, false, 85, 1);
        assert!(t.bit_time >= 1);
        assert!(t.char_delay >= 1);
        assert!(t.word_delay >= 1);
    }
}
