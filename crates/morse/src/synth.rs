//! Tone and silence sample generation.
//!
//! A tone is a sine at the configured frequency that holds full amplitude and
//! tapers off over its last few samples so the key-up does not click. The
//! taper is one 440 Hz period long whatever the tone frequency.

use std::f64::consts::{FRAC_PI_2, PI};
use std::iter::{repeat, Repeat, Take};

use crate::timing::round_half_up;

/// The release taper lasts one period of this frequency.
pub const FADE_REFERENCE_HZ: u32 = 440;

/// Number of samples in the release taper.
pub fn fade_len(sample_rate: u32) -> u32 {
    sample_rate / FADE_REFERENCE_HZ
}

/// What a tone sounds like; its length is given per tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneShape {
    pub peak_amplitude: i16,
    pub frequency: f64,
    pub sample_rate: u32,
}

/// Lazily generated samples of one tone.
#[derive(Debug, Clone)]
pub struct Tone {
    shape: ToneShape,
    len: u32,
    fade: u32,
    pos: u32,
}

impl Tone {
    pub fn new(shape: ToneShape, len: u32) -> Self {
        Self {
            shape,
            len,
            fade: fade_len(shape.sample_rate),
            pos: 0,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Amplitude envelope at sample `i`.
    ///
    /// Constant peak until the last `fade` samples, then `(1 - sin θ) * peak`
    /// with θ running from 0 towards π/2.
    pub fn envelope(&self, i: u32) -> f64 {
        let peak = self.shape.peak_amplitude as f64;
        if self.fade == 0 {
            return peak;
        }

        let into_fade = i as i64 - self.len as i64 + self.fade as i64;
        if into_fade > 0 {
            let theta = into_fade as f64 * FRAC_PI_2 / self.fade as f64;
            (1.0 - theta.sin()) * peak
        } else {
            peak
        }
    }

    fn sample_at(&self, i: u32) -> i16 {
        let phase =
            2.0 * PI * i as f64 * self.shape.frequency / self.shape.sample_rate as f64;
        round_half_up(self.envelope(i) * phase.sin()) as i16
    }
}

impl Iterator for Tone {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.pos >= self.len {
            return None;
        }
        let sample = self.sample_at(self.pos);
        self.pos += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.len - self.pos) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Tone {}

/// `len` zero samples.
pub fn silence(len: u32) -> Take<Repeat<i16>> {
    repeat(0).take(len as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(peak: i16) -> ToneShape {
        ToneShape {
            peak_amplitude: peak,
            frequency: 800.0,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_fade_len() {
        assert_eq!(fade_len(44100), 100);
        assert_eq!(fade_len(48000), 109);
        assert_eq!(fade_len(8000), 18);
    }

    #[test]
    fn test_tone_length_is_exact() {
        let tone = Tone::new(shape(27852), 2646);
        assert_eq!(tone.len(), 2646);
        assert_eq!(tone.count(), 2646);
    }

    #[test]
    fn test_tone_starts_at_zero_crossing() {
        let mut tone = Tone::new(shape(27852), 500);
        assert_eq!(tone.next(), Some(0));
    }

    #[test]
    fn test_envelope_constant_before_taper() {
        let tone = Tone::new(shape(27852), 1000);
        for i in 0..=900 {
            assert_eq!(tone.envelope(i), 27852.0, "sample {}", i);
        }
    }

    #[test]
    fn test_envelope_tapers_monotonically() {
        let tone = Tone::new(shape(27852), 1000);
        let mut previous = tone.envelope(900);
        for i in 901..1000 {
            let current = tone.envelope(i);
            assert!(current <= previous, "envelope rose at sample {}", i);
            assert!(current >= 0.0);
            previous = current;
        }
        assert!(tone.envelope(999) < 27852.0 * 0.01);
    }

    #[test]
    fn test_samples_bounded_by_envelope() {
        let tone = Tone::new(shape(27852), 1000);
        let samples: Vec<i16> = tone.clone().collect();
        for (i, sample) in samples.iter().enumerate() {
            let limit = tone.envelope(i as u32) + 0.5;
            assert!(
                (*sample as f64).abs() <= limit,
                "sample {} = {} exceeds {}",
                i,
                sample,
                limit
            );
        }
        let loudest = samples[..900].iter().map(|s| s.unsigned_abs()).max().unwrap();
        // 800 Hz at 44.1 kHz lands close to the crest within a few periods
        assert!(loudest > 27000, "loudest sample {}", loudest);
    }

    #[test]
    fn test_sample_values() {
        let tone = Tone::new(shape(10000), 1000);
        let samples: Vec<i16> = tone.take(3).collect();
        let expected: Vec<i16> = (0..3)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 * 800.0 / 44100.0;
                (10000.0 * phase.sin() + 0.5).floor() as i16
            })
            .collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_short_tone_starts_inside_taper() {
        let tone = Tone::new(shape(1000), 50);
        assert!(tone.envelope(0) < 1000.0);
        assert_eq!(tone.count(), 50);
    }

    #[test]
    fn test_zero_amplitude_is_silent() {
        assert!(Tone::new(shape(0), 300).all(|s| s == 0));
    }

    #[test]
    fn test_silence() {
        let samples: Vec<i16> = silence(5).collect();
        assert_eq!(samples, vec![0; 5]);
        assert_eq!(silence(0).count(), 0);
    }
}
