//! Synthesized new-message cue.

use std::f32::consts::TAU;
use std::time::Duration;

use crate::{AppError, Result};

/// A decaying sine tone.
///
/// Gain falls exponentially from `start_gain` to `end_gain` across the
/// tone's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueTone {
    /// Oscillator frequency in hertz.
    pub frequency_hz: f32,
    /// Tone length.
    pub duration: Duration,
    /// Gain at the first sample.
    pub start_gain: f32,
    /// Gain reached at the last sample.
    pub end_gain: f32,
}

impl Default for CueTone {
    fn default() -> Self {
        Self {
            frequency_hz: 600.0,
            duration: Duration::from_millis(500),
            start_gain: 0.2,
            end_gain: 0.01,
        }
    }
}

impl CueTone {
    /// Gain at `t` seconds into the tone.
    #[must_use]
    pub fn gain_at(&self, t: f32) -> f32 {
        let total = self.duration.as_secs_f32();
        if total <= 0.0 {
            return self.end_gain;
        }
        let progress = (t / total).clamp(0.0, 1.0);
        self.start_gain * (self.end_gain / self.start_gain).powf(progress)
    }

    /// Render mono PCM samples at `sample_rate`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Notify` if `sample_rate` is zero or the gains are
    /// not positive.
    pub fn samples(&self, sample_rate: u32) -> Result<Vec<f32>> {
        if sample_rate == 0 {
            return Err(AppError::Notify("sample rate must be positive".into()));
        }
        if self.start_gain <= 0.0 || self.end_gain <= 0.0 {
            return Err(AppError::Notify(
                "exponential decay needs positive gains".into(),
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let rate = sample_rate as f32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (self.duration.as_secs_f32() * rate).round() as usize;

        Ok((0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / rate;
                (TAU * self.frequency_hz * t).sin() * self.gain_at(t)
            })
            .collect())
    }
}
