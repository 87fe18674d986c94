#![forbid(unsafe_code)]

//! Scalar tween: eases a value from `from` to `to` over a fixed duration.
//!
//! A tween holds no clock. Callers sample it with [`Tween::value_at`] using
//! the time elapsed since they started it.
//!
//! # Failure Modes
//!
//! - Zero duration: clamped to 1ns, so any positive elapsed time lands on
//!   `to`.
//! - Elapsed past the duration: saturates at `to`.

use std::time::Duration;

use super::Easing;

/// Eases a scalar (typically a pixel offset) between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// Create a tween from `from` to `to` over `duration`.
    #[must_use]
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: Easing::default(),
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Interpolated value `elapsed` after the start.
    #[must_use]
    pub fn value_at(&self, elapsed: Duration) -> f32 {
        let t = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32;
        self.from + (self.to - self.from) * self.easing.apply(t)
    }
}
