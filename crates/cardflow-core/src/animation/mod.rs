#![forbid(unsafe_code)]

//! Animation primitives: easing curves and time-driven tweens.
//!
//! Everything here is deterministic: a tween is sampled at an explicit
//! elapsed time, so tests and replays never depend on a wall clock.
//!
//! # Invariants
//!
//! 1. Every easing function maps `0.0 -> 0.0` and `1.0 -> 1.0`.
//! 2. Inputs outside `[0.0, 1.0]` are clamped before evaluation.

mod tween;

use serde::{Deserialize, Serialize};

pub use tween::Tween;

/// Easing function signature.
pub type EasingFn = fn(f32) -> f32;

#[inline]
fn clamp01(t: f32) -> f32 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

pub fn linear(t: f32) -> f32 {
    clamp01(t)
}

pub fn ease_in(t: f32) -> f32 {
    let t = clamp01(t);
    t * t
}

pub fn ease_out(t: f32) -> f32 {
    let t = clamp01(t);
    1.0 - (1.0 - t) * (1.0 - t)
}

pub fn ease_in_out(t: f32) -> f32 {
    let t = clamp01(t);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

pub fn ease_in_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    t * t * t
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Named easing curve, serializable so hosts can map it onto their own
/// transition primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInCubic,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
}

impl Easing {
    /// The function implementing this curve.
    #[must_use]
    pub fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::EaseIn => ease_in,
            Self::EaseOut => ease_out,
            Self::EaseInOut => ease_in_out,
            Self::EaseInCubic => ease_in_cubic,
            Self::EaseOutCubic => ease_out_cubic,
            Self::EaseInOutCubic => ease_in_out_cubic,
        }
    }

    /// Evaluate the curve at `t` (clamped to `[0, 1]`).
    #[inline]
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        (self.function())(t)
    }

    /// Equivalent CSS `transition-timing-function`, for web hosts.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "cubic-bezier(0.11, 0, 0.5, 0)",
            Self::EaseOut => "cubic-bezier(0.5, 1, 0.89, 1)",
            Self::EaseInOut => "cubic-bezier(0.45, 0, 0.55, 1)",
            Self::EaseInCubic => "cubic-bezier(0.32, 0, 0.67, 0)",
            Self::EaseOutCubic => "cubic-bezier(0.33, 1, 0.68, 1)",
            Self::EaseInOutCubic => "cubic-bezier(0.65, 0, 0.35, 1)",
        }
    }

    /// All curves, in declaration order.
    #[must_use]
    pub const fn all() -> [Easing; 7] {
        [
            Self::Linear,
            Self::EaseIn,
            Self::EaseOut,
            Self::EaseInOut,
            Self::EaseInCubic,
            Self::EaseOutCubic,
            Self::EaseInOutCubic,
        ]
    }
}
