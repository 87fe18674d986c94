#![forbid(unsafe_code)]

//! Hysteresis and throttle gate for candidate changes.
//!
//! Decides whether a freshly resolved candidate may replace the displayed
//! one. Within one list a change is held back while the pointer is closer
//! than `hysteresis_px` to the deciding midpoint, and changes are spaced at
//! least `min_interval_ms` apart. A first candidate or a switch of list is
//! always accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::resolver::Candidate;

pub const DEFAULT_HYSTERESIS_PX: f32 = 8.0;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Dead band around a swap boundary, in pixels.
    pub hysteresis_px: f32,
    /// Minimum spacing between accepted changes within one list.
    pub min_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            hysteresis_px: DEFAULT_HYSTERESIS_PX,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl GateConfig {
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Why a candidate was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptReason {
    FirstCandidate,
    ListChanged,
    Settled,
}

/// Why a candidate was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    WithinHysteresis,
    Throttled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum GateDecision {
    Accepted(AcceptReason),
    Rejected(RejectReason),
    /// Same as the displayed candidate; nothing to do.
    Unchanged,
}

impl GateDecision {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Stateful gate; remembers when it last accepted a change.
#[derive(Debug, Clone, Default)]
pub struct HysteresisGate {
    config: GateConfig,
    last_accepted: Option<Instant>,
}

impl HysteresisGate {
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            last_accepted: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether `candidate` replaces `previous`.
    ///
    /// `boundary_y` is the midpoint that separates the two candidates (the
    /// one nearest the pointer); `None` disables the hysteresis check.
    pub fn accept(
        &mut self,
        candidate: Candidate,
        previous: Option<Candidate>,
        pointer_y: f32,
        boundary_y: Option<f32>,
        now: Instant,
    ) -> GateDecision {
        let decision = match previous {
            Some(previous) if previous == candidate => return GateDecision::Unchanged,
            None => GateDecision::Accepted(AcceptReason::FirstCandidate),
            Some(previous) if previous.list != candidate.list => {
                GateDecision::Accepted(AcceptReason::ListChanged)
            }
            Some(_) => self.same_list(pointer_y, boundary_y, now),
        };
        if decision.is_accepted() {
            self.last_accepted = Some(now);
        }
        decision
    }

    fn same_list(&self, pointer_y: f32, boundary_y: Option<f32>, now: Instant) -> GateDecision {
        if let Some(boundary) = boundary_y
            && (pointer_y - boundary).abs() < self.config.hysteresis_px
        {
            return GateDecision::Rejected(RejectReason::WithinHysteresis);
        }
        if let Some(last) = self.last_accepted
            && now.saturating_duration_since(last) < self.config.min_interval()
        {
            return GateDecision::Rejected(RejectReason::Throttled);
        }
        GateDecision::Accepted(AcceptReason::Settled)
    }

    /// Forget the last accepted change (new gesture).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListId;

    const LIST: ListId = ListId::new(1);

    fn at(index: usize) -> Candidate {
        Candidate::new(LIST, index)
    }

    #[test]
    fn first_and_cross_list_always_accept() {
        let t0 = Instant::now();
        let mut gate = HysteresisGate::default();
        assert_eq!(
            gate.accept(at(1), None, 100.0, Some(100.0), t0),
            GateDecision::Accepted(AcceptReason::FirstCandidate)
        );
        let other = Candidate::new(ListId::new(2), 0);
        assert_eq!(
            gate.accept(other, Some(at(1)), 100.0, Some(100.0), t0),
            GateDecision::Accepted(AcceptReason::ListChanged)
        );
    }

    #[test]
    fn identical_candidate_is_unchanged() {
        let mut gate = HysteresisGate::default();
        let t0 = Instant::now();
        assert_eq!(
            gate.accept(at(2), Some(at(2)), 0.0, None, t0),
            GateDecision::Unchanged
        );
    }

    #[test]
    fn throttle_holds_rapid_changes() {
        let t0 = Instant::now();
        let mut gate = HysteresisGate::default();
        gate.accept(at(1), None, 60.0, Some(50.0), t0);
        assert_eq!(
            gate.accept(at(2), Some(at(1)), 180.0, Some(150.0), t0 + Duration::from_millis(10)),
            GateDecision::Rejected(RejectReason::Throttled)
        );
        assert!(
            gate.accept(at(2), Some(at(1)), 180.0, Some(150.0), t0 + Duration::from_millis(40))
                .is_accepted()
        );
    }

    #[test]
    fn hysteresis_band_around_boundary() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(50);
        let mut gate = HysteresisGate::default();
        gate.accept(at(1), None, 100.0, Some(100.0), t0);

        for y in 93..=107 {
            assert_eq!(
                gate.accept(at(2), Some(at(1)), y as f32, Some(100.0), later),
                GateDecision::Rejected(RejectReason::WithinHysteresis),
                "y = {y}"
            );
        }
        assert_eq!(
            gate.accept(at(0), Some(at(1)), 80.0, Some(100.0), later),
            GateDecision::Accepted(AcceptReason::Settled)
        );
    }

    #[test]
    fn reset_forgets_last_acceptance() {
        let t0 = Instant::now();
        let mut gate = HysteresisGate::default();
        gate.accept(at(1), None, 60.0, None, t0);
        gate.reset();
        assert!(gate.accept(at(2), Some(at(1)), 180.0, None, t0).is_accepted());
    }
}
