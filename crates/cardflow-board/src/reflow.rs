#![forbid(unsafe_code)]

//! FLIP reflow animator.
//!
//! A pass is queued with the `before` rectangles of one list, captured just
//! before an order change. After the view has laid out the new order, the
//! next frame measures `after` and, for every participant that moved,
//! emits an `Invert` directive placing it back where it was. The frame after
//! that emits `Play`, easing the offset to zero.
//!
//! # Invariants
//!
//! 1. The excluded (dragged) item never receives a directive.
//! 2. An item has at most one flight. A new pass that moves the item again
//!    replaces its flight and starts from the item's current visual offset;
//!    flights of items the pass does not move keep running.
//! 3. `complete(item, key)` only retires a flight whose key matches, so a
//!    late completion callback from a superseded pass is harmless.
//! 4. `Invert` and `Play` for one flight are never emitted on the same
//!    frame.
//!
//! # Failure Modes
//!
//! - Suppressed pass: dropped without measuring.
//! - Animation disabled or unavailable in the view: pending passes are
//!   dropped and items land in place instantly.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use cardflow_core::animation::{Easing, Tween};
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use tracing::debug;
use web_time::Instant;

use crate::model::{ItemId, ListId};
use crate::snapshot::{self, GeometrySnapshot, GeometrySource};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Duration and curve of one kind of motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl MotionProfile {
    #[must_use]
    pub const fn new(duration_ms: u64, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflowConfig {
    pub enabled: bool,
    /// Moves at or below this many pixels are not animated.
    pub min_delta_px: f32,
    /// Placeholder moving within one list.
    pub reorder: MotionProfile,
    /// Items entering, leaving, or returning to a list.
    pub transfer: MotionProfile,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delta_px: 1.0,
            reorder: MotionProfile::new(200, Easing::EaseOutCubic),
            transfer: MotionProfile::new(350, Easing::EaseInOut),
        }
    }
}

impl ReflowConfig {
    #[must_use]
    pub const fn profile(&self, kind: ReflowKind) -> MotionProfile {
        match kind {
            ReflowKind::Reorder => self.reorder,
            ReflowKind::Transfer => self.transfer,
        }
    }
}

// ---------------------------------------------------------------------------
// Passes and directives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflowKind {
    Reorder,
    Transfer,
}

/// Identity of one reflow pass: list, target index, and participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReflowKey(u64);

impl ReflowKey {
    #[must_use]
    pub fn derive(list: ListId, target_index: usize, participants: &[ItemId]) -> Self {
        let mut hasher = FxHasher::default();
        list.hash(&mut hasher);
        target_index.hash(&mut hasher);
        participants.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for ReflowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One queued pass.
#[derive(Debug, Clone)]
pub struct ReflowRequest {
    pub list: ListId,
    /// Rectangles captured just before the order change.
    pub before: GeometrySnapshot,
    pub kind: ReflowKind,
    /// Index the change targets (candidate or drop position).
    pub target_index: usize,
    /// The dragged item; never animated.
    pub exclude: Option<ItemId>,
    /// Skip this pass; another list owns the visible motion.
    pub suppress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectivePhase {
    /// Jump to `offset` with no transition.
    Invert,
    /// Transition from `offset` to `target` over `duration`.
    Play,
    /// Drop any offset immediately.
    Clear,
}

/// Per-item instruction for the view layer (vertical offset in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationDirective {
    pub item: ItemId,
    pub list: ListId,
    pub key: ReflowKey,
    pub phase: DirectivePhase,
    pub offset: f32,
    pub target: f32,
    pub duration: Duration,
    pub easing: Easing,
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum FlightPhase {
    Inverted { offset: f32 },
    Playing { tween: Tween, started: Instant },
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    list: ListId,
    profile: MotionProfile,
    phase: FlightPhase,
}

impl Flight {
    fn offset_at(&self, now: Instant) -> f32 {
        match self.phase {
            FlightPhase::Inverted { offset } => offset,
            FlightPhase::Playing { tween, started } => {
                tween.value_at(now.saturating_duration_since(started))
            }
        }
    }
}

/// Owns pending passes and the in-flight animation registry, keyed by
/// `(item, pass key)`.
#[derive(Debug, Clone, Default)]
pub struct ReflowAnimator {
    config: ReflowConfig,
    pending: Vec<ReflowRequest>,
    flights: FxHashMap<(ItemId, ReflowKey), Flight>,
}

impl ReflowAnimator {
    #[must_use]
    pub fn new(config: ReflowConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            flights: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ReflowConfig {
        &self.config
    }

    /// Queue a pass for the next frame.
    ///
    /// A second pass for a list that is still pending keeps the first
    /// `before` (it is what the view still shows) and takes the rest from
    /// the newer request. The merged pass is suppressed only if both were.
    pub fn begin(&mut self, request: ReflowRequest) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.list == request.list) {
            pending.kind = request.kind;
            pending.target_index = request.target_index;
            pending.exclude = request.exclude;
            pending.suppress &= request.suppress;
            return;
        }
        self.pending.push(request);
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of items currently inverted or playing.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Measure the new layout of every pending pass and emit `Invert`
    /// directives. Call once the view has rendered the new order.
    pub fn complete_pending<S: GeometrySource + ?Sized>(
        &mut self,
        source: &S,
        now: Instant,
    ) -> Vec<AnimationDirective> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        if !self.config.enabled || !source.animations_available() {
            debug!(
                passes = self.pending.len(),
                enabled = self.config.enabled,
                "reflow animation unavailable, repositioning instantly"
            );
            self.pending.clear();
            return Vec::new();
        }

        let mut directives = Vec::new();
        for pass in std::mem::take(&mut self.pending) {
            if pass.suppress {
                debug!(list = %pass.list, "reflow pass suppressed");
                continue;
            }
            let after = snapshot::capture(source, pass.list);
            self.run_pass(&pass, &after, now, &mut directives);
        }
        directives
    }

    fn run_pass(
        &mut self,
        pass: &ReflowRequest,
        after: &GeometrySnapshot,
        now: Instant,
        directives: &mut Vec<AnimationDirective>,
    ) {
        let participants: Vec<ItemId> = after
            .ids()
            .filter(|&id| Some(id) != pass.exclude && pass.before.contains(id))
            .collect();
        let key = ReflowKey::derive(pass.list, pass.target_index, &participants);
        let profile = self.config.profile(pass.kind);
        let min_delta = self.config.min_delta_px;

        let mut animated = 0usize;
        for id in participants {
            let (Some(before), Some(after)) = (pass.before.get(id), after.get(id)) else {
                continue;
            };
            let layout_delta = before.top - after.top;
            if layout_delta.abs() <= min_delta {
                continue;
            }
            let offset = layout_delta + self.take_flight(id, now);
            if offset.abs() <= min_delta {
                directives.push(AnimationDirective {
                    item: id,
                    list: pass.list,
                    key,
                    phase: DirectivePhase::Clear,
                    offset: 0.0,
                    target: 0.0,
                    duration: Duration::ZERO,
                    easing: profile.easing,
                });
                continue;
            }
            self.flights.insert(
                (id, key),
                Flight {
                    list: pass.list,
                    profile,
                    phase: FlightPhase::Inverted { offset },
                },
            );
            directives.push(AnimationDirective {
                item: id,
                list: pass.list,
                key,
                phase: DirectivePhase::Invert,
                offset,
                target: offset,
                duration: Duration::ZERO,
                easing: profile.easing,
            });
            animated += 1;
        }
        debug!(list = %pass.list, %key, kind = ?pass.kind, animated, "reflow pass measured");
    }

    /// Remove the item's flight, returning its current visual offset.
    fn take_flight(&mut self, item: ItemId, now: Instant) -> f32 {
        let superseded: Vec<(ItemId, ReflowKey)> = self
            .flights
            .keys()
            .filter(|(id, _)| *id == item)
            .copied()
            .collect();
        superseded
            .into_iter()
            .filter_map(|k| self.flights.remove(&k))
            .map(|flight| flight.offset_at(now))
            .sum()
    }

    /// Start `Play` for inverted flights and retire finished ones.
    pub fn advance(&mut self, now: Instant) -> Vec<AnimationDirective> {
        let mut directives = Vec::new();
        self.flights.retain(|&(item, key), flight| match flight.phase {
            FlightPhase::Inverted { offset } => {
                let duration = flight.profile.duration();
                let easing = flight.profile.easing;
                flight.phase = FlightPhase::Playing {
                    tween: Tween::new(offset, 0.0, duration).easing(easing),
                    started: now,
                };
                directives.push(AnimationDirective {
                    item,
                    list: flight.list,
                    key,
                    phase: DirectivePhase::Play,
                    offset,
                    target: 0.0,
                    duration,
                    easing,
                });
                true
            }
            FlightPhase::Playing { tween, started } => {
                now.saturating_duration_since(started) < tween.duration()
            }
        });
        directives.sort_by_key(|d| d.item);
        directives
    }

    /// Current visual offset of `item` (0 when not animating).
    #[must_use]
    pub fn offset(&self, item: ItemId, now: Instant) -> f32 {
        self.flights
            .iter()
            .filter(|((id, _), _)| *id == item)
            .map(|(_, flight)| flight.offset_at(now))
            .sum()
    }

    /// Host reports the transition for `(item, key)` finished.
    pub fn complete(&mut self, item: ItemId, key: ReflowKey) -> bool {
        self.flights.remove(&(item, key)).is_some()
    }

    /// Drop pending passes and every flight (teardown).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.flights.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_core::geometry::Rect;

    const LIST: ListId = ListId::new(1);

    struct Stack {
        ids: Vec<u64>,
        animated: bool,
    }

    impl GeometrySource for Stack {
        fn columns(&self) -> Vec<(ListId, Rect)> {
            vec![(LIST, Rect::new(0.0, 0.0, 280.0, 1000.0))]
        }

        fn items(&self, list: ListId) -> Vec<(ItemId, Rect)> {
            if list != LIST {
                return Vec::new();
            }
            self.ids
                .iter()
                .enumerate()
                .map(|(i, &id)| (ItemId::new(id), Rect::new(0.0, i as f32 * 100.0, 280.0, 100.0)))
                .collect()
        }

        fn animations_available(&self) -> bool {
            self.animated
        }
    }

    fn stack(ids: &[u64]) -> Stack {
        Stack {
            ids: ids.to_vec(),
            animated: true,
        }
    }

    fn request(before: &Stack, suppress: bool) -> ReflowRequest {
        ReflowRequest {
            list: LIST,
            before: snapshot::capture(before, LIST),
            kind: ReflowKind::Reorder,
            target_index: 0,
            exclude: Some(ItemId::new(3)),
            suppress,
        }
    }

    #[test]
    fn moved_siblings_invert_then_play() {
        let t0 = Instant::now();
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2, 3, 4]), false));

        let inverts = animator.complete_pending(&stack(&[3, 1, 2, 4]), t0);
        let ids: Vec<_> = inverts.iter().map(|d| d.item.get()).collect();
        assert_eq!(ids, [1, 2]);
        assert!(inverts.iter().all(|d| d.phase == DirectivePhase::Invert && d.offset == -100.0));
        assert_eq!(animator.offset(ItemId::new(1), t0), -100.0);

        let plays = animator.advance(t0 + Duration::from_millis(16));
        assert_eq!(plays.len(), 2);
        assert!(plays.iter().all(|d| d.phase == DirectivePhase::Play && d.target == 0.0));
        assert_eq!(plays[0].duration, Duration::from_millis(200));

        assert!(animator.advance(t0 + Duration::from_millis(300)).is_empty());
        assert_eq!(animator.in_flight(), 0);
    }

    #[test]
    fn suppressed_pass_emits_nothing() {
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2]), true));
        assert!(animator.complete_pending(&stack(&[2, 1]), Instant::now()).is_empty());
        assert_eq!(animator.pending_len(), 0);
    }

    #[test]
    fn unavailable_animation_degrades_to_instant() {
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2]), false));
        let mut after = stack(&[2, 1]);
        after.animated = false;
        assert!(animator.complete_pending(&after, Instant::now()).is_empty());
        assert_eq!(animator.in_flight(), 0);
    }

    #[test]
    fn superseding_pass_continues_from_current_offset() {
        let t0 = Instant::now();
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2]), false));
        let first = animator.complete_pending(&stack(&[2, 1]), t0);
        let first_key = first[0].key;

        // Item 1 moved back up before playing: offsets cancel out.
        animator.begin(request(&stack(&[2, 1]), false));
        let second = animator.complete_pending(&stack(&[1, 2]), t0);
        assert!(second.iter().all(|d| d.phase == DirectivePhase::Clear));
        assert_eq!(animator.in_flight(), 0);
        assert!(!animator.complete(ItemId::new(1), first_key));
    }

    #[test]
    fn unrelated_flights_survive_a_new_pass() {
        let t0 = Instant::now();
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2, 5, 6]), false));
        animator.complete_pending(&stack(&[2, 1, 5, 6]), t0);
        assert_eq!(animator.in_flight(), 2);

        animator.begin(request(&stack(&[2, 1, 5, 6]), false));
        animator.complete_pending(&stack(&[2, 1, 6, 5]), t0);
        assert_eq!(animator.in_flight(), 4);
    }

    #[test]
    fn completion_requires_matching_key() {
        let t0 = Instant::now();
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2]), false));
        let d = animator.complete_pending(&stack(&[2, 1]), t0);
        let other = ReflowKey::derive(ListId::new(9), 0, &[]);
        assert!(!animator.complete(d[0].item, other));
        assert!(animator.complete(d[0].item, d[0].key));
    }

    #[test]
    fn merged_pending_pass_keeps_first_before() {
        let t0 = Instant::now();
        let mut animator = ReflowAnimator::default();
        animator.begin(request(&stack(&[1, 2]), false));
        animator.begin(request(&stack(&[2, 1]), true));
        assert_eq!(animator.pending_len(), 1);
        assert_eq!(animator.complete_pending(&stack(&[2, 1]), t0).len(), 2);
    }
}
