#![forbid(unsafe_code)]

//! Drag session lifecycle.
//!
//! ```text
//! Idle -> Dragging -> PreviewingInList <-> PreviewingTrash
//!             \              |                  |
//!              \-------------+---- drop/cancel -+--> Settling -> Idle
//! ```
//!
//! Every call returns a [`DragTransition`] carrying `from`, `to`, and the
//! effect. Inputs that do not apply in the current phase are reported as
//! [`DragEffect::Noop`] with an explicit [`NoopReason`]; they are never
//! errors.
//!
//! # Invariants
//!
//! 1. At most one session exists.
//! 2. In `PreviewingTrash` the candidate is `None`.
//! 3. Every path out of an active phase reaches `Settling`, and `Settling`
//!    always reaches `Idle` (deadline via [`DragMachine::tick`] or the
//!    generation-tagged timer via [`DragMachine::fire_settle`]).
//! 4. A settle timer from an earlier generation never affects a later
//!    session.

use std::time::Duration;

use cardflow_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use web_time::Instant;

use crate::gate::{GateConfig, GateDecision, HysteresisGate, RejectReason};
use crate::model::{ItemId, ListId};
use crate::resolver::{self, Candidate, ResolverConfig};
use crate::snapshot::BoardGeometry;

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;

/// Lifecycle knobs for one drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the dropped item stays suppressed before returning to Idle.
    pub settle_delay_ms: u64,
    /// Pointer travel from the press before a drag starts; 0 starts at once.
    pub activation_distance: f32,
    /// Drop with no accepted candidate appends to the last resolved list
    /// instead of cancelling.
    pub append_on_unresolved_drop: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            activation_distance: 0.0,
            append_on_unresolved_drop: true,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
    PreviewingInList,
    PreviewingTrash,
    Settling,
}

impl DragPhase {
    /// Dragging or previewing.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Dragging | Self::PreviewingInList | Self::PreviewingTrash
        )
    }
}

/// Explicit no-op diagnostics for inputs that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    IdleWithoutActiveDrag,
    SettlingWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    PreviewUnchanged,
    BelowHysteresis,
    Throttled,
    StaleSettleTimer,
}

impl From<RejectReason> for NoopReason {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::WithinHysteresis => Self::BelowHysteresis,
            RejectReason::Throttled => Self::Throttled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The input stream reported a cancel (escape, lost capture).
    PointerCancel,
    /// Window or view lost focus.
    Blur,
    /// The host asked for it, e.g. the owning view is closing.
    Host,
    /// Forced teardown.
    Teardown,
}

/// What a drop resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    Delete {
        item: ItemId,
    },
    Move {
        item: ItemId,
        source: ListId,
        target: Candidate,
    },
    /// No candidate was ever accepted; append to the last resolved list.
    Append {
        item: ItemId,
        source: ListId,
        target: ListId,
    },
    Cancelled {
        item: ItemId,
        source: ListId,
    },
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        item: ItemId,
        list: ListId,
        index: usize,
    },
    CandidateChanged {
        previous: Option<Candidate>,
        candidate: Candidate,
    },
    CandidateCleared {
        previous: Option<Candidate>,
    },
    EnteredTrash {
        previous: Option<Candidate>,
    },
    Dropped {
        outcome: DropOutcome,
    },
    Canceled {
        item: Option<ItemId>,
        reason: CancelReason,
        /// Candidate displayed at the moment of cancellation.
        previous: Option<Candidate>,
    },
    Settled {
        item: Option<ItemId>,
    },
    Noop {
        reason: NoopReason,
    },
}

/// One state-machine transition with telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub generation: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

impl DragTransition {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }
}

/// Transient state of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub item: ItemId,
    pub source_list: ListId,
    pub source_index: usize,
    /// Pointer position when the drag started.
    pub origin: Point,
    pub pointer: Point,
    pub candidate: Option<Candidate>,
    pub over_trash: bool,
    /// List the resolver last pointed at, accepted or not.
    pub last_resolved: Option<ListId>,
    /// The dragged item's box at drag start.
    pub ghost_origin: Rect,
}

impl DragSession {
    /// Ghost box, following the pointer by its travel since drag start.
    #[must_use]
    pub fn ghost(&self) -> Rect {
        let (dx, dy) = self.pointer.delta_from(self.origin);
        self.ghost_origin.translate(dx, dy)
    }
}

/// Handle for the host's settle timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimer {
    pub generation: u64,
    pub deadline: Instant,
}

/// What a new drag starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStart {
    pub item: ItemId,
    pub list: ListId,
    pub index: usize,
    pub pointer: Point,
    pub ghost: Rect,
}

/// Runtime lifecycle machine for one-at-a-time drag gestures.
#[derive(Debug, Clone)]
pub struct DragMachine {
    phase: DragPhase,
    session: Option<DragSession>,
    settle: Option<SettleTimer>,
    gate: HysteresisGate,
    resolver: ResolverConfig,
    config: SessionConfig,
    generation: u64,
    transition_counter: u64,
}

impl Default for DragMachine {
    fn default() -> Self {
        Self::new(
            SessionConfig::default(),
            ResolverConfig::default(),
            GateConfig::default(),
        )
    }
}

impl DragMachine {
    #[must_use]
    pub fn new(config: SessionConfig, resolver: ResolverConfig, gate: GateConfig) -> Self {
        Self {
            phase: DragPhase::Idle,
            session: None,
            settle: None,
            gate: HysteresisGate::new(gate),
            resolver,
            config,
            generation: 0,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.phase
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn candidate(&self) -> Option<Candidate> {
        self.session.and_then(|s| s.candidate)
    }

    /// Session counter; bumped on every drag start.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// The pending settle timer, if Settling.
    #[must_use]
    pub fn settle_timer(&self) -> Option<SettleTimer> {
        self.settle
    }

    /// The item held invisible while Settling.
    #[must_use]
    pub fn suppressed_item(&self) -> Option<ItemId> {
        match self.phase {
            DragPhase::Settling => self.session.map(|s| s.item),
            _ => None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Begin a drag. A pending settle is superseded; an active drag wins
    /// and the call is a no-op.
    pub fn start_drag(&mut self, start: DragStart) -> DragTransition {
        let from = self.phase;
        match from {
            DragPhase::Dragging | DragPhase::PreviewingInList | DragPhase::PreviewingTrash => {
                debug!(item = %start.item, "drag start ignored, session already active");
                return self.noop(NoopReason::ActiveDragAlreadyInProgress);
            }
            DragPhase::Settling => {
                debug!(generation = self.generation, "pending settle superseded by new drag");
            }
            DragPhase::Idle => {}
        }

        self.generation = self.generation.wrapping_add(1);
        self.settle = None;
        self.gate.reset();
        self.session = Some(DragSession {
            item: start.item,
            source_list: start.list,
            source_index: start.index,
            origin: start.pointer,
            pointer: start.pointer,
            candidate: None,
            over_trash: false,
            last_resolved: None,
            ghost_origin: start.ghost,
        });
        self.phase = DragPhase::Dragging;
        self.emit(
            from,
            DragEffect::Started {
                item: start.item,
                list: start.list,
                index: start.index,
            },
        )
    }

    /// Track the pointer against the current layout.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        geometry: &BoardGeometry,
        now: Instant,
    ) -> DragTransition {
        let from = self.phase;
        let Some(mut session) = self.session.filter(|_| from.is_active()) else {
            return self.noop(self.inactive_reason());
        };
        session.pointer = pointer;
        let previous = session.candidate;

        if geometry.over_trash(pointer) {
            session.candidate = None;
            session.over_trash = true;
            self.session = Some(session);
            if from == DragPhase::PreviewingTrash {
                return self.noop(NoopReason::PreviewUnchanged);
            }
            self.phase = DragPhase::PreviewingTrash;
            return self.emit(from, DragEffect::EnteredTrash { previous });
        }
        session.over_trash = false;

        let Some(resolution) = resolver::resolve(geometry, pointer, Some(session.item), &self.resolver)
        else {
            session.candidate = None;
            self.session = Some(session);
            if from == DragPhase::Dragging {
                return self.noop(NoopReason::PreviewUnchanged);
            }
            self.phase = DragPhase::Dragging;
            return self.emit(from, DragEffect::CandidateCleared { previous });
        };
        session.last_resolved = Some(resolution.candidate.list);

        let decision = self.gate.accept(
            resolution.candidate,
            previous,
            pointer.y,
            resolution.boundary_y,
            now,
        );
        match decision {
            GateDecision::Accepted(reason) => {
                session.candidate = Some(resolution.candidate);
                self.session = Some(session);
                self.phase = DragPhase::PreviewingInList;
                debug!(
                    list = %resolution.candidate.list,
                    index = resolution.candidate.index,
                    ?reason,
                    "candidate accepted"
                );
                self.emit(
                    from,
                    DragEffect::CandidateChanged {
                        previous,
                        candidate: resolution.candidate,
                    },
                )
            }
            GateDecision::Rejected(reason) => {
                self.session = Some(session);
                trace!(
                    list = %resolution.candidate.list,
                    index = resolution.candidate.index,
                    ?reason,
                    "candidate held back"
                );
                self.noop(reason.into())
            }
            GateDecision::Unchanged => {
                self.session = Some(session);
                self.noop(NoopReason::PreviewUnchanged)
            }
        }
    }

    /// Release the pointer. Always ends in Settling when a drag is active.
    pub fn drop(&mut self, now: Instant) -> DragTransition {
        let from = self.phase;
        let Some(session) = self.session.filter(|_| from.is_active()) else {
            return self.noop(self.inactive_reason());
        };

        let outcome = match (from, session.candidate, session.last_resolved) {
            (DragPhase::PreviewingTrash, _, _) => DropOutcome::Delete { item: session.item },
            (_, Some(target), _) => DropOutcome::Move {
                item: session.item,
                source: session.source_list,
                target,
            },
            (_, None, Some(target)) if self.config.append_on_unresolved_drop => {
                DropOutcome::Append {
                    item: session.item,
                    source: session.source_list,
                    target,
                }
            }
            _ => DropOutcome::Cancelled {
                item: session.item,
                source: session.source_list,
            },
        };
        info!(item = %session.item, ?outcome, "drag dropped");
        self.enter_settling(now);
        self.emit(from, DragEffect::Dropped { outcome })
    }

    /// Abort the active drag without a commit.
    pub fn cancel(&mut self, reason: CancelReason, now: Instant) -> DragTransition {
        let from = self.phase;
        let Some(session) = self.session.filter(|_| from.is_active()) else {
            return self.noop(self.inactive_reason());
        };
        info!(item = %session.item, ?reason, "drag cancelled");
        self.enter_settling(now);
        self.emit(
            from,
            DragEffect::Canceled {
                item: Some(session.item),
                reason,
                previous: session.candidate,
            },
        )
    }

    /// Finish Settling once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<DragTransition> {
        let timer = self.settle?;
        (now >= timer.deadline).then(|| self.settle_now())
    }

    /// Host timer callback for the settle started in `generation`.
    pub fn fire_settle(&mut self, generation: u64) -> DragTransition {
        match self.settle {
            Some(timer) if timer.generation == generation => self.settle_now(),
            _ => {
                debug!(
                    generation,
                    current = self.generation,
                    "stale settle timer ignored"
                );
                self.noop(NoopReason::StaleSettleTimer)
            }
        }
    }

    /// Return to Idle from anywhere (teardown). `None` when already Idle.
    pub fn force_idle(&mut self) -> Option<DragTransition> {
        let from = self.phase;
        if from == DragPhase::Idle {
            return None;
        }
        let item = self.session.map(|s| s.item);
        let previous = self.candidate();
        self.reset();
        Some(self.emit(
            from,
            DragEffect::Canceled {
                item,
                reason: CancelReason::Teardown,
                previous,
            },
        ))
    }

    fn enter_settling(&mut self, now: Instant) {
        self.phase = DragPhase::Settling;
        self.settle = Some(SettleTimer {
            generation: self.generation,
            deadline: now + self.config.settle_delay(),
        });
    }

    fn settle_now(&mut self) -> DragTransition {
        let from = self.phase;
        let item = self.session.map(|s| s.item);
        self.reset();
        info!(generation = self.generation, "drag settled");
        self.emit(from, DragEffect::Settled { item })
    }

    fn reset(&mut self) {
        self.phase = DragPhase::Idle;
        self.session = None;
        self.settle = None;
        self.gate.reset();
    }

    fn inactive_reason(&self) -> NoopReason {
        match self.phase {
            DragPhase::Settling => NoopReason::SettlingWithoutActiveDrag,
            _ => NoopReason::IdleWithoutActiveDrag,
        }
    }

    fn noop(&mut self, reason: NoopReason) -> DragTransition {
        self.emit(self.phase, DragEffect::Noop { reason })
    }

    fn emit(&mut self, from: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DragTransition {
            transition_id: self.transition_counter,
            generation: self.generation,
            from,
            to: self.phase,
            effect,
        };
        if !transition.is_noop() {
            debug!(
                transition_id = transition.transition_id,
                generation = transition.generation,
                from = ?transition.from,
                to = ?transition.to,
                effect = ?transition.effect,
                "drag transition"
            );
        }
        transition
    }
}
