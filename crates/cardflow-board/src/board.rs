#![forbid(unsafe_code)]

//! Board orchestrator.
//!
//! [`Board`] owns the model, the drag machine, the snapshot store, and the
//! reflow animator. The host feeds it normalized pointer events and frame
//! ticks together with a [`GeometrySource`] for the current layout, renders
//! [`Board::preview_order`] and the emitted [`AnimationDirective`]s, and
//! executes emitted [`CommitRequest`]s against its store.
//!
//! # Host loop
//!
//! ```text
//! pointer event ──> handle_pointer ──> BoardOutput { transitions, commit, listener, settle_timer }
//! after render  ──> frame          ──> FrameOutput { directives, transitions, listener }
//! store result  ──> complete_commit
//! ```

use cardflow_core::event::{PointerEvent, PointerPhase};
use cardflow_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::config::{BoardConfig, ConfigError};
use crate::error::{BoardError, Result};
use crate::model::{BoardModel, ItemId, ListId};
use crate::reflow::{AnimationDirective, ReflowAnimator, ReflowKey, ReflowKind, ReflowRequest};
use crate::resolver::{self, Candidate};
use crate::session::{
    CancelReason, DragEffect, DragMachine, DragStart, DragTransition, DropOutcome, SettleTimer,
};
use crate::snapshot::{self, BoardGeometry, GeometrySource, SnapshotStore};
use crate::store::{BoardStore, CommitId, CommitOp, CommitRequest, StoreError};

/// Pointer subscription requests for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerCommand {
    /// Start delivering board-wide move/up/cancel events.
    Attach,
    /// Stop delivering them.
    Detach,
}

/// One rendered slot of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSlot {
    Item(ItemId),
    /// Where the dragged item would land; same size as the dragged item.
    Placeholder,
}

/// Result of one input call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardOutput {
    pub transitions: Vec<DragTransition>,
    /// Store call to execute; report back with [`Board::complete_commit`].
    pub commit: Option<CommitRequest>,
    pub listener: Option<ListenerCommand>,
    /// Timer to arm; fire with [`Board::fire_settle`].
    pub settle_timer: Option<SettleTimer>,
}

/// Result of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    pub directives: Vec<AnimationDirective>,
    pub transitions: Vec<DragTransition>,
    pub listener: Option<ListenerCommand>,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    item: ItemId,
    origin: Point,
}

/// The drag-reorder engine for one board.
#[derive(Debug, Clone)]
pub struct Board {
    /// Optimistic order: `confirmed` with every pending commit applied.
    model: BoardModel,
    /// Order as acknowledged by the store.
    confirmed: BoardModel,
    config: BoardConfig,
    machine: DragMachine,
    snapshots: SnapshotStore,
    animator: ReflowAnimator,
    press: Option<Press>,
    pending: Vec<CommitRequest>,
    next_commit: u64,
    listening: bool,
}

impl Board {
    /// Board with the default configuration.
    #[must_use]
    pub fn new(model: BoardModel) -> Self {
        Self::build(model, BoardConfig::default())
    }

    /// Board with a validated configuration.
    pub fn with_config(
        model: BoardModel,
        config: BoardConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::build(model, config.validated()?))
    }

    /// Read columns and items from `store`.
    pub fn load<S: BoardStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self::new(BoardModel::load(store)?))
    }

    fn build(model: BoardModel, config: BoardConfig) -> Self {
        Self {
            confirmed: model.clone(),
            model,
            machine: DragMachine::new(config.session, config.resolver, config.gate),
            animator: ReflowAnimator::new(config.reflow),
            snapshots: SnapshotStore::new(),
            config,
            press: None,
            pending: Vec::new(),
            next_commit: 0,
            listening: false,
        }
    }

    #[must_use]
    pub fn model(&self) -> &BoardModel {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn machine(&self) -> &DragMachine {
        &self.machine
    }

    #[must_use]
    pub fn candidate(&self) -> Option<Candidate> {
        self.machine.candidate()
    }

    /// Whether board-wide pointer listeners should currently be attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Commits emitted but not yet reported back.
    #[must_use]
    pub fn pending_commits(&self) -> usize {
        self.pending.len()
    }

    // -----------------------------------------------------------------------
    // Rendering output
    // -----------------------------------------------------------------------

    /// What `list` should render right now.
    ///
    /// While a drag is active the dragged item is out of flow everywhere and
    /// a placeholder sits at the candidate. Otherwise this is the model
    /// order (while Settling, see [`Board::suppressed_item`]).
    #[must_use]
    pub fn preview_order(&self, list: ListId) -> Vec<PreviewSlot> {
        let Some(items) = self.model.items(list) else {
            return Vec::new();
        };
        let session = self.machine.session().filter(|_| self.machine.is_active());
        let Some(session) = session else {
            return items.iter().map(|item| PreviewSlot::Item(item.id)).collect();
        };

        let mut slots: Vec<PreviewSlot> = items
            .iter()
            .filter(|item| item.id != session.item)
            .map(|item| PreviewSlot::Item(item.id))
            .collect();
        if let Some(candidate) = session.candidate.filter(|c| c.list == list) {
            let index = candidate.index.min(slots.len());
            slots.insert(index, PreviewSlot::Placeholder);
        }
        slots
    }

    /// Item to render invisible (the just-dropped item while Settling).
    #[must_use]
    pub fn suppressed_item(&self) -> Option<ItemId> {
        self.machine.suppressed_item()
    }

    /// Ghost rectangle following the pointer during a drag.
    #[must_use]
    pub fn ghost(&self) -> Option<Rect> {
        self.machine
            .session()
            .filter(|_| self.machine.is_active())
            .map(|session| session.ghost())
    }

    /// Current reflow offset of `item`, for hosts that animate per frame.
    #[must_use]
    pub fn animation_offset(&self, item: ItemId, now: Instant) -> f32 {
        self.animator.offset(item, now)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Route one normalized pointer event.
    pub fn handle_pointer<S: GeometrySource + ?Sized>(
        &mut self,
        event: PointerEvent,
        source: &S,
        now: Instant,
    ) -> Result<BoardOutput> {
        let point = event.position();
        match event.phase {
            PointerPhase::Start => self.press_at(point, source),
            PointerPhase::Move => self.pointer_moved(point, source, now),
            PointerPhase::End => self.release(point, source, now),
            PointerPhase::Cancel => Ok(self.cancel_with(CancelReason::PointerCancel, source, now)),
        }
    }

    fn press_at<S: GeometrySource + ?Sized>(
        &mut self,
        point: Point,
        source: &S,
    ) -> Result<BoardOutput> {
        let geometry = snapshot::capture_all(source);
        let Some((_, item, _)) = resolver::item_at(&geometry, point) else {
            debug!(x = point.x, y = point.y, "press outside any item");
            return Ok(BoardOutput::default());
        };
        if self.machine.is_active() || self.config.session.activation_distance <= 0.0 {
            return self.start_drag(item, point, source);
        }
        self.press = Some(Press {
            item,
            origin: point,
        });
        Ok(BoardOutput {
            listener: self.attach(),
            ..BoardOutput::default()
        })
    }

    /// Start dragging `item` with the pointer at `pointer`.
    ///
    /// Ignored (no-op transition) while another drag is active. A pending
    /// settle from the previous gesture is superseded.
    pub fn start_drag<S: GeometrySource + ?Sized>(
        &mut self,
        item: ItemId,
        pointer: Point,
        source: &S,
    ) -> Result<BoardOutput> {
        let (list, index) = self.model.locate(item).ok_or(BoardError::UnknownItem(item))?;
        let mut output = BoardOutput::default();
        if self.machine.is_active() {
            output.transitions.push(self.machine.start_drag(DragStart {
                item,
                list,
                index,
                pointer,
                ghost: Rect::at_point(pointer),
            }));
            return Ok(output);
        }

        self.press = None;
        let start = self.snapshots.record_drag_start(source);
        let ghost = start
            .item_rect(item)
            .unwrap_or_else(|| Rect::at_point(pointer));
        let before = start
            .column(list)
            .map(|column| column.items.clone())
            .unwrap_or_default();

        output.transitions.push(self.machine.start_drag(DragStart {
            item,
            list,
            index,
            pointer,
            ghost,
        }));
        self.animator.begin(ReflowRequest {
            list,
            before,
            kind: ReflowKind::Transfer,
            target_index: index,
            exclude: Some(item),
            suppress: false,
        });
        output.listener = self.attach();
        debug!(item = %item, list = %list, index, "drag started");
        Ok(output)
    }

    fn pointer_moved<S: GeometrySource + ?Sized>(
        &mut self,
        point: Point,
        source: &S,
        now: Instant,
    ) -> Result<BoardOutput> {
        if let Some(press) = self.press
            && !self.machine.is_active()
        {
            if point.distance(press.origin) < self.config.session.activation_distance {
                return Ok(BoardOutput::default());
            }
            let mut output = self.start_drag(press.item, press.origin, source)?;
            output.transitions.push(self.track(point, source, now));
            return Ok(output);
        }
        Ok(BoardOutput {
            transitions: vec![self.track(point, source, now)],
            ..BoardOutput::default()
        })
    }

    /// Feed the pointer to the machine and queue the reflow passes its
    /// preview change implies.
    fn track<S: GeometrySource + ?Sized>(
        &mut self,
        point: Point,
        source: &S,
        now: Instant,
    ) -> DragTransition {
        let geometry = snapshot::capture_all(source);
        let transition = self.machine.pointer_move(point, &geometry, now);
        let dragged = self.machine.session().map(|s| s.item);

        let mut passes: Vec<(ListId, ReflowKind, usize)> = Vec::with_capacity(2);
        match transition.effect {
            DragEffect::CandidateChanged {
                previous: Some(prev),
                candidate,
            } if prev.list == candidate.list => {
                passes.push((candidate.list, ReflowKind::Reorder, candidate.index));
            }
            DragEffect::CandidateChanged {
                previous,
                candidate,
            } => {
                if let Some(prev) = previous {
                    passes.push((prev.list, ReflowKind::Transfer, prev.index));
                }
                passes.push((candidate.list, ReflowKind::Transfer, candidate.index));
            }
            DragEffect::CandidateCleared {
                previous: Some(prev),
            }
            | DragEffect::EnteredTrash {
                previous: Some(prev),
            } => passes.push((prev.list, ReflowKind::Transfer, prev.index)),
            _ => {}
        }
        for (list, kind, index) in passes {
            self.queue_reflow(&geometry, list, kind, index, dragged, false);
        }
        transition
    }

    fn release<S: GeometrySource + ?Sized>(
        &mut self,
        point: Point,
        source: &S,
        now: Instant,
    ) -> Result<BoardOutput> {
        let mut output = BoardOutput::default();
        if self.press.take().is_some() && !self.machine.is_active() {
            output.listener = self.detach();
            return Ok(output);
        }
        if self
            .machine
            .session()
            .is_some_and(|s| self.machine.is_active() && s.pointer != point)
        {
            output.transitions.push(self.track(point, source, now));
        }

        let geometry = snapshot::capture_all(source);
        let transition = self.machine.drop(now);
        output.transitions.push(transition);
        output.settle_timer = self.machine.settle_timer();
        if let DragEffect::Dropped { outcome } = transition.effect {
            output.commit = self.apply_drop(outcome, &geometry)?;
        }
        Ok(output)
    }

    fn apply_drop(
        &mut self,
        outcome: DropOutcome,
        geometry: &BoardGeometry,
    ) -> Result<Option<CommitRequest>> {
        match outcome {
            DropOutcome::Delete { item } => {
                let (list, _) = self.model.locate(item).ok_or(BoardError::UnknownItem(item))?;
                self.model.remove_item(item)?;
                Ok(Some(self.emit_commit(CommitOp::Delete { item, list })))
            }
            DropOutcome::Move {
                item,
                source,
                target,
            } => self
                .apply_move(item, source, target.list, target.index, geometry, true)
                .map(Some),
            DropOutcome::Append {
                item,
                source,
                target,
            } => {
                let len = self.model.len(target).ok_or(BoardError::UnknownList(target))?;
                let position = if target == source {
                    len.saturating_sub(1)
                } else {
                    len
                };
                debug!(item = %item, list = %target, position, "no candidate accepted, appending");
                self.apply_move(item, source, target, position, geometry, false)
                    .map(Some)
            }
            DropOutcome::Cancelled { item, source } => {
                self.queue_return(item, source, None, geometry);
                Ok(None)
            }
        }
    }

    /// Apply a move optimistically and emit its commit. `suppress` is set
    /// when the placeholder already occupies the landing slot.
    fn apply_move(
        &mut self,
        item: ItemId,
        source: ListId,
        target: ListId,
        position: usize,
        geometry: &BoardGeometry,
        suppress: bool,
    ) -> Result<CommitRequest> {
        self.model.move_item(item, target, position)?;
        let kind = if source == target {
            ReflowKind::Reorder
        } else {
            ReflowKind::Transfer
        };
        self.queue_reflow(geometry, target, kind, position, Some(item), suppress);
        Ok(self.emit_commit(CommitOp::Move {
            item,
            source,
            target,
            position,
        }))
    }

    /// The dragged item goes back where it came from.
    fn queue_return(
        &mut self,
        item: ItemId,
        source: ListId,
        previous: Option<Candidate>,
        geometry: &BoardGeometry,
    ) {
        if let Some(prev) = previous
            && prev.list != source
        {
            self.queue_reflow(geometry, prev.list, ReflowKind::Transfer, prev.index, Some(item), false);
        }
        let index = self
            .machine
            .session()
            .map_or(0, |session| session.source_index);
        self.queue_reflow(geometry, source, ReflowKind::Transfer, index, Some(item), false);
    }

    fn emit_commit(&mut self, op: CommitOp) -> CommitRequest {
        self.next_commit = self.next_commit.saturating_add(1);
        let request = CommitRequest {
            id: CommitId::new(self.next_commit),
            op,
        };
        info!(commit = %request.id, ?op, "commit emitted");
        self.pending.push(request);
        request
    }

    /// Cancel the active drag (e.g. the owning view is closing).
    pub fn cancel<S: GeometrySource + ?Sized>(&mut self, source: &S, now: Instant) -> BoardOutput {
        self.cancel_with(CancelReason::Host, source, now)
    }

    /// The view lost focus mid-gesture.
    pub fn blur<S: GeometrySource + ?Sized>(&mut self, source: &S, now: Instant) -> BoardOutput {
        self.cancel_with(CancelReason::Blur, source, now)
    }

    fn cancel_with<S: GeometrySource + ?Sized>(
        &mut self,
        reason: CancelReason,
        source: &S,
        now: Instant,
    ) -> BoardOutput {
        let mut output = BoardOutput::default();
        if self.press.take().is_some() && !self.machine.is_active() {
            output.listener = self.detach();
            return output;
        }
        let geometry = snapshot::capture_all(source);
        let transition = self.machine.cancel(reason, now);
        if let DragEffect::Canceled {
            item: Some(item),
            previous,
            ..
        } = transition.effect
            && let Some(source_list) = self.machine.session().map(|s| s.source_list)
        {
            self.queue_return(item, source_list, previous, &geometry);
        }
        output.transitions.push(transition);
        output.settle_timer = self.machine.settle_timer();
        output
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance one frame. Call after the view has rendered the current
    /// preview order.
    pub fn frame<S: GeometrySource + ?Sized>(&mut self, source: &S, now: Instant) -> FrameOutput {
        let mut output = FrameOutput::default();
        if let Some(transition) = self.machine.tick(now) {
            output.transitions.push(transition);
            output.listener = self.on_idle();
        }
        output.directives = self.animator.advance(now);
        output
            .directives
            .extend(self.animator.complete_pending(source, now));
        output
    }

    /// Host settle timer fired.
    pub fn fire_settle(&mut self, generation: u64) -> BoardOutput {
        let transition = self.machine.fire_settle(generation);
        let listener = if transition.is_noop() {
            None
        } else {
            self.on_idle()
        };
        BoardOutput {
            transitions: vec![transition],
            listener,
            ..BoardOutput::default()
        }
    }

    /// Host reports that the transition for `(item, key)` ended.
    pub fn animation_finished(&mut self, item: ItemId, key: ReflowKey) -> bool {
        self.animator.complete(item, key)
    }

    fn on_idle(&mut self) -> Option<ListenerCommand> {
        self.snapshots.clear();
        // A press armed during Settling still needs its move/up events.
        if self.press.is_some() {
            return None;
        }
        self.detach()
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    /// Report the outcome of an emitted commit.
    ///
    /// A confirmed commit joins the confirmed order. A rejected one is
    /// dropped and the visible order is rebuilt as the confirmed order plus
    /// the commits still pending, so earlier and later drops survive a
    /// rejection in any order. The error comes back as
    /// [`BoardError::CommitRejected`].
    pub fn complete_commit<S: GeometrySource + ?Sized>(
        &mut self,
        id: CommitId,
        result: std::result::Result<(), StoreError>,
        source: &S,
    ) -> Result<()> {
        let position = self
            .pending
            .iter()
            .position(|pending| pending.id == id)
            .ok_or(BoardError::UnknownCommit(id))?;
        let request = self.pending.remove(position);

        match result {
            Ok(()) => {
                if let Err(error) = self.confirmed.apply(&request.op) {
                    warn!(commit = %id, %error, "confirmed commit does not apply to confirmed order");
                }
                info!(commit = %id, "commit confirmed");
                Ok(())
            }
            Err(error) => {
                warn!(commit = %id, %error, op = ?request.op, "commit rejected, reverting");
                let geometry = snapshot::capture_all(source);
                let rebuilt = self.replay_pending();
                for list in self.model.changed_lists(&rebuilt) {
                    self.queue_reflow(&geometry, list, ReflowKind::Transfer, 0, None, false);
                }
                self.model = rebuilt;
                Err(BoardError::CommitRejected { commit: id, error })
            }
        }
    }

    /// The confirmed order with every pending commit applied in emission
    /// order.
    fn replay_pending(&self) -> BoardModel {
        let mut model = self.confirmed.clone();
        for request in &self.pending {
            if let Err(error) = model.apply(&request.op) {
                debug!(commit = %request.id, %error, "pending commit no longer applies, skipped");
            }
        }
        model
    }

    /// Execute `request` against `store` and report the outcome.
    pub fn commit_with<B, S>(
        &mut self,
        request: CommitRequest,
        store: &mut B,
        source: &S,
    ) -> Result<()>
    where
        B: BoardStore + ?Sized,
        S: GeometrySource + ?Sized,
    {
        let result = request.execute(store);
        self.complete_commit(request.id, result, source)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Drop every transient: session, press, snapshots, animations, and
    /// listeners. Emitted commits stay pending.
    pub fn shutdown(&mut self) -> BoardOutput {
        let mut output = BoardOutput::default();
        self.press = None;
        if let Some(transition) = self.machine.force_idle() {
            output.transitions.push(transition);
        }
        self.snapshots.clear();
        self.animator.clear();
        output.listener = self.detach();
        output
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn queue_reflow(
        &mut self,
        geometry: &BoardGeometry,
        list: ListId,
        kind: ReflowKind,
        target_index: usize,
        exclude: Option<ItemId>,
        suppress: bool,
    ) {
        let before = geometry
            .column(list)
            .map(|column| column.items.clone())
            .unwrap_or_default();
        self.animator.begin(ReflowRequest {
            list,
            before,
            kind,
            target_index,
            exclude,
            suppress,
        });
    }

    fn attach(&mut self) -> Option<ListenerCommand> {
        if self.listening {
            return None;
        }
        self.listening = true;
        Some(ListenerCommand::Attach)
    }

    fn detach(&mut self) -> Option<ListenerCommand> {
        if !self.listening {
            return None;
        }
        self.listening = false;
        Some(ListenerCommand::Detach)
    }
}
