#![forbid(unsafe_code)]

//! Normalized pointer input.
//!
//! The drag engine consumes exactly one event shape, [`PointerEvent`]
//! (`{x, y, phase}`), and never branches on input modality. Hosts feed raw
//! mouse/touch/pen signals through a [`PointerNormalizer`], which:
//!
//! - tracks one active pointer at a time (multi-touch is not supported),
//! - only lets the primary button begin a sequence,
//! - turns interruptions (focus loss, OS cancel) into `Cancel`.
//!
//! # Invariants
//!
//! 1. Every emitted sequence is `Start`, zero or more `Move`, then exactly one
//!    of `End` or `Cancel`.
//! 2. While a pointer is active, signals from any other pointer id are
//!    ignored with [`PointerIgnoredReason::PointerMismatch`].
//! 3. After `End`/`Cancel`, the normalizer is idle again.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Lifecycle phase of a normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Canonical pointer event consumed by the drag engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub phase: PointerPhase,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(x: f32, y: f32, phase: PointerPhase) -> Self {
        Self { x, y, phase }
    }

    #[must_use]
    pub const fn start(x: f32, y: f32) -> Self {
        Self::new(x, y, PointerPhase::Start)
    }

    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(x, y, PointerPhase::Move)
    }

    #[must_use]
    pub const fn end(x: f32, y: f32) -> Self {
        Self::new(x, y, PointerPhase::End)
    }

    #[must_use]
    pub const fn cancel(x: f32, y: f32) -> Self {
        Self::new(x, y, PointerPhase::Cancel)
    }

    /// Position as a [`Point`].
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Physical device behind a raw pointer signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// Button reported with a press. Touch and pen contacts report `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Raw host signal before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RawPointerAction {
    Down { button: PointerButton },
    Move,
    Up,
    /// OS/browser cancelled the contact (e.g. touch stolen by scrolling).
    Cancel,
    /// The hosting view lost focus or the user pressed Escape.
    Blur,
}

/// One raw pointer signal from the host view layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPointerEvent {
    pub pointer_id: u32,
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    pub action: RawPointerAction,
}

impl RawPointerEvent {
    #[must_use]
    pub const fn new(
        pointer_id: u32,
        kind: PointerKind,
        x: f32,
        y: f32,
        action: RawPointerAction,
    ) -> Self {
        Self {
            pointer_id,
            kind,
            x,
            y,
            action,
        }
    }
}

/// Why a raw signal produced no normalized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerIgnoredReason {
    ButtonNotAllowed,
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActivePointer {
    pointer_id: u32,
    kind: PointerKind,
    last: Point,
}

/// Folds mouse, touch, and pen signals into one [`PointerEvent`] stream.
#[derive(Debug, Clone, Default)]
pub struct PointerNormalizer {
    active: Option<ActivePointer>,
}

impl PointerNormalizer {
    /// Create an idle normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pointer sequence is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Device kind of the active pointer, if any.
    #[must_use]
    pub fn active_kind(&self) -> Option<PointerKind> {
        self.active.map(|a| a.kind)
    }

    /// Normalize one raw signal.
    pub fn normalize(&mut self, raw: RawPointerEvent) -> Result<PointerEvent, PointerIgnoredReason> {
        let pos = Point::new(raw.x, raw.y);
        match raw.action {
            RawPointerAction::Down { button } => {
                if self.active.is_some() {
                    return Err(PointerIgnoredReason::ActivePointerAlreadyInProgress);
                }
                if button != PointerButton::Primary {
                    return Err(PointerIgnoredReason::ButtonNotAllowed);
                }
                self.active = Some(ActivePointer {
                    pointer_id: raw.pointer_id,
                    kind: raw.kind,
                    last: pos,
                });
                Ok(PointerEvent::start(raw.x, raw.y))
            }
            RawPointerAction::Move => {
                let active = self.matching_mut(raw.pointer_id)?;
                active.last = pos;
                Ok(PointerEvent::moved(raw.x, raw.y))
            }
            RawPointerAction::Up => {
                self.matching_mut(raw.pointer_id)?;
                self.active = None;
                Ok(PointerEvent::end(raw.x, raw.y))
            }
            RawPointerAction::Cancel => {
                let last = self.matching_mut(raw.pointer_id)?.last;
                self.active = None;
                Ok(PointerEvent::cancel(last.x, last.y))
            }
            // Focus loss is not tied to a pointer id; it cancels whatever is active.
            RawPointerAction::Blur => {
                let active = self.active.take().ok_or(PointerIgnoredReason::NoActivePointer)?;
                Ok(PointerEvent::cancel(active.last.x, active.last.y))
            }
        }
    }

    /// Drop any active pointer without emitting an event.
    pub fn reset(&mut self) {
        self.active = None;
    }

    fn matching_mut(&mut self, pointer_id: u32) -> Result<&mut ActivePointer, PointerIgnoredReason> {
        match self.active.as_mut() {
            None => Err(PointerIgnoredReason::NoActivePointer),
            Some(active) if active.pointer_id != pointer_id => {
                Err(PointerIgnoredReason::PointerMismatch)
            }
            Some(active) => Ok(active),
        }
    }
}
