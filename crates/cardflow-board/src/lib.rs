#![forbid(unsafe_code)]

//! Drag-reorder engine for card boards.
//!
//! # Role in Cardflow
//! `cardflow-board` turns a normalized pointer stream into a live insertion
//! preview, a single optimistic commit per drop, and FLIP animation
//! directives for the siblings that move. It owns no view and no store:
//! layout is read through [`GeometrySource`], persistence goes through
//! emitted [`CommitRequest`]s and the [`BoardStore`] boundary.
//!
//! # Primary responsibilities
//! - **Snapshots** ([`snapshot`]): capture item rectangles per list or
//!   board-wide; unmounted items are simply absent.
//! - **Resolution** ([`resolver`]): pointer to `{list, index}` from sibling
//!   midpoints, with a header dead-zone and nearest-column fallback.
//! - **Gating** ([`gate`]): hysteresis around the deciding midpoint plus a
//!   minimum interval between accepted changes.
//! - **Lifecycle** ([`session`]): `Idle -> Dragging -> Previewing* ->
//!   Settling -> Idle` with telemetry for every transition.
//! - **Reflow** ([`reflow`]): measure before, measure after, invert, play.
//! - **Orchestration** ([`board`]): preview order, listener commands,
//!   optimistic apply, revert on rejected commits.
//!
//! Everything is single-threaded and deterministic: time enters only as an
//! explicit `Instant` argument.

pub mod board;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod reflow;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod store;

pub use board::{Board, BoardOutput, FrameOutput, ListenerCommand, PreviewSlot};
pub use config::{BoardConfig, ConfigError};
pub use error::BoardError;
pub use model::{BoardModel, Column, Item, ItemId, ListId};
pub use reflow::{AnimationDirective, DirectivePhase, ReflowKey};
pub use resolver::Candidate;
pub use session::{DragEffect, DragPhase, DragTransition, DropOutcome, NoopReason};
pub use snapshot::{GeometrySnapshot, GeometrySource};
pub use store::{BoardStore, CommitId, CommitOp, CommitRequest, MemoryStore, StoreError};

pub use cardflow_core::event::{PointerEvent, PointerPhase};
pub use cardflow_core::geometry::{Point, Rect};
