#![forbid(unsafe_code)]

//! Core: geometry, normalized pointer input, and animation primitives.
//!
//! # Role in Cardflow
//! `cardflow-core` is the leaf layer. It knows nothing about boards, lists,
//! or cards; it only provides the value types the drag engine
//! (`cardflow-board`) computes with.
//!
//! # Primary responsibilities
//! - **Geometry**: [`geometry::Rect`] and [`geometry::Point`] in
//!   pixel-equivalent units, with midpoint/center helpers used for hit
//!   testing and insertion resolution.
//! - **Pointer input**: [`event::PointerEvent`] is the single normalized
//!   `{x, y, phase}` stream; [`event::PointerNormalizer`] folds mouse, touch,
//!   and pen input into it while enforcing one active pointer.
//! - **Animation**: easing curves and the [`animation::Tween`] used to play
//!   FLIP offsets back to zero.

pub mod animation;
pub mod event;
pub mod geometry;
