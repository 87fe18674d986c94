#![forbid(unsafe_code)]

//! Position resolver: pointer coordinates to an insertion candidate.
//!
//! Resolution is a pure function of a [`BoardGeometry`] capture and a
//! pointer position.
//!
//! # Algorithm
//!
//! 1. Target column: the column whose box contains the pointer, otherwise
//!    the column whose horizontal center is nearest the pointer (first one
//!    wins a tie).
//! 2. Pointer inside the header dead-zone: index 0.
//! 3. Otherwise the index is the number of sibling midpoints at or above
//!    the pointer, the dragged item excluded. Only midpoints take part, so
//!    the result does not depend on which item sits where.
//! 4. Empty column: index 0.

use cardflow_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::model::{ItemId, ListId};
use crate::snapshot::{BoardGeometry, ColumnGeometry};

/// Default height of the snap-to-top band under a column's top edge.
pub const DEFAULT_HEADER_DEAD_ZONE: f32 = 24.0;

/// Where the dragged item would land if dropped now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub list: ListId,
    /// Position in the list rendered without the dragged item; `len` appends.
    pub index: usize,
}

impl Candidate {
    #[must_use]
    pub const fn new(list: ListId, index: usize) -> Self {
        Self { list, index }
    }
}

/// A candidate together with the decision boundary nearest the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub candidate: Candidate,
    /// The sibling midpoint closest to the pointer. `None` when the column
    /// has no siblings or the header dead-zone decided.
    pub boundary_y: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Pixels below a column's top edge that snap to index 0.
    pub header_dead_zone: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            header_dead_zone: DEFAULT_HEADER_DEAD_ZONE,
        }
    }
}

/// Resolve the insertion candidate for `pointer`.
///
/// Returns `None` only when the board has no columns.
#[must_use]
pub fn resolve(
    geometry: &BoardGeometry,
    pointer: Point,
    dragged: Option<ItemId>,
    config: &ResolverConfig,
) -> Option<Resolution> {
    let column = column_at(geometry, pointer)?;

    let mut mids: Vec<f32> = column
        .items
        .iter()
        .filter(|(id, _)| Some(*id) != dragged)
        .map(|(_, rect)| rect.mid_y())
        .collect();
    if mids.is_empty() {
        return Some(Resolution {
            candidate: Candidate::new(column.list, 0),
            boundary_y: None,
        });
    }

    if pointer.y < column.rect.top + config.header_dead_zone.max(0.0) {
        return Some(Resolution {
            candidate: Candidate::new(column.list, 0),
            boundary_y: None,
        });
    }

    mids.sort_by(f32::total_cmp);
    let index = mids.partition_point(|&mid| mid <= pointer.y);
    let boundary_y = mids
        .iter()
        .copied()
        .min_by(|a, b| (a - pointer.y).abs().total_cmp(&(b - pointer.y).abs()));

    Some(Resolution {
        candidate: Candidate::new(column.list, index),
        boundary_y,
    })
}

/// The column the pointer targets.
#[must_use]
pub fn column_at(geometry: &BoardGeometry, pointer: Point) -> Option<&ColumnGeometry> {
    geometry
        .columns
        .iter()
        .find(|column| column.rect.contains(pointer))
        .or_else(|| {
            geometry.columns.iter().min_by(|a, b| {
                horizontal_distance(&a.rect, pointer).total_cmp(&horizontal_distance(&b.rect, pointer))
            })
        })
}

/// The item under `pointer`, for starting a drag from a raw press.
#[must_use]
pub fn item_at(geometry: &BoardGeometry, pointer: Point) -> Option<(ListId, ItemId, Rect)> {
    geometry.columns.iter().find_map(|column| {
        column
            .items
            .iter()
            .find(|(_, rect)| rect.contains(pointer))
            .map(|(id, rect)| (column.list, id, rect))
    })
}

fn horizontal_distance(rect: &Rect, pointer: Point) -> f32 {
    (rect.center_x() - pointer.x).abs()
}
