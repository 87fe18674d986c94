#![forbid(unsafe_code)]

//! Geometry snapshots: on-screen rectangles captured from the view layer.
//!
//! The view layer implements [`GeometrySource`]; everything else in the
//! engine works on captured, owned [`GeometrySnapshot`]s and never holds a
//! view handle.
//!
//! # Invariants
//!
//! 1. A snapshot preserves rendered order.
//! 2. Items that are unmounted or have an empty box are absent from a
//!    snapshot; that is never an error.
//! 3. An item id appears at most once per snapshot (first occurrence wins).

use cardflow_core::geometry::{Point, Rect};
use rustc_hash::FxHashMap;

use crate::model::{ItemId, ListId};

/// Read access to the live layout of the board.
///
/// Rectangles are layout boxes: any animation offset the view is currently
/// applying must not be included.
pub trait GeometrySource {
    /// Column rectangles in board order.
    fn columns(&self) -> Vec<(ListId, Rect)>;

    /// Rendered items of one list, in rendered order.
    fn items(&self, list: ListId) -> Vec<(ItemId, Rect)>;

    /// The trash drop target, if one is shown.
    fn trash(&self) -> Option<Rect> {
        None
    }

    /// Whether the view can run offset transitions. When `false`, reflow
    /// degrades to instant repositioning.
    fn animations_available(&self) -> bool {
        true
    }
}

/// Rectangles of one list's items at one instant, in rendered order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySnapshot {
    order: Vec<(ItemId, Rect)>,
    index: FxHashMap<ItemId, usize>,
}

impl GeometrySnapshot {
    /// Build from `(id, rect)` pairs, dropping empty boxes and duplicates.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = (ItemId, Rect)>) -> Self {
        let mut snapshot = Self::default();
        for (id, rect) in rects {
            if rect.is_empty() || snapshot.index.contains_key(&id) {
                continue;
            }
            snapshot.index.insert(id, snapshot.order.len());
            snapshot.order.push((id, rect));
        }
        snapshot
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<Rect> {
        self.index.get(&id).map(|&i| self.order[i].1)
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    /// Entries in rendered order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Rect)> + '_ {
        self.order.iter().copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.order.iter().map(|(id, _)| *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One column's box and its items.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGeometry {
    pub list: ListId,
    pub rect: Rect,
    pub items: GeometrySnapshot,
}

/// Board-wide capture: every column plus the trash target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardGeometry {
    pub columns: Vec<ColumnGeometry>,
    pub trash: Option<Rect>,
}

impl BoardGeometry {
    #[must_use]
    pub fn column(&self, list: ListId) -> Option<&ColumnGeometry> {
        self.columns.iter().find(|column| column.list == list)
    }

    /// Rectangle of `id` in whichever column renders it.
    #[must_use]
    pub fn item_rect(&self, id: ItemId) -> Option<Rect> {
        self.columns.iter().find_map(|column| column.items.get(id))
    }

    /// Whether `point` is over the trash target.
    #[must_use]
    pub fn over_trash(&self, point: Point) -> bool {
        self.trash.is_some_and(|rect| rect.contains(point))
    }
}

/// Capture one list's item rectangles.
pub fn capture<S: GeometrySource + ?Sized>(source: &S, list: ListId) -> GeometrySnapshot {
    GeometrySnapshot::from_rects(source.items(list))
}

/// Capture every column, its items, and the trash target.
pub fn capture_all<S: GeometrySource + ?Sized>(source: &S) -> BoardGeometry {
    let columns = source
        .columns()
        .into_iter()
        .map(|(list, rect)| ColumnGeometry {
            list,
            rect,
            items: capture(source, list),
        })
        .collect();
    BoardGeometry {
        columns,
        trash: source.trash(),
    }
}

/// Holds the board layout captured at drag start for the lifetime of one
/// gesture.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    drag_start: Option<BoardGeometry>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture and retain the pre-drag layout, replacing any previous one.
    pub fn record_drag_start<S: GeometrySource + ?Sized>(&mut self, source: &S) -> &BoardGeometry {
        self.drag_start.insert(capture_all(source))
    }

    /// The retained pre-drag layout.
    #[must_use]
    pub fn drag_start(&self) -> Option<&BoardGeometry> {
        self.drag_start.as_ref()
    }

    /// Release everything retained.
    pub fn clear(&mut self) {
        self.drag_start = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drag_start.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedView {
        columns: Vec<(ListId, Rect)>,
        items: Vec<(ListId, ItemId, Rect)>,
    }

    impl GeometrySource for FixedView {
        fn columns(&self) -> Vec<(ListId, Rect)> {
            self.columns.clone()
        }

        fn items(&self, list: ListId) -> Vec<(ItemId, Rect)> {
            self.items
                .iter()
                .filter(|(l, _, _)| *l == list)
                .map(|(_, id, rect)| (*id, *rect))
                .collect()
        }

        fn trash(&self) -> Option<Rect> {
            Some(Rect::new(0.0, 900.0, 200.0, 80.0))
        }
    }

    fn view() -> FixedView {
        let list = ListId::new(1);
        FixedView {
            columns: vec![(list, Rect::new(0.0, 0.0, 280.0, 600.0))],
            items: vec![
                (list, ItemId::new(1), Rect::new(0.0, 0.0, 280.0, 100.0)),
                (list, ItemId::new(2), Rect::new(0.0, 100.0, 280.0, 100.0)),
                (list, ItemId::new(3), Rect::new(0.0, 200.0, 280.0, 0.0)),
                (list, ItemId::new(1), Rect::new(0.0, 300.0, 280.0, 100.0)),
            ],
        }
    }

    #[test]
    fn capture_is_idempotent() {
        let view = view();
        assert_eq!(capture(&view, ListId::new(1)), capture(&view, ListId::new(1)));
        assert_eq!(capture_all(&view), capture_all(&view));
    }

    #[test]
    fn hidden_and_duplicate_items_are_omitted() {
        let snap = capture(&view(), ListId::new(1));
        assert_eq!(snap.ids().collect::<Vec<_>>(), [ItemId::new(1), ItemId::new(2)]);
        assert_eq!(snap.get(ItemId::new(1)).unwrap().top, 0.0);
        assert!(!snap.contains(ItemId::new(3)));
    }

    #[test]
    fn unknown_list_captures_nothing() {
        assert!(capture(&view(), ListId::new(9)).is_empty());
    }

    #[test]
    fn store_retains_until_cleared() {
        let mut store = SnapshotStore::new();
        assert!(store.is_empty());
        let recorded = store.record_drag_start(&view()).clone();
        assert_eq!(recorded.item_rect(ItemId::new(2)).unwrap().top, 100.0);
        assert!(recorded.over_trash(Point::new(10.0, 910.0)));
        assert_eq!(store.drag_start(), Some(&recorded));
        store.clear();
        assert!(store.drag_start().is_none());
    }
}
