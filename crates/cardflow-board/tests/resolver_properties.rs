#![forbid(unsafe_code)]

//! Property tests for pointer resolution.
//!
//! Validates:
//! - A pointer above every sibling midpoint resolves to index 0.
//! - A pointer below every sibling midpoint resolves to the sibling count.
//! - The index depends only on midpoints, never on which item sits where.
//! - The index is always within `0..=siblings`, dragged item excluded.
//! - The header dead-zone always snaps to index 0.

use cardflow_board::resolver::{self, ResolverConfig};
use cardflow_board::snapshot::{BoardGeometry, ColumnGeometry};
use cardflow_board::{GeometrySnapshot, ItemId, ListId, Point, Rect};
use proptest::prelude::*;

const LIST: ListId = ListId::new(7);
const COLUMN_HEIGHT: f32 = 2000.0;

// ============================================================================
// Strategy helpers
// ============================================================================

fn heights_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(20.0f32..120.0, 1..8)
}

/// Stack items of the given heights from the column top, ids `0..n`.
fn stacked(heights: &[f32]) -> Vec<(ItemId, Rect)> {
    let mut top = 0.0;
    heights
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let rect = Rect::new(0.0, top, 280.0, h);
            top += h;
            (ItemId::new(i as u64), rect)
        })
        .collect()
}

fn board(items: Vec<(ItemId, Rect)>) -> BoardGeometry {
    BoardGeometry {
        columns: vec![ColumnGeometry {
            list: LIST,
            rect: Rect::new(0.0, 0.0, 280.0, COLUMN_HEIGHT),
            items: GeometrySnapshot::from_rects(items),
        }],
        trash: None,
    }
}

fn no_dead_zone() -> ResolverConfig {
    ResolverConfig {
        header_dead_zone: 0.0,
    }
}

fn index_at(geometry: &BoardGeometry, pointer: Point, config: &ResolverConfig) -> usize {
    resolver::resolve(geometry, pointer, None, config)
        .map(|resolution| resolution.candidate.index)
        .unwrap_or(usize::MAX)
}

// ============================================================================
// Invariant 1: above every midpoint resolves to the top
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn above_all_midpoints_is_index_zero(
        heights in heights_strategy(),
        frac in 0.0f32..1.0,
    ) {
        let items = stacked(&heights);
        let first_mid = items[0].1.mid_y();
        let geometry = board(items);
        let y = frac * first_mid;
        prop_assert_eq!(index_at(&geometry, Point::new(140.0, y), &no_dead_zone()), 0);
    }
}

// ============================================================================
// Invariant 2: below every midpoint appends
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn below_all_midpoints_is_sibling_count(
        heights in heights_strategy(),
        frac in 0.0f32..1.0,
    ) {
        let items = stacked(&heights);
        let count = items.len();
        let last_mid = items[count - 1].1.mid_y();
        let geometry = board(items);
        let y = last_mid + 1.0 + frac * (COLUMN_HEIGHT - last_mid - 2.0);
        prop_assert_eq!(index_at(&geometry, Point::new(140.0, y), &no_dead_zone()), count);
    }
}

// ============================================================================
// Invariant 3: identity independence
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn shuffling_item_ids_keeps_the_index(
        (heights, order) in heights_strategy().prop_flat_map(|heights| {
            let ids: Vec<u64> = (0..heights.len() as u64).collect();
            (Just(heights), Just(ids).prop_shuffle())
        }),
        x in -500.0f32..1500.0,
        y in 0.0f32..1000.0,
    ) {
        let items = stacked(&heights);
        let shuffled: Vec<(ItemId, Rect)> = items
            .iter()
            .zip(&order)
            .map(|(&(_, rect), &raw)| (ItemId::new(raw), rect))
            .collect();
        let pointer = Point::new(x, y);
        let config = ResolverConfig::default();
        prop_assert_eq!(
            index_at(&board(items), pointer, &config),
            index_at(&board(shuffled), pointer, &config)
        );
    }
}

// ============================================================================
// Invariant 4: bounded index, dragged item excluded
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn index_is_bounded_by_siblings(
        heights in heights_strategy(),
        dragged in 0u64..8,
        x in -500.0f32..1500.0,
        y in -200.0f32..2200.0,
    ) {
        let items = stacked(&heights);
        let count = items.len();
        let dragged = ItemId::new(dragged);
        let siblings = if (dragged.get() as usize) < count { count - 1 } else { count };
        let geometry = board(items);

        let resolution = resolver::resolve(
            &geometry,
            Point::new(x, y),
            Some(dragged),
            &ResolverConfig::default(),
        );
        let resolution = resolution.expect("a board with a column always resolves");
        prop_assert_eq!(resolution.candidate.list, LIST);
        prop_assert!(resolution.candidate.index <= siblings);
    }
}

// ============================================================================
// Invariant 5: header dead-zone
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn header_dead_zone_snaps_to_top(
        heights in heights_strategy(),
        y in 0.0f32..24.0,
    ) {
        let geometry = board(stacked(&heights));
        let resolution = resolver::resolve(
            &geometry,
            Point::new(140.0, y),
            None,
            &ResolverConfig::default(),
        )
        .expect("resolves");
        prop_assert_eq!(resolution.candidate.index, 0);
        prop_assert_eq!(resolution.boundary_y, None);
    }
}
