//! Single-column vertical stacking of areas
//!
//! Areas are laid out top to bottom, left-aligned. The top of area `i` is
//! `top_offset + sum(height_j + spacing)` over every area `j` before it.
//! The layout is recomputed from scratch on every change to the list, so
//! no area's stored `y` is ever authoritative.

use serde::{Deserialize, Serialize};

/// Fixed horizontal position of every area
pub const AREA_LEFT: f64 = 10.0;

/// Top of the first area (leaves room for the menu bar)
pub const AREA_TOP_OFFSET: f64 = 80.0;

/// Vertical gap between consecutive areas
pub const AREA_SPACING: f64 = 40.0;

/// Something that can be placed in the area column
pub trait Stacked {
    fn height(&self) -> f64;
    fn place(&mut self, x: f64, y: f64);
}

/// Parameters of the area column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub left: f64,
    pub top_offset: f64,
    pub spacing: f64,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            left: AREA_LEFT,
            top_offset: AREA_TOP_OFFSET,
            spacing: AREA_SPACING,
        }
    }
}

impl ColumnLayout {
    /// Place every item in the column, overwriting any previous position
    pub fn stack<T: Stacked>(&self, items: &mut [T]) {
        let mut current = self.top_offset;
        for item in items.iter_mut() {
            item.place(self.left, current);
            current += item.height() + self.spacing;
        }
    }

    /// Top of the slot right below the last item (where a new area would go)
    pub fn next_top<T: Stacked>(&self, items: &[T]) -> f64 {
        items
            .iter()
            .fold(self.top_offset, |top, item| top + item.height() + self.spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Slot {
        height: f64,
        x: f64,
        y: f64,
    }

    impl Stacked for Slot {
        fn height(&self) -> f64 {
            self.height
        }

        fn place(&mut self, x: f64, y: f64) {
            self.x = x;
            self.y = y;
        }
    }

    fn slot(height: f64) -> Slot {
        Slot { height, x: -1.0, y: -1.0 }
    }

    #[test]
    fn stacks_from_the_top_offset() {
        let mut slots = vec![slot(600.0), slot(300.0), slot(100.0)];
        ColumnLayout::default().stack(&mut slots);

        assert_eq!(slots[0].y, 80.0);
        assert_eq!(slots[1].y, 80.0 + 600.0 + 40.0);
        assert_eq!(slots[2].y, 80.0 + 600.0 + 40.0 + 300.0 + 40.0);
        assert!(slots.iter().all(|s| s.x == AREA_LEFT));
    }

    #[test]
    fn stale_positions_are_overwritten() {
        let mut slots = vec![
            Slot { height: 50.0, x: 999.0, y: 999.0 },
            Slot { height: 50.0, x: 0.0, y: 80.0 },
        ];
        ColumnLayout::default().stack(&mut slots);
        assert_eq!((slots[0].x, slots[0].y), (10.0, 80.0));
        assert_eq!((slots[1].x, slots[1].y), (10.0, 170.0));
    }

    #[test]
    fn next_top_of_empty_column_is_offset() {
        let layout = ColumnLayout::default();
        let empty: Vec<Slot> = Vec::new();
        assert_eq!(layout.next_top(&empty), AREA_TOP_OFFSET);
        assert_eq!(layout.next_top(&[slot(600.0)]), 720.0);
    }

    proptest! {
        #[test]
        fn stack_matches_prefix_sums(heights in prop::collection::vec(1.0f64..2000.0, 0..20)) {
            let layout = ColumnLayout::default();
            let mut slots: Vec<Slot> = heights.iter().copied().map(slot).collect();
            layout.stack(&mut slots);

            let mut expected = AREA_TOP_OFFSET;
            for (s, h) in slots.iter().zip(&heights) {
                prop_assert!((s.y - expected).abs() < 1e-6);
                expected += h + AREA_SPACING;
            }

            prop_assert!((layout.next_top(&slots) - expected).abs() < 1e-6);
        }

        #[test]
        fn restacking_is_idempotent(heights in prop::collection::vec(1.0f64..2000.0, 0..20)) {
            let layout = ColumnLayout::default();
            let mut once: Vec<Slot> = heights.iter().copied().map(slot).collect();
            layout.stack(&mut once);
            let mut twice = once.clone();
            layout.stack(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
