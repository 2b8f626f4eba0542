//! Viewport window tracking.
//!
//! The scheduler remembers the offsets it last asked for and compares each new
//! viewport against them. A level change refetches the whole range; a pan at
//! the same level only requests the one tile that crossed the moving edge.

use crate::address::TileAddress;

/// Offsets of the last checked viewport at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub level: i32,
    pub min_offset: i64,
    pub max_offset: i64,
}

impl FetchWindow {
    pub fn new(level: i32, min_offset: i64, max_offset: i64) -> Self {
        Self {
            level,
            min_offset,
            max_offset,
        }
    }
}

/// Addresses a viewport check requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Every tile of the window (first check or level change).
    Full(FetchWindow),
    /// The tile past the left edge.
    LeftEdge(TileAddress),
    /// The tile past the right edge.
    RightEdge(TileAddress),
    /// Nothing new is visible.
    Nothing,
}

impl FetchPlan {
    /// Decide what to request when moving from `previous` to `next`.
    ///
    /// The left edge is checked first. When the viewport grows on both sides
    /// at once only the left tile is requested; the right one is picked up
    /// when the viewport moves again.
    pub fn between(previous: Option<FetchWindow>, next: FetchWindow) -> Self {
        let Some(previous) = previous else {
            return Self::Full(next);
        };

        if next.level != previous.level {
            Self::Full(next)
        } else if next.min_offset < previous.min_offset {
            Self::LeftEdge(TileAddress::new_unchecked(next.level, next.min_offset))
        } else if next.max_offset > previous.max_offset {
            Self::RightEdge(TileAddress::new_unchecked(next.level, next.max_offset))
        } else {
            Self::Nothing
        }
    }

    /// Addresses to request, in ascending offset order.
    pub fn addresses(&self) -> impl Iterator<Item = TileAddress> {
        let (level, offsets) = match *self {
            Self::Full(window) => (window.level, window.min_offset..=window.max_offset),
            Self::LeftEdge(address) | Self::RightEdge(address) => {
                (address.level(), address.offset()..=address.offset())
            }
            #[allow(clippy::reversed_empty_ranges)]
            Self::Nothing => (0, 1..=0),
        };
        offsets.map(move |offset| TileAddress::new_unchecked(level, offset))
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Full(_) => "full",
            Self::LeftEdge(_) => "left-edge",
            Self::RightEdge(_) => "right-edge",
            Self::Nothing => "nothing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(plan: FetchPlan) -> Vec<(i32, i64)> {
        plan.addresses().map(|a| (a.level(), a.offset())).collect()
    }

    #[test]
    fn test_first_check_is_full() {
        let plan = FetchPlan::between(None, FetchWindow::new(0, 0, 1));
        assert_eq!(offsets(plan), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_level_change_is_full() {
        let previous = FetchWindow::new(0, 0, 1);
        let plan = FetchPlan::between(Some(previous), FetchWindow::new(1, 0, 0));
        assert_eq!(plan, FetchPlan::Full(FetchWindow::new(1, 0, 0)));
        assert_eq!(offsets(plan), vec![(1, 0)]);
    }

    #[test]
    fn test_pan_right_requests_right_edge_only() {
        let previous = FetchWindow::new(0, 0, 1);
        let plan = FetchPlan::between(Some(previous), FetchWindow::new(0, 1, 3));
        assert_eq!(offsets(plan), vec![(0, 3)]);
    }

    #[test]
    fn test_pan_left_requests_left_edge_only() {
        let previous = FetchWindow::new(0, 5, 8);
        let plan = FetchPlan::between(Some(previous), FetchWindow::new(0, 2, 5));
        assert_eq!(offsets(plan), vec![(0, 2)]);
    }

    #[test]
    fn test_growing_both_sides_prefers_left() {
        let previous = FetchWindow::new(0, 5, 8);
        let plan = FetchPlan::between(Some(previous), FetchWindow::new(0, 4, 9));
        assert_eq!(plan.kind(), "left-edge");
        assert_eq!(offsets(plan), vec![(0, 4)]);
    }

    #[test]
    fn test_shrinking_requests_nothing() {
        let previous = FetchWindow::new(0, 0, 10);
        let plan = FetchPlan::between(Some(previous), FetchWindow::new(0, 2, 8));
        assert_eq!(plan, FetchPlan::Nothing);
        assert_eq!(plan.addresses().count(), 0);
    }
}
