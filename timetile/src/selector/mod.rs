//! Resolution selection over resolved tiles.
//!
//! Read-only algorithms the renderer uses to pick what to draw. Both work on
//! whatever has arrived so far and never wait for fetches; a range with no
//! data simply yields fewer tiles.
//!
//! # Selection rule
//!
//! Among tiles covering an instant, the one whose level is closest to the
//! preferred level wins. Equal distances go to the finer (smaller) level.
//! Two tiles of the same level can only both cover an instant that sits on
//! their shared boundary; the later tile (the one starting there) wins, which
//! matches [`crate::address::tile_at`].

use std::sync::Arc;

use crate::store::TileStore;
use crate::tile::Tile;

/// Smallest span the covering sweep steps over.
///
/// Keeps a zero-width viewport from stalling the sweep.
pub const EPSILON: f64 = 1e-9;

/// Fraction of the span the probe sits ahead of the cursor.
const PROBE_NUDGE: f64 = 1e-3;

/// Fraction of the span skipped when no tile covers the probe.
const HOLE_STEP: f64 = 1e-2;

/// Best tile covering `time`, judged against `preferred_level`.
///
/// Returns `None` when no resolved tile covers `time`.
pub fn best_tile_at(store: &TileStore, time: f64, preferred_level: i32) -> Option<&Arc<Tile>> {
    let mut best: Option<&Arc<Tile>> = None;

    for tile in store.iter() {
        let address = tile.address();
        if !address.covers(time) {
            continue;
        }

        let Some(current) = best else {
            best = Some(tile);
            continue;
        };
        let current_address = current.address();

        let distance = level_distance(address.level(), preferred_level);
        let current_distance = level_distance(current_address.level(), preferred_level);

        let better = match distance.cmp(&current_distance) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                (address.level(), std::cmp::Reverse(address.offset()))
                    < (current_address.level(), std::cmp::Reverse(current_address.offset()))
            }
        };
        if better {
            best = Some(tile);
        }
    }

    best
}

/// Greedy, time-ordered sweep of the best tiles covering `[min, max]`.
///
/// The returned iterator is lazy and finite. Clone it before consuming to
/// sweep the same range again.
///
/// # Example
///
/// ```
/// use timetile::address::TileAddress;
/// use timetile::selector::best_tiles_covering;
/// use timetile::store::TileStore;
/// use timetile::tile::{Tile, TilePayload};
///
/// let mut store = TileStore::new();
/// store.insert(Tile::new(TileAddress::new(0, 0).unwrap(), TilePayload::Empty));
/// store.insert(Tile::new(TileAddress::new(0, 1).unwrap(), TilePayload::Empty));
///
/// let offsets: Vec<i64> = best_tiles_covering(&store, 0.0, 1000.0, 0)
///     .map(|tile| tile.address().offset())
///     .collect();
/// assert_eq!(offsets, vec![0, 1]);
/// ```
pub fn best_tiles_covering(
    store: &TileStore,
    min: f64,
    max: f64,
    preferred_level: i32,
) -> CoveringTiles<'_> {
    let valid = min.is_finite() && max.is_finite();
    CoveringTiles {
        store,
        cursor: min,
        max,
        span: (max - min).max(EPSILON),
        preferred_level,
        done: !valid,
    }
}

/// Iterator returned by [`best_tiles_covering`].
#[derive(Debug, Clone)]
pub struct CoveringTiles<'a> {
    store: &'a TileStore,
    cursor: f64,
    max: f64,
    span: f64,
    preferred_level: i32,
    done: bool,
}

impl<'a> Iterator for CoveringTiles<'a> {
    type Item = &'a Arc<Tile>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.cursor <= self.max {
            let probe = self.cursor + self.span * PROBE_NUDGE;

            let next_cursor = match best_tile_at(self.store, probe, self.preferred_level) {
                Some(tile) => {
                    let next_cursor = tile.address().max_time();
                    self.advance(next_cursor);
                    return Some(tile);
                }
                None => self.cursor + self.span * HOLE_STEP,
            };
            self.advance(next_cursor);
        }
        self.done = true;
        None
    }
}

impl CoveringTiles<'_> {
    /// Move the cursor forward, ending the sweep if it would not move.
    ///
    /// At very large magnitudes the step can vanish below float precision.
    fn advance(&mut self, next_cursor: f64) {
        if next_cursor > self.cursor {
            self.cursor = next_cursor;
        } else {
            self.done = true;
        }
    }
}

fn level_distance(level: i32, preferred: i32) -> u32 {
    level.abs_diff(preferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::TileAddress;
    use crate::tile::TilePayload;

    fn store_with(addresses: &[(i32, i64)]) -> TileStore {
        let mut store = TileStore::new();
        for &(level, offset) in addresses {
            store.insert(Tile::new(
                TileAddress::new(level, offset).unwrap(),
                TilePayload::Empty,
            ));
        }
        store
    }

    fn addresses(tiles: CoveringTiles<'_>) -> Vec<(i32, i64)> {
        tiles
            .map(|tile| (tile.address().level(), tile.address().offset()))
            .collect()
    }

    #[test]
    fn test_best_tile_at_empty_store() {
        let store = TileStore::new();
        assert!(best_tile_at(&store, 100.0, 0).is_none());
    }

    #[test]
    fn test_best_tile_at_no_cover() {
        let store = store_with(&[(0, 5)]);
        assert!(best_tile_at(&store, 100.0, 0).is_none());
    }

    #[test]
    fn test_best_tile_at_prefers_closest_level() {
        // Levels L-2 and L+1 around L = 2: the L+1 tile is closer.
        let store = store_with(&[(0, 0), (3, 0)]);
        let best = best_tile_at(&store, 100.0, 2).unwrap();
        assert_eq!(best.address().level(), 3);
    }

    #[test]
    fn test_best_tile_at_tie_prefers_finer_level() {
        let store = store_with(&[(1, 0), (3, 0)]);
        let best = best_tile_at(&store, 100.0, 2).unwrap();
        assert_eq!(best.address().level(), 1);
    }

    #[test]
    fn test_best_tile_at_exact_level_wins() {
        let store = store_with(&[(0, 0), (1, 0), (2, 0)]);
        let best = best_tile_at(&store, 100.0, 1).unwrap();
        assert_eq!(best.address().level(), 1);
    }

    #[test]
    fn test_best_tile_at_shared_boundary_picks_later_tile() {
        let store = store_with(&[(0, 0), (0, 1)]);
        let best = best_tile_at(&store, 512.0, 0).unwrap();
        assert_eq!(best.address().offset(), 1);
    }

    #[test]
    fn test_covering_contiguous_tiles() {
        let store = store_with(&[(0, 0), (0, 1), (0, 2), (0, 3)]);
        let tiles = best_tiles_covering(&store, 100.0, 1500.0, 0);
        assert_eq!(addresses(tiles), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_covering_skips_holes() {
        let store = store_with(&[(0, 0), (0, 2)]);
        let tiles = best_tiles_covering(&store, 0.0, 1500.0, 0);
        assert_eq!(addresses(tiles), vec![(0, 0), (0, 2)]);
    }

    #[test]
    fn test_covering_mixes_levels() {
        // Fine tile for the first half, coarse tile for the rest.
        let store = store_with(&[(0, 0), (2, 0)]);
        let tiles = best_tiles_covering(&store, 0.0, 2000.0, 0);
        assert_eq!(addresses(tiles), vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_covering_empty_store_terminates() {
        let store = TileStore::new();
        assert_eq!(best_tiles_covering(&store, 0.0, 1000.0, 0).count(), 0);
    }

    #[test]
    fn test_covering_degenerate_span_terminates() {
        let store = store_with(&[(0, 0)]);
        let tiles = best_tiles_covering(&store, 100.0, 100.0, 0);
        assert_eq!(addresses(tiles), vec![(0, 0)]);

        let empty = TileStore::new();
        assert_eq!(best_tiles_covering(&empty, 100.0, 100.0, 0).count(), 0);
    }

    #[test]
    fn test_covering_huge_magnitude_terminates() {
        let store = TileStore::new();
        let count = best_tiles_covering(&store, 1e300, 1e300, 0).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_covering_non_finite_is_empty() {
        let store = store_with(&[(0, 0)]);
        assert_eq!(best_tiles_covering(&store, f64::NAN, 10.0, 0).count(), 0);
        assert_eq!(
            best_tiles_covering(&store, 0.0, f64::INFINITY, 0).count(),
            0
        );
    }

    #[test]
    fn test_covering_is_restartable_by_clone() {
        let store = store_with(&[(0, 0), (0, 1)]);
        let tiles = best_tiles_covering(&store, 0.0, 1000.0, 0);
        let again = tiles.clone();
        assert_eq!(addresses(tiles), addresses(again));
    }
}
