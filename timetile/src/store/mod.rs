//! Resolved tile storage.
//!
//! The store maps addresses to resolved tiles and only ever grows. There is
//! no eviction: every tile fetched during a scheduler's lifetime is retained,
//! which suits session-scoped charts. [`TileStore::len`] and
//! [`TileStore::point_count`] expose the growth for monitoring.

use std::collections::HashMap;
use std::sync::Arc;

use crate::address::TileAddress;
use crate::tile::Tile;

/// Mapping from address to resolved tile.
#[derive(Debug, Default, Clone)]
pub struct TileStore {
    tiles: HashMap<TileAddress, Arc<Tile>>,
}

impl TileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved tile, replacing any tile already stored at its address.
    ///
    /// Returns the previous tile, if any.
    pub fn insert(&mut self, tile: Tile) -> Option<Arc<Tile>> {
        self.tiles.insert(tile.address(), Arc::new(tile))
    }

    /// Look up the tile at `address`.
    pub fn get(&self, address: &TileAddress) -> Option<&Arc<Tile>> {
        self.tiles.get(address)
    }

    /// Whether a tile is stored at `address`.
    pub fn contains(&self, address: &TileAddress) -> bool {
        self.tiles.contains_key(address)
    }

    /// Number of stored tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over all stored tiles in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tile>> {
        self.tiles.values()
    }

    /// Total number of payload entries across all tiles.
    pub fn point_count(&self) -> usize {
        self.tiles.values().map(|tile| tile.payload().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{PlottablePoint, TilePayload};

    fn tile(level: i32, offset: i64, points: usize) -> Tile {
        let address = TileAddress::new(level, offset).unwrap();
        let points = (0..points)
            .map(|i| PlottablePoint::new(address.min_time() + i as f64, i as f64))
            .collect();
        Tile::new(address, TilePayload::points(points))
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = TileStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.point_count(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = TileStore::new();
        assert!(store.insert(tile(0, 1, 3)).is_none());

        let address = TileAddress::new(0, 1).unwrap();
        assert!(store.contains(&address));
        assert_eq!(store.get(&address).unwrap().payload().len(), 3);
        assert!(store.get(&TileAddress::new(0, 2).unwrap()).is_none());
    }

    #[test]
    fn test_insert_replaces_same_address() {
        let mut store = TileStore::new();
        store.insert(tile(0, 1, 3));
        let previous = store.insert(tile(0, 1, 5));

        assert_eq!(previous.unwrap().payload().len(), 3);
        assert_eq!(store.len(), 1);
        assert_eq!(store.point_count(), 5);
    }

    #[test]
    fn test_iter_and_counts() {
        let mut store = TileStore::new();
        store.insert(tile(0, 0, 2));
        store.insert(tile(1, 0, 4));
        store.insert(tile(0, 1, 0));

        assert_eq!(store.len(), 3);
        assert_eq!(store.iter().count(), 3);
        assert_eq!(store.point_count(), 6);
    }
}
