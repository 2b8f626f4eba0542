//! Tile payloads and per-address tile state.
//!
//! A [`Tile`] is a resolved unit of data: an address plus exactly one kind of
//! payload. [`TileState`] is the scheduler's view of an address, which may also
//! be pending or abandoned.

mod json;

pub use json::decode_payload;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::address::TileAddress;

/// A single `(time, value)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlottablePoint {
    /// Sample time, in the same units as the tile timeline.
    pub time: f64,
    /// Sample value.
    pub value: f64,
}

impl PlottablePoint {
    /// Create a new point.
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Metadata for a photo attached to the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDescription {
    /// Photo identifier, `-1` when the source omitted it.
    #[serde(default = "PhotoDescription::missing_id")]
    pub id: i64,
    /// Time the photo was taken.
    #[serde(rename = "begin_d")]
    pub begin_time: f64,
    /// End of the span the photo represents.
    #[serde(rename = "end_d", default)]
    pub end_time: Option<f64>,
    /// Number of photos this entry stands for.
    #[serde(default = "PhotoDescription::single")]
    pub count: u32,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Not safe for work.
    #[serde(default)]
    pub nsfw: bool,
}

impl PhotoDescription {
    fn missing_id() -> i64 {
        -1
    }

    fn single() -> u32 {
        1
    }
}

/// Data carried by a resolved tile.
///
/// A payload is never two kinds at once.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TilePayload {
    /// Time-ordered samples.
    Points(Vec<PlottablePoint>),
    /// Photo metadata.
    Photos(Vec<PhotoDescription>),
    /// The source had nothing for this address, or sent something unreadable.
    #[default]
    Empty,
}

impl TilePayload {
    /// Build a point payload, sorting samples by time.
    pub fn points(mut points: Vec<PlottablePoint>) -> Self {
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self::Points(points)
    }

    /// Number of entries in the payload.
    pub fn len(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            Self::Photos(photos) => photos.len(),
            Self::Empty => 0,
        }
    }

    /// Whether the payload holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the payload kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Points(_) => "points",
            Self::Photos(_) => "photos",
            Self::Empty => "empty",
        }
    }
}

/// A resolved tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    address: TileAddress,
    payload: TilePayload,
}

impl Tile {
    /// Create a resolved tile.
    pub fn new(address: TileAddress, payload: TilePayload) -> Self {
        Self { address, payload }
    }

    /// Get the tile address.
    pub fn address(&self) -> TileAddress {
        self.address
    }

    /// Get the payload.
    pub fn payload(&self) -> &TilePayload {
        &self.payload
    }

    /// Whether the tile carries points or photos, as opposed to `Empty`.
    ///
    /// An empty point list still counts as data.
    pub fn contains_data(&self) -> bool {
        !matches!(self.payload, TilePayload::Empty)
    }

    /// Points in this tile, if it is a point tile.
    pub fn points(&self) -> Option<&[PlottablePoint]> {
        match &self.payload {
            TilePayload::Points(points) => Some(points),
            _ => None,
        }
    }

    /// Photo descriptions in this tile, if it is a photo tile.
    pub fn photos(&self) -> Option<&[PhotoDescription]> {
        match &self.payload {
            TilePayload::Photos(photos) => Some(photos),
            _ => None,
        }
    }
}

/// Scheduler view of a single address.
#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    /// Data has arrived.
    Resolved(Arc<Tile>),
    /// A fetch is outstanding. `attempt` is 1 for the first request and counts
    /// up with each retry.
    Pending { attempt: u32 },
    /// The retry budget ran out. The address stays out of the store unless
    /// something requests it again.
    Abandoned,
}

impl TileState {
    /// Whether the state is `Resolved`.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(tile) => write!(f, "Resolved({})", tile.payload().kind()),
            Self::Pending { attempt } => write!(f, "Pending(attempt {})", attempt),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> TileAddress {
        TileAddress::new(0, 0).unwrap()
    }

    #[test]
    fn test_points_constructor_sorts() {
        let payload = TilePayload::points(vec![
            PlottablePoint::new(3.0, 1.0),
            PlottablePoint::new(1.0, 2.0),
            PlottablePoint::new(2.0, 3.0),
        ]);
        let TilePayload::Points(points) = payload else {
            panic!("Expected points payload");
        };
        let times: Vec<f64> = points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_payload_len_and_kind() {
        assert_eq!(TilePayload::Empty.len(), 0);
        assert!(TilePayload::Empty.is_empty());
        assert_eq!(TilePayload::Empty.kind(), "empty");

        let payload = TilePayload::points(vec![PlottablePoint::new(0.0, 0.0)]);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.kind(), "points");
    }

    #[test]
    fn test_tile_accessors() {
        let tile = Tile::new(
            address(),
            TilePayload::points(vec![PlottablePoint::new(1.0, 5.0)]),
        );
        assert!(tile.contains_data());
        assert_eq!(tile.points().map(|p| p.len()), Some(1));
        assert!(tile.photos().is_none());
    }

    #[test]
    fn test_empty_tile_has_no_data() {
        let tile = Tile::new(address(), TilePayload::Empty);
        assert!(!tile.contains_data());
        assert!(tile.points().is_none());
        assert!(tile.photos().is_none());
    }

    #[test]
    fn test_tile_state_display() {
        let resolved = TileState::Resolved(Arc::new(Tile::new(address(), TilePayload::Empty)));
        assert_eq!(resolved.to_string(), "Resolved(empty)");
        assert!(resolved.is_resolved());
        assert_eq!(
            TileState::Pending { attempt: 2 }.to_string(),
            "Pending(attempt 2)"
        );
        assert_eq!(TileState::Abandoned.to_string(), "Abandoned");
    }
}
