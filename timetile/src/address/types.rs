//! Tile address types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Width of a level-0 tile, in time units.
///
/// Each tile at level `L` covers `2^L * BASE_SPAN` time units.
pub const BASE_SPAN: f64 = 512.0;

/// Finest supported level.
pub const MIN_LEVEL: i32 = -64;

/// Coarsest supported level.
pub const MAX_LEVEL: i32 = 64;

/// Errors produced by tile address arithmetic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddressError {
    /// Level outside `MIN_LEVEL..=MAX_LEVEL`.
    #[error("Level {0} out of range (-64 to 64)")]
    LevelOutOfRange(i32),

    /// Time value is NaN or infinite.
    #[error("Non-finite time value: {0}")]
    NonFiniteTime(f64),

    /// Tile key string could not be parsed.
    #[error("Invalid tile key: {0:?}")]
    InvalidKey(String),
}

/// Validates that `level` is within the supported range.
pub(crate) fn check_level(level: i32) -> Result<(), AddressError> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(AddressError::LevelOutOfRange(level))
    }
}

/// Immutable `(level, offset)` key of a tile in the time pyramid.
///
/// For a fixed level the addresses partition the timeline: tile `offset`
/// covers `[offset * width, (offset + 1) * width)`.
///
/// # Example
///
/// ```
/// use timetile::address::TileAddress;
///
/// let address = TileAddress::new(0, 1).unwrap();
/// assert_eq!(address.min_time(), 512.0);
/// assert_eq!(address.max_time(), 1024.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    level: i32,
    offset: i64,
}

impl TileAddress {
    /// Create a tile address, rejecting levels outside the supported range.
    pub fn new(level: i32, offset: i64) -> Result<Self, AddressError> {
        check_level(level)?;
        Ok(Self { level, offset })
    }

    /// Create an address whose level is already known to be valid.
    pub(crate) fn new_unchecked(level: i32, offset: i64) -> Self {
        debug_assert!((MIN_LEVEL..=MAX_LEVEL).contains(&level));
        Self { level, offset }
    }

    /// Get the level.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Get the offset.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Width of this tile in time units.
    pub fn width(&self) -> f64 {
        super::width_at(self.level)
    }

    /// First instant covered by this tile.
    pub fn min_time(&self) -> f64 {
        self.offset as f64 * self.width()
    }

    /// First instant past the end of this tile.
    pub fn max_time(&self) -> f64 {
        self.min_time() + self.width()
    }

    /// Whether `time` lies within `[min_time, max_time]`.
    ///
    /// Both ends are inclusive, so an instant on a boundary is covered by the
    /// tiles on either side of it.
    pub fn covers(&self, time: f64) -> bool {
        self.min_time() <= time && time <= self.max_time()
    }

    /// Stable string form of this address.
    pub fn key(&self) -> TileKey {
        TileKey(format!("{}.{}", self.level, self.offset))
    }

    /// Address one step left along the same level.
    pub fn previous(&self) -> Self {
        Self::new_unchecked(self.level, self.offset.saturating_sub(1))
    }

    /// Address one step right along the same level.
    pub fn next(&self) -> Self {
        Self::new_unchecked(self.level, self.offset.saturating_add(1))
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}@{}", self.level, self.offset)
    }
}

/// String key for an address, in the form `"<level>.<offset>"`.
///
/// Used for the retry counters and for tile URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(String);

impl TileKey {
    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TileAddress> for TileKey {
    fn from(address: TileAddress) -> Self {
        address.key()
    }
}

impl FromStr for TileAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidKey(s.to_string());
        let (level, offset) = s.split_once('.').ok_or_else(invalid)?;
        let level: i32 = level.parse().map_err(|_| invalid())?;
        let offset: i64 = offset.parse().map_err(|_| invalid())?;
        TileAddress::new(level, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_level_out_of_range() {
        assert!(TileAddress::new(MAX_LEVEL, 0).is_ok());
        assert!(TileAddress::new(MIN_LEVEL, 0).is_ok());
        assert_eq!(
            TileAddress::new(MAX_LEVEL + 1, 0),
            Err(AddressError::LevelOutOfRange(MAX_LEVEL + 1))
        );
        assert_eq!(
            TileAddress::new(MIN_LEVEL - 1, 0),
            Err(AddressError::LevelOutOfRange(MIN_LEVEL - 1))
        );
    }

    #[test]
    fn test_time_range_level_zero() {
        let address = TileAddress::new(0, 3).unwrap();
        assert_eq!(address.width(), 512.0);
        assert_eq!(address.min_time(), 1536.0);
        assert_eq!(address.max_time(), 2048.0);
    }

    #[test]
    fn test_time_range_negative_offset() {
        let address = TileAddress::new(1, -1).unwrap();
        assert_eq!(address.min_time(), -1024.0);
        assert_eq!(address.max_time(), 0.0);
    }

    #[test]
    fn test_time_range_negative_level() {
        let address = TileAddress::new(-2, 4).unwrap();
        assert_eq!(address.width(), 128.0);
        assert_eq!(address.min_time(), 512.0);
    }

    #[test]
    fn test_covers_is_inclusive() {
        let address = TileAddress::new(0, 0).unwrap();
        assert!(address.covers(0.0));
        assert!(address.covers(512.0));
        assert!(address.covers(100.0));
        assert!(!address.covers(512.5));
        assert!(!address.covers(-0.1));
    }

    #[test]
    fn test_equality_is_by_level_and_offset() {
        let a = TileAddress::new(2, 7).unwrap();
        let b = TileAddress::new(2, 7).unwrap();
        let c = TileAddress::new(3, 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_key_format() {
        assert_eq!(TileAddress::new(0, 1).unwrap().key().as_str(), "0.1");
        assert_eq!(TileAddress::new(-3, -12).unwrap().key().as_str(), "-3.-12");
    }

    #[test]
    fn test_parse_key() {
        let parsed: TileAddress = "4.123".parse().unwrap();
        assert_eq!(parsed, TileAddress::new(4, 123).unwrap());

        let parsed: TileAddress = "-3.-12".parse().unwrap();
        assert_eq!(parsed, TileAddress::new(-3, -12).unwrap());

        assert!(matches!(
            "4".parse::<TileAddress>(),
            Err(AddressError::InvalidKey(_))
        ));
        assert!(matches!(
            "x.1".parse::<TileAddress>(),
            Err(AddressError::InvalidKey(_))
        ));
        assert!(matches!(
            "99.1".parse::<TileAddress>(),
            Err(AddressError::LevelOutOfRange(99))
        ));
    }

    #[test]
    fn test_neighbours() {
        let address = TileAddress::new(1, 5).unwrap();
        assert_eq!(address.previous(), TileAddress::new(1, 4).unwrap());
        assert_eq!(address.next(), TileAddress::new(1, 6).unwrap());
        assert_eq!(address.previous().max_time(), address.min_time());
    }

    #[test]
    fn test_display() {
        let address = TileAddress::new(2, 9).unwrap();
        assert_eq!(format!("{}", address), "L2@9");
    }

    #[test]
    fn test_error_display() {
        let err = AddressError::LevelOutOfRange(70);
        assert!(err.to_string().contains("70"));
        assert!(err.to_string().contains("-64"));
    }
}
