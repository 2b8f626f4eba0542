//! Tile addressing over the time pyramid.
//!
//! The timeline is cut into tiles at every level. A tile at level `L` spans
//! `2^L * BASE_SPAN` time units, so each level up halves the resolution and
//! doubles the width. Tiles are addressed by `(level, offset)` where
//! `offset = floor(time / width)`.

mod types;

pub use types::{AddressError, TileAddress, TileKey, BASE_SPAN, MAX_LEVEL, MIN_LEVEL};

pub(crate) use types::check_level;

/// Width of a tile at `level`, without range checking.
#[inline]
pub(crate) fn width_at(level: i32) -> f64 {
    2.0_f64.powi(level) * BASE_SPAN
}

/// Width of a tile at the given level, in time units.
///
/// # Example
///
/// ```
/// use timetile::address::tile_width;
///
/// assert_eq!(tile_width(0).unwrap(), 512.0);
/// assert_eq!(tile_width(1).unwrap(), 1024.0);
/// assert_eq!(tile_width(-1).unwrap(), 256.0);
/// ```
#[inline]
pub fn tile_width(level: i32) -> Result<f64, AddressError> {
    check_level(level)?;
    Ok(width_at(level))
}

/// Address of the tile at `level` containing `time`.
///
/// An instant exactly on a boundary belongs to the tile starting there.
pub fn tile_at(level: i32, time: f64) -> Result<TileAddress, AddressError> {
    check_level(level)?;
    if !time.is_finite() {
        return Err(AddressError::NonFiniteTime(time));
    }
    Ok(TileAddress::new_unchecked(level, offset_floor(level, time)))
}

/// Fractional level whose tile width equals `span`.
///
/// Callers pick a rounding (`floor`, `round`, `ceil`) to get an integer level.
/// Non-positive spans yield negative infinity.
pub fn level_for_span(span: f64) -> f64 {
    (span / BASE_SPAN).log2()
}

/// Inclusive range of offsets at `level` touched by the half-open window `[min, max)`.
///
/// When `max` lies exactly on a tile boundary the tile starting at `max` is not
/// visible, so the upper offset is one less. A degenerate window (`min == max`)
/// touches exactly the tile containing `min`.
pub fn offset_range(level: i32, min: f64, max: f64) -> Result<(i64, i64), AddressError> {
    check_level(level)?;
    for value in [min, max] {
        if !value.is_finite() {
            return Err(AddressError::NonFiniteTime(value));
        }
    }

    let first = offset_floor(level, min);
    let mut last = offset_floor(level, max);
    if max > min && last > first && (last as f64) * width_at(level) == max {
        last -= 1;
    }
    Ok((first, last.max(first)))
}

/// `floor(time / width)` saturated into the `i64` range.
#[inline]
fn offset_floor(level: i32, time: f64) -> i64 {
    (time / width_at(level)).floor() as i64
}
