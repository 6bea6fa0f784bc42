use crate::core::constants::{COVERAGE_ENVELOPE, MINOR_SQUARE_SIZE};
use crate::core::grid::{grid_bounds, letter_to_square, point_to_square};
use crate::util::coord::{Coordinate, GeodeticPosition, wgs84_to_bng};
use crate::util::error::{BngError, Result};
use geo_types::{Point, Rect, coord};
use std::fmt;
use std::str::FromStr;

/// A British National Grid reference at 1 m resolution, e.g. `SP0009733506`.
///
/// # Example
///
/// ```no_run
/// use bngref_rs::GridReference;
///
/// # fn main() -> Result<(), bngref_rs::BngError> {
/// let reference = GridReference::from_wgs84(-2.0, 52.0)?;
/// assert_eq!(reference.to_string(), "SP0009733506");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridReference {
    /// 500 km square letter followed by 100 km square letter
    pub letters: [char; 2],
    /// Metres east of the 100 km square's west edge (0-99999)
    pub easting: u32,
    /// Metres north of the 100 km square's south edge (0-99999)
    pub northing: u32,
}

impl GridReference {
    /// Project a WGS84 position and encode it.
    pub fn from_wgs84(lon: f64, lat: f64) -> Result<Self> {
        Self::from_position(&GeodeticPosition::new(lon, lat))
    }

    pub fn from_position(position: &GeodeticPosition) -> Result<Self> {
        if !in_coverage(position) {
            return Err(out_of_bounds(position));
        }
        let planar = wgs84_to_bng(position)?;
        encode(position, &planar)
    }

    /// The two-letter 100 km square code, e.g. `SP`
    pub fn letter_pair(&self) -> String {
        self.letters.iter().collect()
    }

    /// Zero-padded 5-digit easting
    pub fn easting_digits(&self) -> String {
        format!("{:05}", self.easting)
    }

    /// Zero-padded 5-digit northing
    pub fn northing_digits(&self) -> String {
        format!("{:05}", self.northing)
    }

    /// Extent of the 100 km square named by the letter pair.
    ///
    /// # Panics
    ///
    /// If a letter was set by hand to something outside the grid alphabet.
    pub fn square_bounds(&self) -> Rect<f64> {
        let major = letter_to_square(self.letters[0], &grid_bounds());
        major
            .and_then(|major| letter_to_square(self.letters[1], &major))
            .expect("GridReference letters are always drawn from the grid alphabet")
    }

    /// The 1 m cell this reference names, in absolute BNG metres.
    pub fn cell_bounds(&self) -> Rect<f64> {
        let sw = self.to_bng_point();
        Rect::new(
            coord! { x: sw.x(), y: sw.y() },
            coord! { x: sw.x() + 1.0, y: sw.y() + 1.0 },
        )
    }

    /// South-west corner of the referenced 1 m cell in BNG metres.
    pub fn to_bng_point(&self) -> Point<f64> {
        let square = self.square_bounds();
        Point::new(
            square.min().x + self.easting as f64,
            square.min().y + self.northing as f64,
        )
    }
}

impl fmt::Display for GridReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:05}{:05}",
            self.letters[0], self.letters[1], self.easting, self.northing
        )
    }
}

impl FromStr for GridReference {
    type Err = BngError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BngError::InvalidReference(s.to_string());
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != 12 {
            return Err(invalid());
        }

        let letters = [chars[0].to_ascii_uppercase(), chars[1].to_ascii_uppercase()];
        let major = letter_to_square(letters[0], &grid_bounds()).ok_or_else(invalid)?;
        letter_to_square(letters[1], &major).ok_or_else(invalid)?;

        let digits: String = chars[2..].iter().collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let easting = digits[..5].parse().map_err(|_| invalid())?;
        let northing = digits[5..].parse().map_err(|_| invalid())?;

        Ok(Self {
            letters,
            easting,
            northing,
        })
    }
}

/// Whether a WGS84 position lies strictly inside the grid's coverage envelope.
pub fn in_coverage<C: Coordinate>(position: &C) -> bool {
    let [min_lon, min_lat, max_lon, max_lat] = COVERAGE_ENVELOPE;
    position.x() > min_lon
        && position.x() < max_lon
        && position.y() > min_lat
        && position.y() < max_lat
}

fn out_of_bounds<C: Coordinate>(position: &C) -> BngError {
    BngError::OutOfBounds {
        longitude: position.x(),
        latitude: position.y(),
    }
}

/// Encodes a projected point as a grid reference.
///
/// `position` is the WGS84 position `planar` was projected from; it is
/// checked against the coverage envelope before any subdivision happens.
pub fn encode<C: Coordinate>(position: &GeodeticPosition, planar: &C) -> Result<GridReference> {
    if !in_coverage(position) {
        return Err(out_of_bounds(position));
    }

    let major = point_to_square(planar, &grid_bounds());
    let minor = point_to_square(&major.relative, &major.local_bounds());

    Ok(GridReference {
        letters: [major.letter, minor.letter],
        easting: offset_digits(minor.relative.x()),
        northing: offset_digits(minor.relative.y()),
    })
}

/// Rounds an in-square offset to whole metres.
///
/// An offset within half a metre of the square's far edge rounds to 100000;
/// that is clamped so the reference stays in its own square.
fn offset_digits(offset: f64) -> u32 {
    assert!(
        (0.0..MINOR_SQUARE_SIZE).contains(&offset),
        "offset {offset} outside a 100 km square"
    );
    (offset.round() as u32).min(MINOR_SQUARE_SIZE as u32 - 1)
}
