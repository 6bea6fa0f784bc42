use crate::core::constants::{BNG_PROJ_DEFINITION, SOURCE_CRS};
use crate::util::error::{BngError, Result};
use geo_types::Point;
use proj::Proj;
use serde::{Deserialize, Serialize};

/// Trait for types that can provide x/y coordinates.
///
/// Implemented for `(f64, f64)` tuples, `geo_types::Point<f64>` and
/// [`GeodeticPosition`] so the projection and grid functions accept any of them.
pub trait Coordinate {
    /// Returns the x-coordinate (easting or longitude).
    fn x(&self) -> f64;
    /// Returns the y-coordinate (northing or latitude).
    fn y(&self) -> f64;
}

impl Coordinate for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }
    fn y(&self) -> f64 {
        self.1
    }
}

impl Coordinate for Point<f64> {
    fn x(&self) -> f64 {
        Point::x(*self)
    }
    fn y(&self) -> f64 {
        Point::y(*self)
    }
}

/// A WGS84 position in decimal degrees, as reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeodeticPosition {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl Coordinate for GeodeticPosition {
    fn x(&self) -> f64 {
        self.longitude
    }
    fn y(&self) -> f64 {
        self.latitude
    }
}

impl From<Point<f64>> for GeodeticPosition {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }
}

/// Projects a WGS84 longitude/latitude onto the British National Grid.
///
/// The destination is the fixed OSGB36 transverse Mercator definition in
/// [`BNG_PROJ_DEFINITION`]; the result is (easting, northing) in metres.
pub fn wgs84_to_bng<C: Coordinate>(coord: &C) -> Result<Point<f64>> {
    let proj = Proj::new_known_crs(SOURCE_CRS, BNG_PROJ_DEFINITION, None)
        .map_err(|e| BngError::Projection(e.to_string()))?;

    let (easting, northing) = proj
        .convert((coord.x(), coord.y()))
        .map_err(|e| BngError::Projection(e.to_string()))?;
    Ok(Point::new(easting, northing))
}
