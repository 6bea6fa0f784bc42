pub mod coord;
pub mod dms;
pub mod error;

pub use coord::{Coordinate, GeodeticPosition, wgs84_to_bng};
pub use dms::{Hemisphere, to_dms};
pub use error::{BngError, Result};
