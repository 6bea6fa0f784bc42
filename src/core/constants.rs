use std::time::Duration;

/// Grid square letters in scan order (top-left to bottom-right). "I" is never used.
pub const SQUARE_LETTERS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Number of sub-squares along each axis at every subdivision level
pub const SQUARES_PER_SIDE: u32 = 5;

/// Side of a top-level (500 km) grid square in metres
pub const MAJOR_SQUARE_SIZE: f64 = 500_000.0;

/// Side of a second-level (100 km) grid square in metres
pub const MINOR_SQUARE_SIZE: f64 = 100_000.0;

/// Full lettered grid extent `[min_x, min_y, width, height]`.
///
/// BNG (0, 0) is the south-west corner of square S, which sits at column 2,
/// row 1 of the 5x5 array of 500 km squares.
pub const GRID_EXTENT: [f64; 4] = [
    -2.0 * MAJOR_SQUARE_SIZE,
    -MAJOR_SQUARE_SIZE,
    5.0 * MAJOR_SQUARE_SIZE,
    5.0 * MAJOR_SQUARE_SIZE,
];

/// Approximate WGS84 envelope of the grid `[min_lon, min_lat, max_lon, max_lat]`.
/// All four edges are exclusive.
pub const COVERAGE_ENVELOPE: [f64; 4] = [-7.56, 49.96, 1.78, 60.84];

/// Source CRS: WGS84 longitude/latitude in degrees
pub const SOURCE_CRS: &str = "EPSG:4326";

/// Destination CRS: British National Grid transverse Mercator on Airy 1830 / OSGB36
pub const BNG_PROJ_DEFINITION: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 \
     +x_0=400000 +y_0=-100000 +ellps=airy +datum=OSGB36 +units=m +no_defs +type=crs";

/// How long a delivery may stay unacknowledged before it is abandoned
pub const ACK_TIMEOUT: Duration = Duration::from_secs(20);

/// Oldest cached position the location provider may return
pub const LOCATION_MAXIMUM_AGE: Duration = Duration::from_millis(15_000);

/// Upper bound on a single position fetch
pub const LOCATION_TIMEOUT: Duration = Duration::from_millis(15_000);

/// A peer re-requests a position once its last response is older than this
pub const PEER_STALE_AFTER: Duration = Duration::from_secs(15);
