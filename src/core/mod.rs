pub mod constants;
pub mod grid;

pub use constants::{
    ACK_TIMEOUT, BNG_PROJ_DEFINITION, COVERAGE_ENVELOPE, GRID_EXTENT, SQUARE_LETTERS,
};
pub use grid::{SquareResult, grid_bounds, letter_to_square, point_to_square};
