use crate::core::constants::{GRID_EXTENT, SQUARE_LETTERS, SQUARES_PER_SIDE};
use crate::util::coord::Coordinate;
use geo_types::{Point, Rect, coord};

/// One step of the 5x5 square subdivision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareResult {
    /// Letter assigned to the sub-square containing the point
    pub letter: char,
    /// Absolute extent of that sub-square
    pub bounds: Rect<f64>,
    /// The point's offset from `bounds.min()`
    pub relative: Point<f64>,
}

impl SquareResult {
    /// The sub-square's extent in its own frame, with its south-west corner
    /// at the origin. Pair with `relative` to subdivide again.
    pub fn local_bounds(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: self.bounds.width(), y: self.bounds.height() },
        )
    }
}

/// Finds the sub-square of `bounds` containing `pt`.
///
/// `bounds` is split into a 5x5 array. Letters are assigned scanning rows
/// from the top (north) down while rows are indexed from the bottom, so the
/// letter index is `(4 - row) * 5 + col`.
///
/// # Panics
///
/// If `pt` lies outside `bounds`. Callers are expected to have run the
/// coverage check first.
pub fn point_to_square<C: Coordinate>(pt: &C, bounds: &Rect<f64>) -> SquareResult {
    let n = SQUARES_PER_SIDE as f64;
    let cell_w = bounds.width() / n;
    let cell_h = bounds.height() / n;

    let (col, offset_x) = axis_cell(pt.x() - bounds.min().x, cell_w);
    let (row, offset_y) = axis_cell(pt.y() - bounds.min().y, cell_h);

    let last = SQUARES_PER_SIDE as i64 - 1;
    let index = (last - row) * SQUARES_PER_SIDE as i64 + col;
    assert!(
        (0..=last).contains(&col) && (0..=last).contains(&row),
        "point ({}, {}) outside subdivision bounds (col {col}, row {row})",
        pt.x(),
        pt.y(),
    );
    assert!((0..SQUARE_LETTERS.len() as i64).contains(&index));

    let min_x = bounds.min().x + col as f64 * cell_w;
    let min_y = bounds.min().y + row as f64 * cell_h;
    let sub = Rect::new(
        coord! { x: min_x, y: min_y },
        coord! { x: min_x + cell_w, y: min_y + cell_h },
    );

    SquareResult {
        letter: SQUARE_LETTERS[index as usize] as char,
        bounds: sub,
        relative: Point::new(offset_x, offset_y),
    }
}

/// Cell index along one axis and the offset into that cell.
///
/// The offset is taken from the same `rel` the index came from. A quotient
/// that rounds up onto a cell line is stepped back so the offset is never
/// negative for a point inside the cell array.
fn axis_cell(rel: f64, cell: f64) -> (i64, f64) {
    let mut index = (rel / cell).floor() as i64;
    if index > 0 && rel - index as f64 * cell < 0.0 {
        index -= 1;
    } else if index < SQUARES_PER_SIDE as i64 - 1 && rel - index as f64 * cell >= cell {
        index += 1;
    }
    (index, rel - index as f64 * cell)
}

/// Inverse of [`point_to_square`]: the sub-square of `bounds` labelled `letter`.
///
/// Returns `None` for characters outside the 25-letter alphabet (including "I").
pub fn letter_to_square(letter: char, bounds: &Rect<f64>) -> Option<Rect<f64>> {
    let upper = letter.to_ascii_uppercase();
    let index = SQUARE_LETTERS
        .iter()
        .position(|&l| l as char == upper)? as u32;

    let n = SQUARES_PER_SIDE as f64;
    let cell_w = bounds.width() / n;
    let cell_h = bounds.height() / n;
    let col = index % SQUARES_PER_SIDE;
    let row = SQUARES_PER_SIDE - 1 - index / SQUARES_PER_SIDE;

    let min_x = bounds.min().x + col as f64 * cell_w;
    let min_y = bounds.min().y + row as f64 * cell_h;
    Some(Rect::new(
        coord! { x: min_x, y: min_y },
        coord! { x: min_x + cell_w, y: min_y + cell_h },
    ))
}

/// The full 2500 km lettered extent as a rectangle
pub fn grid_bounds() -> Rect<f64> {
    let [x, y, w, h] = GRID_EXTENT;
    Rect::new(coord! { x: x, y: y }, coord! { x: x + w, y: y + h })
}
