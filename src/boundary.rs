use crate::executor::Executor;
use crate::grid::{FieldView, Vector2};
use crate::stirrer::Stirrer;

/// Boundary rule for a single cell, first match wins:
/// closed corners, free-slip top/bottom, free-slip left/right, stirrer,
/// then pass-through.
pub fn boundary_cell(src: FieldView<'_, Vector2>, stirrer: &Stirrer, col: usize, row: usize) -> Vector2 {
    let dims = src.dims;
    let last_col = dims.cols - 1;
    let last_row = dims.rows - 1;

    if dims.is_corner(col, row) {
        return Vector2::ZERO;
    }

    // Bottom / top edge: keep tangential x from the adjacent row, zero y.
    if row == 0 {
        return Vector2::new(src.at(col, 1).x, 0.0);
    }
    if row == last_row {
        return Vector2::new(src.at(col, last_row - 1).x, 0.0);
    }

    // Left / right edge: zero x, keep tangential y from the adjacent column.
    if col == 0 {
        return Vector2::new(0.0, src.at(1, row).y);
    }
    if col == last_col {
        return Vector2::new(0.0, src.at(last_col - 1, row).y);
    }

    if stirrer.covers(dims.cell_center(col, row)) {
        return stirrer.velocity;
    }

    src.at(col, row)
}

/// Write the boundary-conditioned copy of `src` into `dst`.
pub fn apply_boundary(exec: &Executor, src: FieldView<'_, Vector2>, stirrer: &Stirrer, dst: &mut [Vector2]) {
    exec.for_each_cell(src.dims.cols, dst, |col, row| boundary_cell(src, stirrer, col, row));
}
