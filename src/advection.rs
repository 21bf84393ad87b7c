use crate::executor::Executor;
use crate::grid::{FieldView, Vector2};

// Semi-Lagrangian advection: figure out where the parcel now at the center
// of a cell came from, then interpolate the velocity there.

/// Mean of the four cells sharing the corner of `(col, row)` in direction
/// `(dx, dy)`, each of which is -1 or +1.
fn corner_velocity(src: FieldView<'_, Vector2>, col: usize, row: usize, dx: isize, dy: isize) -> Vector2 {
    let c1 = (col as isize + dx) as usize;
    let r1 = (row as isize + dy) as usize;
    0.25 * (src.at(col, row) + src.at(c1, row) + src.at(col, r1) + src.at(c1, r1))
}

/// Backward-traced velocity for one interior cell.
pub fn advect_cell(src: FieldView<'_, Vector2>, dt: f32, col: usize, row: usize) -> Vector2 {
    let dims = src.dims;
    let velocity = src.at(col, row);
    if dims.is_border(col, row) {
        return velocity;
    }

    // Fluid can't come from outside the closed box.
    let origin = dims.clamp_interior(dims.cell_center(col, row) - velocity * (dt / dims.grid_scale));

    let (oc, or) = dims.interior_cell(origin);

    let bl = corner_velocity(src, oc, or, -1, -1);
    let br = corner_velocity(src, oc, or, 1, -1);
    let tl = corner_velocity(src, oc, or, -1, 1);
    let tr = corner_velocity(src, oc, or, 1, 1);

    let sx = origin.x - oc as f32;
    let sy = origin.y - or as f32;

    (1.0 - sx) * (1.0 - sy) * bl + sx * (1.0 - sy) * br + (1.0 - sx) * sy * tl + sx * sy * tr
}

/// Advect the whole field; border cells are carried through unchanged and
/// fixed by the following boundary stage.
pub fn advect(exec: &Executor, src: FieldView<'_, Vector2>, dt: f32, dst: &mut [Vector2]) {
    exec.for_each_cell(src.dims.cols, dst, |col, row| advect_cell(src, dt, col, row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDims;

    fn run(dims: GridDims, src: &[Vector2], dt: f32) -> Vec<Vector2> {
        let mut dst = vec![Vector2::new(f32::NAN, f32::NAN); dims.len()];
        advect(&Executor::Sequential, FieldView::new(src, dims), dt, &mut dst);
        dst
    }

    #[test]
    fn zero_field_is_unchanged() {
        let dims = GridDims::new(9, 7, 0.1).unwrap();
        let src = vec![Vector2::ZERO; dims.len()];
        assert_eq!(run(dims, &src, 0.05), src);
    }

    #[test]
    fn uniform_translation_is_a_fixed_point() {
        let dims = GridDims::new(12, 10, 1.0).unwrap();
        let src = vec![Vector2::new(1.0, 0.0); dims.len()];
        let dst = run(dims, &src, 1.0);
        for (col, row) in dims.iter_interior() {
            let v = dst[dims.to_index(col, row)];
            assert!((v.x - 1.0).abs() < 1e-5, "({col},{row}) -> {v:?}");
            assert!(v.y.abs() < 1e-6);
        }
    }

    #[test]
    fn border_cells_are_carried() {
        let dims = GridDims::new(5, 5, 1.0).unwrap();
        let src: Vec<Vector2> = (0..25).map(|i| Vector2::new(i as f32, -(i as f32))).collect();
        let dst = run(dims, &src, 0.5);
        for idx in 0..25 {
            let (c, r) = dims.decode_index(idx);
            if dims.is_border(c, r) {
                assert_eq!(dst[idx], src[idx]);
            }
        }
    }

    #[test]
    fn origin_is_clamped_inside_the_box() {
        // A huge velocity would trace far outside the grid; the sample must
        // still come from interior data and stay finite.
        let dims = GridDims::new(6, 6, 1.0).unwrap();
        let mut src = vec![Vector2::new(0.5, 0.5); dims.len()];
        src[dims.to_index(2, 2)] = Vector2::new(1.0e6, -1.0e6);
        let dst = run(dims, &src, 1.0);
        assert!(dst.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn wide_grid_trace_stays_in_bounds() {
        let dims = GridDims::new(4097, 3, 1.0).unwrap();
        let mut src = vec![Vector2::ZERO; dims.len()];
        src[dims.to_index(4095, 1)] = Vector2::new(-10.0, 0.0);
        let dst = run(dims, &src, 1.0);
        assert!(dst.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn samples_upstream_value() {
        // Flow to the right carries the left neighbour's value in.
        let dims = GridDims::new(8, 5, 1.0).unwrap();
        let mut src = vec![Vector2::new(1.0, 0.0); dims.len()];
        for row in 0..5 {
            src[dims.to_index(3, row)] = Vector2::new(2.0, 0.0);
        }
        let dst = run(dims, &src, 1.0);
        // Cell 4 traces back to the corner between columns 3 and 4 rows.
        assert!(dst[dims.to_index(4, 2)].x > 1.0);
        // Cell 2 traces back to column 1, unaffected by column 3.
        assert!((dst[dims.to_index(2, 2)].x - 1.0).abs() < 1e-6);
    }
}
