use crate::config::Scheme;
use crate::executor::Executor;
use crate::grid::{FieldView, GridDims, Vector2, VelocityField};

/// What a stencil sees where the 3x3 neighbourhood leaves the domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Nearest in-domain cell, with the component normal to every crossed
    /// wall negated (no flux through the wall).
    Mirror,
    Zero,
}

impl EdgePolicy {
    fn sample(self, view: FieldView<'_, Vector2>, col: isize, row: isize) -> Vector2 {
        match self {
            EdgePolicy::Zero => view.try_at(col, row).unwrap_or(Vector2::ZERO),
            EdgePolicy::Mirror => {
                let max_col = view.dims.cols as isize - 1;
                let max_row = view.dims.rows as isize - 1;
                let v = view.at(col.clamp(0, max_col) as usize, row.clamp(0, max_row) as usize);
                let fx = if (0..=max_col).contains(&col) { 1.0 } else { -1.0 };
                let fy = if (0..=max_row).contains(&row) { 1.0 } else { -1.0 };
                Vector2::new(v.x * fx, v.y * fy)
            }
        }
    }
}

/// Divergences at the four corners of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerDivergence {
    pub ne: f32,
    pub nw: f32,
    pub se: f32,
    pub sw: f32,
}

impl CornerDivergence {
    pub fn mean(&self) -> f32 {
        0.25 * (self.ne + self.nw + self.se + self.sw)
    }

    /// Gradient from the edge averages: E - W, N - S.
    pub fn gradient(&self) -> Vector2 {
        let east = 0.5 * (self.ne + self.se);
        let west = 0.5 * (self.nw + self.sw);
        let north = 0.5 * (self.ne + self.nw);
        let south = 0.5 * (self.se + self.sw);
        Vector2::new(east - west, north - south)
    }
}

/// 3x3 velocity neighbourhood of one cell.
#[derive(Clone, Copy, Debug)]
pub struct Stencil {
    cells: [[Vector2; 3]; 3],
}

impl Stencil {
    pub fn gather(view: FieldView<'_, Vector2>, col: usize, row: usize, policy: EdgePolicy) -> Self {
        let mut cells = [[Vector2::ZERO; 3]; 3];
        for (j, line) in cells.iter_mut().enumerate() {
            for (i, cell) in line.iter_mut().enumerate() {
                let c = col as isize + i as isize - 1;
                let r = row as isize + j as isize - 1;
                *cell = policy.sample(view, c, r);
            }
        }
        Self { cells }
    }

    /// Neighbour at offset `(dx, dy)`, both in `-1..=1`.
    pub fn at(&self, dx: isize, dy: isize) -> Vector2 {
        self.cells[(dy + 1) as usize][(dx + 1) as usize]
    }

    pub fn central_divergence(&self) -> f32 {
        0.5 * (self.at(1, 0).x - self.at(-1, 0).x) + 0.5 * (self.at(0, 1).y - self.at(0, -1).y)
    }

    /// Divergence of the 2x2 block sharing the corner in direction `(dx, dy)`.
    fn corner(&self, dx: isize, dy: isize) -> f32 {
        let c0 = dx.min(0);
        let r0 = dy.min(0);
        let sw = self.at(c0, r0);
        let se = self.at(c0 + 1, r0);
        let nw = self.at(c0, r0 + 1);
        let ne = self.at(c0 + 1, r0 + 1);
        0.25 * ((se.x - sw.x) + (ne.x - nw.x)) + 0.25 * ((nw.y - sw.y) + (ne.y - se.y))
    }

    pub fn corner_divergences(&self) -> CornerDivergence {
        CornerDivergence {
            ne: self.corner(1, 1),
            nw: self.corner(-1, 1),
            se: self.corner(1, -1),
            sw: self.corner(-1, -1),
        }
    }
}

// Variant A, pass 1
pub fn compute_divergence(exec: &Executor, velocity: FieldView<'_, Vector2>, out: &mut [f32]) {
    let dims = velocity.dims;
    exec.for_each_cell(dims.cols, out, |col, row| {
        if dims.is_border(col, row) {
            0.0
        } else {
            Stencil::gather(velocity, col, row, EdgePolicy::Zero).central_divergence()
        }
    });
}

// Variant A, pass 2
pub fn remove_divergence_gradient(
    exec: &Executor,
    velocity: FieldView<'_, Vector2>,
    divergence: FieldView<'_, f32>,
    relaxation: f32,
    dst: &mut [Vector2],
) {
    let dims = velocity.dims;
    exec.for_each_cell(dims.cols, dst, |col, row| {
        let v = velocity.at(col, row);
        if dims.is_border(col, row) {
            return v;
        }
        let grad = Vector2::new(
            0.5 * (divergence.at(col + 1, row) - divergence.at(col - 1, row)),
            0.5 * (divergence.at(col, row + 1) - divergence.at(col, row - 1)),
        );
        v + relaxation * grad
    });
}

/// Variant B: fused corner-stencil pass over the interior. Border cells are
/// carried through and re-derived by the next boundary pass.
pub fn remove_divergence_corner(
    exec: &Executor,
    velocity: FieldView<'_, Vector2>,
    relaxation: f32,
    dst: &mut [Vector2],
) {
    let dims = velocity.dims;
    exec.for_each_cell(dims.cols, dst, |col, row| {
        if dims.is_border(col, row) {
            return velocity.at(col, row);
        }
        let stencil = Stencil::gather(velocity, col, row, EdgePolicy::Mirror);
        stencil.at(0, 0) + relaxation * stencil.corner_divergences().gradient()
    });
}

/// One relaxation pass of `scheme`, ending with the result in the current
/// buffer. `divergence` is scratch space for the central scheme.
pub fn relax(
    exec: &Executor,
    dims: GridDims,
    scheme: Scheme,
    field: &mut VelocityField,
    divergence: &mut [f32],
    relaxation: f32,
) {
    match scheme {
        Scheme::Central => {
            compute_divergence(exec, FieldView::new(field.current(), dims), divergence);
            let (src, dst) = field.split();
            let div = FieldView::new(&*divergence, dims);
            remove_divergence_gradient(exec, FieldView::new(src, dims), div, relaxation, dst);
        }
        Scheme::Corner => {
            let (src, dst) = field.split();
            remove_divergence_corner(exec, FieldView::new(src, dims), relaxation, dst);
        }
    }
    field.swap();
}

impl Scheme {
    /// Divergence of one interior cell as this scheme sees it.
    pub fn cell_divergence(self, velocity: FieldView<'_, Vector2>, col: usize, row: usize) -> f32 {
        match self {
            Scheme::Central => Stencil::gather(velocity, col, row, EdgePolicy::Zero).central_divergence(),
            Scheme::Corner => Stencil::gather(velocity, col, row, EdgePolicy::Mirror)
                .corner_divergences()
                .mean(),
        }
    }

    /// Sum of |divergence| over the interior cells.
    pub fn residual(self, exec: &Executor, velocity: FieldView<'_, Vector2>) -> f32 {
        let dims = velocity.dims;
        exec.sum_interior(dims.cols, dims.rows, |col, row| self.cell_divergence(velocity, col, row).abs())
    }

    /// Fill `out` with this scheme's divergence estimate, border cells 0.
    pub fn estimate_into(self, exec: &Executor, velocity: FieldView<'_, Vector2>, out: &mut [f32]) {
        let dims = velocity.dims;
        exec.for_each_cell(dims.cols, out, |col, row| {
            if dims.is_border(col, row) {
                0.0
            } else {
                self.cell_divergence(velocity, col, row)
            }
        });
    }
}
