use crate::conditions::*;
use crate::config::InitialVelocity;
use crate::error::FluidError;
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    // Return vector magnitude
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f32) -> Vector2 {
        Vector2 { x: self.x * rhs, y: self.y * rhs }
    }
}

impl Mul<Vector2> for f32 {
    type Output = Vector2;

    fn mul(self, rhs: Vector2) -> Vector2 {
        Vector2 { x: self * rhs.x, y: self * rhs.y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}


/// Immutable extent of a session grid.
///
/// Cell `(col, row)` covers `[col, col + 1] x [row, row + 1]` in grid
/// coordinates and is stored at `row * cols + col`. Row 0 is the bottom wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridDims {
    pub cols: usize,
    pub rows: usize,
    pub grid_scale: f32,
}

impl GridDims {
    pub fn new(cols: usize, rows: usize, grid_scale: f32) -> Result<Self, FluidError> {
        if cols < MIN_EXTENT || rows < MIN_EXTENT {
            return Err(FluidError::GridTooSmall { cols, rows });
        }
        if !(grid_scale.is_finite() && grid_scale > 0.0) {
            return Err(FluidError::InvalidGridScale(grid_scale));
        }
        Ok(Self { cols, rows, grid_scale })
    }

    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_index(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    pub fn decode_index(&self, idx: usize) -> (usize, usize) {
        (idx % self.cols, idx / self.cols)
    }

    pub fn is_border(&self, col: usize, row: usize) -> bool {
        col == 0 || row == 0 || col == self.cols - 1 || row == self.rows - 1
    }

    pub fn is_corner(&self, col: usize, row: usize) -> bool {
        (col == 0 || col == self.cols - 1) && (row == 0 || row == self.rows - 1)
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Vector2 {
        Vector2::new(col as f32 + 0.5, row as f32 + 0.5)
    }

    /// Clamp a continuous position into the interior region, keeping it
    /// strictly below the far wall so that `floor` lands on an interior cell.
    pub fn clamp_interior(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            p.x.clamp(1.0, interior_limit(self.cols)),
            p.y.clamp(1.0, interior_limit(self.rows)),
        )
    }

    /// Interior cell containing a clamped position.
    pub fn interior_cell(&self, p: Vector2) -> (usize, usize) {
        let col = (p.x.floor().max(1.0) as usize).min(self.cols - 2);
        let row = (p.y.floor().max(1.0) as usize).min(self.rows - 2);
        (col, row)
    }

    pub fn iter_interior(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.rows - 1).flat_map(move |row| (1..self.cols - 1).map(move |col| (col, row)))
    }
}

/// Largest coordinate kept inside `[1, extent - 1)`. On wide grids the
/// epsilon drops below one ulp, so the bound falls back to the next float
/// below the wall.
fn interior_limit(extent: usize) -> f32 {
    let wall = (extent - 1) as f32;
    let below = f32::from_bits(wall.to_bits() - 1);
    (wall - EDGE_EPSILON).min(below)
}

/// Read-only row-major view of a buffer laid out on a grid.
#[derive(Clone, Copy, Debug)]
pub struct FieldView<'a, T> {
    pub data: &'a [T],
    pub dims: GridDims,
}

impl<'a, T: Copy> FieldView<'a, T> {
    pub fn new(data: &'a [T], dims: GridDims) -> Self {
        debug_assert_eq!(data.len(), dims.len(), "buffer does not match grid extent");
        Self { data, dims }
    }

    pub fn at(&self, col: usize, row: usize) -> T {
        self.data[self.dims.to_index(col, row)]
    }

    /// Signed access; `None` outside the grid.
    pub fn try_at(&self, col: isize, row: isize) -> Option<T> {
        if col < 0 || row < 0 || col as usize >= self.dims.cols || row as usize >= self.dims.rows {
            None
        } else {
            Some(self.at(col as usize, row as usize))
        }
    }
}


/// Front/back buffer pair. Stages read `current` and write `next`; `swap`
/// exchanges the two allocations without copying.
#[derive(Clone, Debug)]
pub struct DoubleBuffer<T> {
    front: Vec<T>,
    back: Vec<T>,
}

impl<T: Copy> DoubleBuffer<T> {
    pub fn new(initial: Vec<T>) -> Self {
        Self { back: initial.clone(), front: initial }
    }

    pub fn current(&self) -> &[T] {
        &self.front
    }

    /// Borrow the read side and the write side at once.
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        (&self.front, &mut self.back)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}


pub type VelocityField = DoubleBuffer<Vector2>;

/// Build the initial velocity buffer for a session.
pub fn seed_velocity(dims: GridDims, initial: InitialVelocity) -> Vec<Vector2> {
    match initial {
        InitialVelocity::Zero => vec![Vector2::ZERO; dims.len()],
        InitialVelocity::Ramp { gain } => (0..dims.len())
            .map(|idx| {
                let (col, row) = dims.decode_index(idx);
                Vector2::new(col as f32 / dims.cols as f32, row as f32 / dims.rows as f32) * gain
            })
            .collect(),
    }
}

/// Sum of the velocity magnitudes, a cheap "is anything moving" measure.
pub fn kinetic_sum(field: FieldView<'_, Vector2>) -> f32 {
    field.data.iter().map(|v| v.magnitude()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip_is_row_major() {
        let dims = GridDims::new(7, 4, 1.0).unwrap();
        assert_eq!(dims.to_index(3, 2), 17);
        assert_eq!(dims.decode_index(17), (3, 2));
        assert_eq!(dims.len(), 28);
    }

    #[test]
    fn border_and_corner_classification() {
        let dims = GridDims::new(5, 4, 1.0).unwrap();
        assert!(dims.is_corner(0, 0));
        assert!(dims.is_corner(4, 3));
        assert!(!dims.is_corner(2, 0));
        assert!(dims.is_border(2, 0));
        assert!(dims.is_border(4, 1));
        assert!(!dims.is_border(2, 2));
        assert_eq!(dims.iter_interior().count(), 3 * 2);
    }

    #[test]
    fn rejects_degenerate_extents() {
        assert!(matches!(GridDims::new(2, 10, 1.0), Err(FluidError::GridTooSmall { .. })));
        assert!(matches!(GridDims::new(10, 10, 0.0), Err(FluidError::InvalidGridScale(_))));
    }

    #[test]
    fn clamp_interior_stays_below_far_wall() {
        let dims = GridDims::new(10, 6, 1.0).unwrap();
        let p = dims.clamp_interior(Vector2::new(42.0, -3.0));
        assert!(p.x < 9.0 && p.x > 8.99);
        assert_eq!(p.y, 1.0);
        assert_eq!(p.x.floor() as usize, 8);
    }

    #[test]
    fn clamp_interior_on_wide_grid() {
        let dims = GridDims::new(4097, 5, 1.0).unwrap();
        let p = dims.clamp_interior(Vector2::new(1.0e6, 1.0e6));
        assert!(p.x < 4096.0);
        assert!(p.y < 4.0);
        assert_eq!(dims.interior_cell(p), (4095, 3));
    }

    #[test]
    fn swap_exchanges_buffers_without_copy() {
        let mut buf = DoubleBuffer::new(vec![1.0f32; 4]);
        {
            let (src, dst) = buf.split();
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * 2.0;
            }
        }
        let back_ptr = buf.split().1.as_ptr();
        buf.swap();
        assert_eq!(buf.current(), &[2.0; 4]);
        assert_eq!(buf.current().as_ptr(), back_ptr);
    }

    #[test]
    fn ramp_seed_matches_cell_fraction() {
        let dims = GridDims::new(4, 5, 1.0).unwrap();
        let field = seed_velocity(dims, InitialVelocity::Ramp { gain: 2.0 });
        assert_eq!(field[dims.to_index(2, 3)], Vector2::new(1.0, 1.2));
    }

    #[test]
    fn try_at_is_none_outside() {
        let dims = GridDims::new(3, 3, 1.0).unwrap();
        let data = vec![Vector2::new(1.0, 0.0); 9];
        let view = FieldView::new(&data, dims);
        assert!(view.try_at(-1, 0).is_none());
        assert!(view.try_at(0, 3).is_none());
        assert_eq!(view.try_at(2, 2), Some(Vector2::new(1.0, 0.0)));
    }
}
