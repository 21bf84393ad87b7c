use crate::conditions::LIQUID_TOP_FRACTION;
use crate::grid::{DoubleBuffer, FieldView, GridDims};

/// Per-cell liquid fraction, seeded with a rectangular blob on the left.
///
/// Transport is not implemented: each sub-step copies the fraction through
/// unchanged, so the total amount of liquid stays exactly constant.
#[derive(Clone, Debug)]
pub struct LiquidField {
    dims: GridDims,
    buffer: DoubleBuffer<f32>,
}

impl LiquidField {
    pub fn new(dims: GridDims) -> Self {
        let top = (dims.rows as f32 * LIQUID_TOP_FRACTION) as usize;
        let mut amount = vec![0.0; dims.len()];
        for row in dims.rows / 2..top {
            for col in 1..dims.cols / 2 {
                amount[dims.to_index(col, row)] = 1.0;
            }
        }
        Self { dims, buffer: DoubleBuffer::new(amount) }
    }

    pub fn view(&self) -> FieldView<'_, f32> {
        FieldView::new(self.buffer.current(), self.dims)
    }

    pub fn transport(&mut self) {
        let (src, dst) = self.buffer.split();
        dst.copy_from_slice(src);
        self.buffer.swap();
    }

    /// Sum of the fractions over the interior cells.
    pub fn total_liquid(&self) -> f32 {
        let view = self.view();
        self.dims.iter_interior().map(|(col, row)| view.at(col, row)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_covers_left_half_band() {
        let dims = GridDims::new(60, 60, 0.1).unwrap();
        let liquid = LiquidField::new(dims);
        let view = liquid.view();
        assert_eq!(view.at(1, 30), 1.0);
        assert_eq!(view.at(29, 49), 1.0);
        assert_eq!(view.at(30, 40), 0.0);
        assert_eq!(view.at(0, 40), 0.0);
        assert_eq!(view.at(10, 50), 0.0);
        assert_eq!(liquid.total_liquid(), 29.0 * 20.0);
    }

    #[test]
    fn transport_conserves_total() {
        let dims = GridDims::new(12, 12, 1.0).unwrap();
        let mut liquid = LiquidField::new(dims);
        let before = liquid.total_liquid();
        for _ in 0..5 {
            liquid.transport();
        }
        assert_eq!(liquid.total_liquid(), before);
    }
}
