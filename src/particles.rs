use crate::conditions::PARTICLE_LINE_FRACTION;
use crate::grid::{FieldView, GridDims, Vector2};
use rand::Rng;

/// Passive tracers. They read the velocity field but never write to it.
#[derive(Clone, Debug)]
pub struct ParticleSet {
    positions: Vec<Vector2>,
}

impl ParticleSet {
    /// One particle per interior column, lined up at `line_height`
    /// (default: 5/6 of the way up).
    pub fn new(dims: GridDims, line_height: Option<f32>) -> Self {
        let y = line_height.unwrap_or((dims.rows as f32 * PARTICLE_LINE_FRACTION).floor());
        let positions = (0..dims.cols - 2)
            .map(|k| dims.clamp_interior(Vector2::new(k as f32 + 1.5, y)))
            .collect();
        Self { positions }
    }

    pub fn positions(&self) -> &[Vector2] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Move every particle with the velocity of the cell it sits in, minus
    /// the settling bias on y, plus uniform jitter on both axes.
    pub fn advance<R: Rng>(
        &mut self,
        velocity: FieldView<'_, Vector2>,
        dt: f32,
        settling_bias: f32,
        jitter: f32,
        rng: &mut R,
    ) {
        let dims = velocity.dims;
        for p in self.positions.iter_mut() {
            let here = dims.clamp_interior(*p);
            let (col, row) = dims.interior_cell(here);
            let mut v = velocity.at(col, row);
            v.y -= settling_bias;

            let mut next = here + v * dt;
            if jitter > 0.0 {
                next += Vector2::new(rng.random_range(-jitter..=jitter), rng.random_range(-jitter..=jitter));
            }
            *p = dims.clamp_interior(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn initial_line_spans_interior_columns() {
        let dims = GridDims::new(60, 60, 0.1).unwrap();
        let set = ParticleSet::new(dims, None);
        assert_eq!(set.len(), 58);
        assert_eq!(set.positions()[0], Vector2::new(1.5, 50.0));
        assert_eq!(set.positions()[57], Vector2::new(58.5, 50.0));
    }

    #[test]
    fn line_height_is_clamped_inside() {
        let dims = GridDims::new(5, 5, 1.0).unwrap();
        let set = ParticleSet::new(dims, Some(100.0));
        assert!(set.positions().iter().all(|p| p.y < 4.0 && p.y > 3.99));
    }

    #[test]
    fn particles_settle_in_still_fluid() {
        let dims = GridDims::new(8, 8, 1.0).unwrap();
        let still = vec![Vector2::ZERO; dims.len()];
        let mut set = ParticleSet::new(dims, Some(5.0));
        let mut rng = StdRng::seed_from_u64(7);
        set.advance(FieldView::new(&still, dims), 0.5, 1.0, 0.0, &mut rng);
        assert!(set.positions().iter().all(|p| p.y == 4.5));

        for _ in 0..20 {
            set.advance(FieldView::new(&still, dims), 0.5, 1.0, 0.0, &mut rng);
        }
        // Resting on the floor of the interior.
        assert!(set.positions().iter().all(|p| p.y == 1.0));
    }

    #[test]
    fn fast_flow_on_wide_grid_stays_below_wall() {
        let dims = GridDims::new(4097, 5, 1.0).unwrap();
        let flow = vec![Vector2::new(1000.0, 0.0); dims.len()];
        let mut set = ParticleSet::new(dims, Some(2.0));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            set.advance(FieldView::new(&flow, dims), 1.0, 0.0, 0.025, &mut rng);
        }
        let max_x = set.positions().iter().map(|p| p.x).fold(0.0f32, f32::max);
        assert!(max_x < 4096.0, "max particle x = {max_x}");
    }

    #[test]
    fn jitter_is_bounded() {
        let dims = GridDims::new(10, 10, 1.0).unwrap();
        let still = vec![Vector2::ZERO; dims.len()];
        let mut set = ParticleSet::new(dims, Some(5.0));
        let before = set.positions().to_vec();
        let mut rng = StdRng::seed_from_u64(1);
        set.advance(FieldView::new(&still, dims), 1.0, 0.0, 0.025, &mut rng);
        for (a, b) in before.iter().zip(set.positions()) {
            assert!((a.x - b.x).abs() <= 0.025 + 1e-6);
            assert!((a.y - b.y).abs() <= 0.025 + 1e-6);
        }
    }
}
