use crate::config::StirrerConfig;
use crate::grid::Vector2;

/// Circular forcing region. Interior cells whose center falls inside it have
/// their velocity replaced by `velocity` during the boundary stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stirrer {
    pub center: Vector2,
    pub radius: f32,
    pub velocity: Vector2,
    pub enabled: bool,
}

/// Externally driven stirrer placement (e.g. pointer input). Takes priority
/// over the orbit for the frame it is supplied in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StirrerOverride {
    pub center: Vector2,
    pub radius: Option<f32>,
}

/// Default motion: horizontal cosine sweep at a fixed height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    pub cols: usize,
    pub height: f32,
    pub period_scale: f32,
}

impl Orbit {
    pub fn position(&self, physics_time: f64) -> Vector2 {
        let half = self.cols as f64 / 2.0;
        let x = half + half * (physics_time / self.period_scale as f64).cos();
        Vector2::new(x as f32, self.height)
    }

    /// Time for the sweep to return to its starting point.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU * self.period_scale as f64
    }
}

impl Stirrer {
    pub fn from_config(config: &StirrerConfig, orbit: &Orbit) -> Self {
        Self {
            center: orbit.position(0.0),
            radius: config.radius,
            velocity: Vector2::new(config.velocity[0], config.velocity[1]),
            enabled: config.enabled,
        }
    }

    pub fn disabled() -> Self {
        Self { center: Vector2::ZERO, radius: 0.0, velocity: Vector2::ZERO, enabled: false }
    }

    /// Strict containment of a point (cell center) in the stirrer disc.
    pub fn covers(&self, point: Vector2) -> bool {
        if !self.enabled {
            return false;
        }
        let d = point - self.center;
        d.x * d.x + d.y * d.y < self.radius * self.radius
    }

    pub fn apply_override(&mut self, input: StirrerOverride) {
        self.center = input.center;
        if let Some(radius) = input.radius {
            self.radius = radius;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit() -> Orbit {
        Orbit { cols: 60, height: 5.0, period_scale: 10.0 }
    }

    #[test]
    fn orbit_starts_at_far_wall() {
        let p = orbit().position(0.0);
        assert_eq!(p, Vector2::new(60.0, 5.0));
    }

    #[test]
    fn orbit_is_periodic() {
        let o = orbit();
        let start = o.position(0.0);
        let again = o.position(o.period());
        assert!((start.x - again.x).abs() < 1e-4);
        // Half way round it sits on the near wall.
        assert!(o.position(o.period() / 2.0).x.abs() < 1e-4);
    }

    #[test]
    fn covers_is_strict_and_respects_enabled() {
        let mut s = Stirrer {
            center: Vector2::new(5.0, 5.0),
            radius: 2.0,
            velocity: Vector2::new(0.0, 5.0),
            enabled: true,
        };
        assert!(s.covers(Vector2::new(5.5, 5.5)));
        assert!(!s.covers(Vector2::new(7.0, 5.0)));
        s.enabled = false;
        assert!(!s.covers(Vector2::new(5.5, 5.5)));
    }

    #[test]
    fn override_moves_center_and_optionally_radius() {
        let mut s = Stirrer::from_config(&StirrerConfig::default(), &orbit());
        s.apply_override(StirrerOverride { center: Vector2::new(1.0, 2.0), radius: None });
        assert_eq!(s.center, Vector2::new(1.0, 2.0));
        assert_eq!(s.radius, 10.0);
        s.apply_override(StirrerOverride { center: Vector2::new(3.0, 3.0), radius: Some(4.0) });
        assert_eq!(s.radius, 4.0);
    }
}
