use crate::conditions::*;
use crate::error::FluidError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "stirbox.yaml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
    pub stirrer: StirrerConfig,
    pub particles: ParticleConfig,
    pub display: DisplayConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub grid_scale: f32,
    pub cols: usize,
    pub rows: usize,
    pub physics_dt: f32,
    pub relaxation: f32,
    pub iterations: IterationCount,
    pub scheme: Scheme,
    /// Stop the divergence passes of a sub-step early once the residual is
    /// below this value. `None` keeps the fixed iteration budget.
    pub convergence_tolerance: Option<f32>,
    pub initial_velocity: InitialVelocity,
    pub execution: ExecutionMode,
    /// Worker count for parallel execution; 0 lets rayon decide.
    pub threads: usize,
}

/// Which divergence-removal kernel runs each iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Explicit divergence buffer, then a gradient pass.
    Central,
    /// Single fused pass over corner divergences.
    Corner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationCount {
    Fixed(usize),
    /// One pass per grid column.
    PerColumn,
}

impl IterationCount {
    pub fn resolve(self, cols: usize) -> usize {
        match self {
            IterationCount::Fixed(n) => n,
            IterationCount::PerColumn => cols,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialVelocity {
    Zero,
    /// `(col / cols, row / rows) * gain`
    Ramp { gain: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StirrerConfig {
    pub enabled: bool,
    pub radius: f32,
    pub velocity: [f32; 2],
    pub height: f32,
    pub period_scale: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub settling_bias: f32,
    pub jitter: f32,
    /// Height of the initial particle line; defaults to 5/6 of the rows.
    pub line_height: Option<f32>,
    /// Seed for the jitter RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub needle_spacing: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            grid_scale: GRID_SCALE,
            cols: GRID_COLS,
            rows: GRID_ROWS,
            physics_dt: PHYSICS_DT,
            relaxation: RELAXATION,
            iterations: IterationCount::Fixed(DIVERGENCE_ITERATIONS),
            scheme: Scheme::Central,
            convergence_tolerance: None,
            initial_velocity: InitialVelocity::Zero,
            execution: ExecutionMode::Sequential,
            threads: 0,
        }
    }
}

impl Default for StirrerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: STIRRER_RADIUS,
            velocity: [STIRRER_VELOCITY_X, STIRRER_VELOCITY_Y],
            height: STIRRER_HEIGHT,
            period_scale: STIRRER_PERIOD_SCALE,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            settling_bias: SETTLING_BIAS,
            jitter: PARTICLE_JITTER,
            line_height: None,
            seed: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            needle_spacing: NEEDLE_SPACING,
        }
    }
}

impl Config {
    /// Small headless configuration: no stirrer, sequential, fixed seed.
    pub fn headless(cols: usize, rows: usize, grid_scale: f32) -> Self {
        let mut config = Config::default();
        config.solver.cols = cols;
        config.solver.rows = rows;
        config.solver.grid_scale = grid_scale;
        config.stirrer.enabled = false;
        config.particles.seed = Some(0);
        config
    }

    /// Rejects everything that would make the solver divide by zero or
    /// index outside the grid.
    pub fn validate(&self) -> Result<(), FluidError> {
        let s = &self.solver;
        if !(s.grid_scale.is_finite() && s.grid_scale > 0.0) {
            return Err(FluidError::InvalidGridScale(s.grid_scale));
        }
        if !(s.physics_dt.is_finite() && s.physics_dt > 0.0) {
            return Err(FluidError::InvalidTimestep(s.physics_dt));
        }
        if s.cols < MIN_EXTENT || s.rows < MIN_EXTENT {
            return Err(FluidError::GridTooSmall { cols: s.cols, rows: s.rows });
        }
        if !(s.relaxation.is_finite() && s.relaxation > 0.0) {
            return Err(FluidError::InvalidRelaxation(s.relaxation));
        }
        if s.iterations.resolve(s.cols) == 0 {
            return Err(FluidError::ZeroIterations);
        }
        if !self.stirrer.radius.is_finite() || self.stirrer.radius < 0.0 {
            return Err(FluidError::Config(format!(
                "stirrer radius must be non-negative, got {}",
                self.stirrer.radius
            )));
        }
        if self.stirrer.period_scale == 0.0 || !self.stirrer.period_scale.is_finite() {
            return Err(FluidError::Config("stirrer period scale must be non-zero".into()));
        }
        Ok(())
    }
}

pub fn from_yaml(contents: &str) -> Result<Config, FluidError> {
    Ok(serde_yaml::from_str(contents)?)
}

/// Reads a configuration file. A missing file yields the defaults; a file
/// that exists but cannot be parsed is an error.
pub fn load(path: &Path) -> Result<Config, FluidError> {
    if !path.exists() {
        log::info!("{} not found, using default configuration", path.display());
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let config = from_yaml(&contents)?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.solver.cols, 60);
        assert_eq!(cfg.solver.rows, 60);
        assert_eq!(cfg.solver.grid_scale, 0.1);
        assert_eq!(cfg.solver.physics_dt, 0.05);
        assert_eq!(cfg.solver.relaxation, 0.9);
        assert_eq!(cfg.solver.iterations, IterationCount::Fixed(60));
        assert_eq!(cfg.solver.scheme, Scheme::Central);
        assert!(cfg.stirrer.enabled);
        assert_eq!(cfg.stirrer.radius, 10.0);
        assert_eq!(cfg.stirrer.velocity, [0.0, 5.0]);
        assert_eq!(cfg.particles.jitter, 0.025);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "solver:\n  cols: 100\n  scheme: corner\n  iterations: per_column\nstirrer:\n  radius: 4.0\n";
        let cfg = from_yaml(yaml).unwrap();
        assert_eq!(cfg.solver.cols, 100);
        assert_eq!(cfg.solver.rows, 60); // default
        assert_eq!(cfg.solver.scheme, Scheme::Corner);
        assert_eq!(cfg.solver.iterations.resolve(cfg.solver.cols), 100);
        assert_eq!(cfg.stirrer.radius, 4.0);
        assert_eq!(cfg.stirrer.height, 5.0); // default
    }

    #[test]
    fn test_tagged_variants_yaml() {
        let yaml = r#"
solver:
  iterations: !fixed 12
  initial_velocity: !ramp
    gain: 2.5
  execution: parallel
  convergence_tolerance: 0.001
particles:
  seed: 42
"#;
        let cfg = from_yaml(yaml).unwrap();
        assert_eq!(cfg.solver.iterations, IterationCount::Fixed(12));
        assert_eq!(cfg.solver.initial_velocity, InitialVelocity::Ramp { gain: 2.5 });
        assert_eq!(cfg.solver.execution, ExecutionMode::Parallel);
        assert_eq!(cfg.solver.convergence_tolerance, Some(0.001));
        assert_eq!(cfg.particles.seed, Some(42));
    }

    #[test]
    fn test_validation_rejects_degenerate_values() {
        let mut cfg = Config::default();
        cfg.solver.grid_scale = 0.0;
        assert!(matches!(cfg.validate(), Err(FluidError::InvalidGridScale(_))));

        let mut cfg = Config::default();
        cfg.solver.physics_dt = -0.05;
        assert!(matches!(cfg.validate(), Err(FluidError::InvalidTimestep(_))));

        let mut cfg = Config::default();
        cfg.solver.rows = 2;
        assert!(matches!(cfg.validate(), Err(FluidError::GridTooSmall { cols: 60, rows: 2 })));

        let mut cfg = Config::default();
        cfg.solver.iterations = IterationCount::Fixed(0);
        assert!(matches!(cfg.validate(), Err(FluidError::ZeroIterations)));

        let mut cfg = Config::default();
        cfg.solver.physics_dt = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let cfg = load(Path::new("definitely-not-here/stirbox.yaml")).unwrap();
        assert_eq!(cfg.solver.cols, 60);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(matches!(from_yaml("solver: [1, 2"), Err(FluidError::Config(_))));
    }
}
