use crate::advection::advect;
use crate::boundary::apply_boundary;
use crate::conditions::{MAX_FRAME_DT, RESIDUAL_HISTORY_LEN};
use crate::config::{Config, ExecutionMode, ParticleConfig, Scheme};
use crate::divergence::relax;
use crate::error::FluidError;
use crate::executor::Executor;
use crate::grid::{seed_velocity, FieldView, GridDims, Vector2, VelocityField};
use crate::liquid::LiquidField;
use crate::particles::ParticleSet;
use crate::stirrer::{Orbit, Stirrer, StirrerOverride};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// Counters for the host: how much work ran and how well it converged.
#[derive(Clone, Debug, Default)]
pub struct SolverStats {
    pub substeps: u64,
    /// Divergence passes actually run in the most recent sub-step.
    pub last_iterations: usize,
    /// Residual after the most recent sub-step.
    pub last_residual: f32,
    pub residual_history: VecDeque<f32>,
}

/// One simulation session. Owns every buffer; stages only ever borrow.
#[derive(Debug)]
pub struct Session {
    dims: GridDims,
    exec: Executor,
    scheme: Scheme,
    dt: f32,
    relaxation: f32,
    iterations: usize,
    tolerance: Option<f32>,
    velocity: VelocityField,
    divergence: Vec<f32>,
    stirrer: Stirrer,
    orbit: Orbit,
    pending_override: Option<StirrerOverride>,
    particle_config: ParticleConfig,
    particles: ParticleSet,
    liquid: LiquidField,
    rng: StdRng,
    physics_time: f64,
    physics_target: f64,
    last_wall: Option<f64>,
    stats: SolverStats,
}

impl Session {
    pub fn new(config: Config) -> Result<Self, FluidError> {
        config.validate()?;
        let solver = &config.solver;
        let dims = GridDims::new(solver.cols, solver.rows, solver.grid_scale)?;

        let exec = match solver.execution {
            ExecutionMode::Sequential => Executor::Sequential,
            ExecutionMode::Parallel => Executor::parallel(solver.threads)?,
        };

        let orbit = Orbit {
            cols: dims.cols,
            height: config.stirrer.height,
            period_scale: config.stirrer.period_scale,
        };
        let rng = match config.particles.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        log::info!(
            "session {}x{} (scale {}), dt {}, {:?} scheme, {} passes/sub-step, {}",
            dims.cols,
            dims.rows,
            dims.grid_scale,
            solver.physics_dt,
            solver.scheme,
            solver.iterations.resolve(dims.cols),
            if exec.is_parallel() { "parallel" } else { "sequential" },
        );

        Ok(Self {
            dims,
            scheme: solver.scheme,
            dt: solver.physics_dt,
            relaxation: solver.relaxation,
            iterations: solver.iterations.resolve(dims.cols),
            tolerance: solver.convergence_tolerance,
            velocity: VelocityField::new(seed_velocity(dims, solver.initial_velocity)),
            divergence: vec![0.0; dims.len()],
            stirrer: Stirrer::from_config(&config.stirrer, &orbit),
            orbit,
            pending_override: None,
            particles: ParticleSet::new(dims, config.particles.line_height),
            particle_config: config.particles,
            liquid: LiquidField::new(dims),
            rng,
            exec,
            physics_time: 0.0,
            physics_target: 0.0,
            last_wall: None,
            stats: SolverStats::default(),
        })
    }

    /// Like `new`, but retries with sequential execution when the parallel
    /// executor cannot be brought up.
    pub fn new_with_fallback(config: Config) -> Result<Self, FluidError> {
        match Session::new(config.clone()) {
            Err(FluidError::ParallelUnavailable(reason)) => {
                log::warn!("parallel execution unavailable ({reason}), falling back to sequential");
                let mut config = config;
                config.solver.execution = ExecutionMode::Sequential;
                Session::new(config)
            }
            other => other,
        }
    }

    /// Per-frame entry point. The first call only records the clock; later
    /// calls advance physics by the elapsed wall time, clamped to
    /// `MAX_FRAME_DT`. Returns the number of sub-steps run.
    pub fn step(&mut self, wall_clock_seconds: f64) -> usize {
        let Some(last) = self.last_wall.replace(wall_clock_seconds) else {
            return 0;
        };
        let elapsed = wall_clock_seconds - last;
        if !elapsed.is_finite() {
            return 0;
        }
        if elapsed > MAX_FRAME_DT {
            log::warn!("frame took {elapsed:.3}s, simulating only {MAX_FRAME_DT}s");
        }
        let count = self.advance(elapsed.clamp(0.0, MAX_FRAME_DT));
        log::debug!("frame ran {count} sub-steps, residual {:.6}", self.stats.last_residual);
        count
    }

    /// Run sub-steps until physics time catches up with `delta` more
    /// seconds of target time. A pending stirrer override is consumed only
    /// once a sub-step has applied it.
    pub fn advance(&mut self, delta: f64) -> usize {
        self.physics_target += delta;
        let mut count = 0;
        while self.physics_time < self.physics_target {
            self.substep();
            count += 1;
        }
        if count > 0 {
            self.pending_override = None;
        }
        count
    }

    pub fn substep(&mut self) {
        let dims = self.dims;

        self.boundary();
        let (src, dst) = self.velocity.split();
        advect(&self.exec, FieldView::new(src, dims), self.dt, dst);
        self.velocity.swap();

        let mut passes = 0;
        for _ in 0..self.iterations {
            self.boundary();
            relax(&self.exec, dims, self.scheme, &mut self.velocity, &mut self.divergence, self.relaxation);
            passes += 1;
            if let Some(tolerance) = self.tolerance {
                if self.residual() < tolerance {
                    break;
                }
            }
        }

        match self.pending_override {
            Some(input) => self.stirrer.apply_override(input),
            None => self.stirrer.center = self.orbit.position(self.physics_time),
        }

        let velocity = FieldView::new(self.velocity.current(), dims);
        let p = &self.particle_config;
        self.particles.advance(velocity, self.dt, p.settling_bias, p.jitter, &mut self.rng);
        self.liquid.transport();

        self.scheme.estimate_into(&self.exec, velocity, &mut self.divergence);
        let residual = self.residual();
        self.stats.substeps += 1;
        self.stats.last_iterations = passes;
        self.stats.last_residual = residual;
        if self.stats.residual_history.len() == RESIDUAL_HISTORY_LEN {
            self.stats.residual_history.pop_front();
        }
        self.stats.residual_history.push_back(residual);

        self.physics_time += self.dt as f64;

        if !residual.is_finite() {
            log::error!("residual is {residual} after sub-step {}", self.stats.substeps);
        } else {
            log::trace!("sub-step {} residual {residual:.6} after {passes} passes", self.stats.substeps);
        }
    }

    /// Move the stirrer to `center` (and optionally resize it) for the
    /// current frame.
    pub fn override_stirrer(&mut self, center: Vector2, radius: Option<f32>) {
        self.pending_override = Some(StirrerOverride { center, radius });
    }

    /// Divergence residual of the current velocity buffer.
    pub fn residual(&self) -> f32 {
        self.scheme.residual(&self.exec, self.velocity())
    }

    fn boundary(&mut self) {
        let (src, dst) = self.velocity.split();
        apply_boundary(&self.exec, FieldView::new(src, self.dims), &self.stirrer, dst);
        self.velocity.swap();
    }

    pub fn velocity(&self) -> FieldView<'_, Vector2> {
        FieldView::new(self.velocity.current(), self.dims)
    }

    pub fn divergence(&self) -> FieldView<'_, f32> {
        FieldView::new(&self.divergence, self.dims)
    }

    pub fn particles(&self) -> &[Vector2] {
        self.particles.positions()
    }

    pub fn liquid(&self) -> &LiquidField {
        &self.liquid
    }

    pub fn stirrer(&self) -> &Stirrer {
        &self.stirrer
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn physics_time(&self) -> f64 {
        self.physics_time
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn is_parallel(&self) -> bool {
        self.exec.is_parallel()
    }
}
