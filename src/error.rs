use std::fmt;

/// Errors surfaced by session creation and by the host around it.
///
/// Per-frame solver work never fails; everything that could make it produce
/// NaN/Inf is rejected here, before the first sub-step.
#[derive(Debug)]
pub enum FluidError {
    InvalidGridScale(f32),
    InvalidTimestep(f32),
    GridTooSmall { cols: usize, rows: usize },
    InvalidRelaxation(f32),
    ZeroIterations,
    /// The parallel execution strategy could not be brought up.
    /// Recoverable: the host may retry with sequential execution.
    ParallelUnavailable(String),
    Config(String),
    Io(std::io::Error),
    Plot(String),
    Window(String),
}

impl FluidError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FluidError::InvalidGridScale(_)
                | FluidError::InvalidTimestep(_)
                | FluidError::GridTooSmall { .. }
                | FluidError::InvalidRelaxation(_)
                | FluidError::ZeroIterations
        )
    }
}

impl fmt::Display for FluidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluidError::InvalidGridScale(s) => write!(f, "grid scale must be positive and finite, got {s}"),
            FluidError::InvalidTimestep(dt) => write!(f, "physics timestep must be positive and finite, got {dt}"),
            FluidError::GridTooSmall { cols, rows } => {
                write!(f, "grid must be at least 3x3, got {cols}x{rows}")
            }
            FluidError::InvalidRelaxation(r) => write!(f, "relaxation factor must be positive and finite, got {r}"),
            FluidError::ZeroIterations => write!(f, "divergence removal needs at least one iteration"),
            FluidError::ParallelUnavailable(e) => write!(f, "parallel execution unavailable: {e}"),
            FluidError::Config(e) => write!(f, "invalid configuration: {e}"),
            FluidError::Io(e) => write!(f, "I/O error: {e}"),
            FluidError::Plot(e) => write!(f, "failed to draw chart: {e}"),
            FluidError::Window(e) => write!(f, "window error: {e}"),
        }
    }
}

impl std::error::Error for FluidError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FluidError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FluidError {
    fn from(e: std::io::Error) -> Self {
        FluidError::Io(e)
    }
}

impl From<serde_yaml::Error> for FluidError {
    fn from(e: serde_yaml::Error) -> Self {
        FluidError::Config(e.to_string())
    }
}
