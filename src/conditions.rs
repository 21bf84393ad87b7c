// Default parameters of a simulation session.
// Everything here can be overridden through `stirbox.yaml` (see config.rs).


// Window parameters
pub const WINDOW_WIDTH: usize = 720;
pub const WINDOW_HEIGHT: usize = 720;
pub const NEEDLE_SPACING: usize = 3; // Draw one velocity needle every N cells



// Grid parameters
pub const GRID_COLS: usize = 60;
pub const GRID_ROWS: usize = 60;
pub const GRID_SCALE: f32 = 0.1; // World length of one cell
pub const MIN_EXTENT: usize = 3; // Border ring + at least one interior cell
pub const EDGE_EPSILON: f32 = 1.0e-4; // Clamp margin below `extent - 1`, at least one ulp on wide grids



// Physical parameters
pub const PHYSICS_DT: f32 = 0.05;
pub const MAX_FRAME_DT: f64 = 0.1; // Wall-clock delta clamp, bounds the sub-step count of one frame
pub const RESIDUAL_HISTORY_LEN: usize = 4096; // Sub-steps of residual kept for the chart



// Divergence removal
pub const RELAXATION: f32 = 0.9;
pub const DIVERGENCE_ITERATIONS: usize = 60;



// Stirrer parameters
pub const STIRRER_RADIUS: f32 = 10.0;
pub const STIRRER_VELOCITY_X: f32 = 0.0;
pub const STIRRER_VELOCITY_Y: f32 = 5.0;
pub const STIRRER_HEIGHT: f32 = 5.0;
pub const STIRRER_PERIOD_SCALE: f32 = 10.0; // x = cols/2 + cols/2 * cos(t / scale)



// Particle parameters
pub const SETTLING_BIAS: f32 = 1.0; // Subtracted from the sampled y velocity
pub const PARTICLE_JITTER: f32 = 0.025;
pub const PARTICLE_LINE_FRACTION: f32 = 5.0 / 6.0; // Initial line height, as a fraction of rows



// Liquid parameters
pub const LIQUID_TOP_FRACTION: f32 = 5.0 / 6.0; // Blob spans rows [rows/2, rows * fraction)
