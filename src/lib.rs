pub mod advection;
pub mod boundary;
pub mod conditions;
pub mod config;
pub mod divergence;
pub mod error;
pub mod executor;
pub mod grid;
pub mod liquid;
pub mod particles;
pub mod plot;
pub mod session;
pub mod stirrer;
pub mod visualization;

pub use config::Config;
pub use error::FluidError;
pub use grid::{GridDims, Vector2};
pub use session::{Session, SolverStats};
