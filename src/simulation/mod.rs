//! GPU particle simulation.

pub mod solver;

pub use solver::{ParticleSolver, SolverError, POSITION_BUFFER, VELOCITY_BUFFER};
