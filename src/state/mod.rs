//! Simulation output.
//!
//! Holds the dense trajectories produced by the integrator and the derived
//! phosphorylation-level views computed from them.

mod trajectory;

pub use trajectory::Trajectory;
