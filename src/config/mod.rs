//! Configuration module for loading run settings.

mod parameters;

pub use parameters::{ExportSettings, SimulationConfig};
