//! cMyBP-C phosphorylation simulator
//!
//! Integrates the multi-site phosphorylation network of cardiac myosin
//! binding protein C under kinase and phosphatase activity, with adaptive
//! step refinement and phosphorylation-level readouts.

// Allow non-snake-case for unit suffixes in field names (pka_M, km_M, etc.)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod biochemistry;
pub mod config;
pub mod error;
pub mod export;
pub mod state;

pub use biochemistry::{
    simulate, DoseAxis, DoseResponseSweep, EnzymeLevels, EnzymePool, FailurePolicy, ModelVariant,
    OdeSystem, ParameterSet, PhosphoLevel, PhosphoNetwork, RetryController, RetryPolicy, RunStatus,
    Signal, SimulationRun, StateLayout, TimeWindow,
};
pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use state::Trajectory;
