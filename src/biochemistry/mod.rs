//! Biochemistry module for cMyBP-C phosphorylation dynamics.
//!
//! Cardiac myosin binding protein C (cMyBP-C) carries four phospho-sites in
//! its M-domain. PKA phosphorylates alpha, beta and gamma in sequence, PKC
//! phosphorylates delta, and PP1/PP2A remove the modifications. Since every
//! species is a substrate for the same few enzymes, the rate laws are
//! competitive Michaelis-Menten kinetics with a shared competition term per
//! enzyme.
//!
//! Components:
//! - `species`: state-vector layouts and phosphorylation levels
//! - `enzyme`: enzyme pools and rate laws
//! - `network`: the reaction network and its model variants
//! - `signal`: time-varying PKA gating
//! - `integrator`: fixed-step RK4
//! - `retry`: step refinement on negative or non-finite results
//! - `sweep`: parallel steady-state dose responses
//!
//! References:
//! - Kampourakis T, Ponnam S, Koch D. bioRxiv 2023.02.24.529959
//! - Segel IH. Enzyme Kinetics. Wiley-Interscience, 1993

pub mod enzyme;
pub mod integrator;
pub mod network;
pub mod retry;
pub mod signal;
pub mod species;
pub mod sweep;

pub use enzyme::{EnzymeLevels, EnzymePool};
pub use integrator::{IntegratorConfig, OdeSystem, Rk4Integrator};
pub use network::{
    ModelVariant, ParameterSet, PhosphoNetwork, Rsk2Constants, REACTION_COUNT, RSK2_MEASURED,
};
pub use retry::{
    simulate, Attempt, AttemptOutcome, FailurePolicy, RetryCause, RetryController, RetryPolicy,
    RunStatus, SimulationRun, TimeWindow,
};
pub use signal::{noisy_levels, Interval, PulseTrain, Signal};
pub use species::{PhosphoLevel, Species, StateLayout};
pub use sweep::{log_spaced, DoseAxis, DoseResponseSweep, SteadyState, SweepPoint};
