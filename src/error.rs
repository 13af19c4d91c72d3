//! Error types for the simulation engine.
//!
//! Structural problems (wrong vector lengths, a signal handed to a model that
//! cannot use one, malformed retry ladders) are precondition violations and
//! are reported before any integration starts. Numerical trouble is reported
//! by the integrator as `NonFinite` and is normally absorbed by the retry
//! controller.

use thiserror::Error;

/// Errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// State vector length does not match the model's species layout
    #[error("invalid state length: expected {expected}, got {got}")]
    InvalidStateLength { expected: usize, got: usize },

    /// A positional parameter vector has the wrong length
    #[error("invalid {name} length: expected {expected}, got {got}")]
    InvalidParameterLength {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// Enzyme concentration vector has the wrong number of pools
    #[error("invalid enzyme count: expected {expected}, got {got}")]
    InvalidEnzymeCount { expected: usize, got: usize },

    /// Signal supplied to an autonomous model, or missing for a non-autonomous one
    #[error("model {model} {reason}")]
    SignalMismatch { model: &'static str, reason: &'static str },

    /// Malformed signal definition
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// Step size is zero, negative or not finite
    #[error("invalid step size: {0}")]
    InvalidStepSize(f64),

    /// Retry refinements cannot be mapped back onto the nominal grid
    #[error("invalid retry ladder: {0}")]
    InvalidRetryLadder(String),

    /// Integration produced NaN or infinity
    #[error("non-finite state at t = {time} (step size {step_size})")]
    NonFinite { time: f64, step_size: f64 },

    /// Negative concentrations survived the finest retry (strict policy only)
    #[error("{negative_count} negative values remain at step size {step_size}")]
    PersistentNegative { step_size: f64, negative_count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    /// True for the numerical failure the retry ladder is allowed to absorb
    pub fn is_numerical(&self) -> bool {
        matches!(self, SimulationError::NonFinite { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimulationError>;
