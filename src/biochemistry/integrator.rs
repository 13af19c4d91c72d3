//! Fixed-step ODE integration for the phosphorylation network.
//!
//! Implements the classical 4th-order Runge-Kutta (RK4) method with a constant
//! step size and no error control. Accuracy problems show up as negative
//! concentrations or non-finite values in the output and are handled one level
//! up by the retry controller.
//!
//! The same stepping loop serves autonomous and time-dependent systems: every
//! derivative evaluation receives `t`, and systems that do not depend on time
//! simply ignore it.
//!
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

use crate::error::{Result, SimulationError};
use crate::state::Trajectory;

/// Right-hand side of dy/dt = f(t, y)
pub trait OdeSystem {
    /// Write dy/dt at `(t, y)` into `dydt` (same length as `y`)
    fn derivatives(&self, t: f64, y: &[f64], dydt: &mut [f64]);

    /// Required state length, if the system has a fixed one
    fn state_len(&self) -> Option<usize> {
        None
    }
}

impl<F> OdeSystem for F
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    #[inline]
    fn derivatives(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        self(t, y, dydt)
    }
}

/// Slack absorbing representation error in `t_end / h` (e.g. 3601 / 0.1)
const STEP_COUNT_EPSILON: f64 = 1e-9;

/// Configuration for the ODE integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    /// Integration timestep in seconds
    pub step_size_sec: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self { step_size_sec: 1.0 }
    }
}

impl IntegratorConfig {
    pub fn with_step(step_size_sec: f64) -> Self {
        Self { step_size_sec }
    }
}

/// Number of grid points at step `h`, including the initial state.
///
/// The count depends on `t_end` alone: a run starting at `t0` covers
/// `t0 + i * h` for `i in 0..floor(t_end / h)`.
pub fn grid_points(t_end: f64, h: f64) -> usize {
    (t_end / h + STEP_COUNT_EPSILON).floor().max(1.0) as usize
}

/// 4th-order Runge-Kutta integrator with a fixed step
///
/// Solves dy/dt = f(t, y) and records the state at every grid point.
pub struct Rk4Integrator {
    pub config: IntegratorConfig,
    /// Scratch vectors for intermediate calculations
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    y_temp: Vec<f64>,
}

impl Rk4Integrator {
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            config,
            k1: Vec::new(),
            k2: Vec::new(),
            k3: Vec::new(),
            k4: Vec::new(),
            y_temp: Vec::new(),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.config.step_size_sec
    }

    /// Resize internal buffers if system size changes
    fn resize(&mut self, n_variables: usize) {
        if self.k1.len() != n_variables {
            self.k1.resize(n_variables, 0.0);
            self.k2.resize(n_variables, 0.0);
            self.k3.resize(n_variables, 0.0);
            self.k4.resize(n_variables, 0.0);
            self.y_temp.resize(n_variables, 0.0);
        }
    }

    /// Perform one RK4 step of size `h` from time `t`, updating `y` in place
    ///
    /// # RK4 Algorithm
    /// k1 = f(t, y) h
    /// k2 = f(t, y + k1/2) h
    /// k3 = f(t, y + k2/2) h
    /// k4 = f(t, y + k3) h
    /// y_new = y + (k1 + 2*k2 + 2*k3 + k4) / 6
    ///
    /// All four stages see the time at the start of the step.
    pub fn step<S>(&mut self, system: &S, t: f64, y: &mut [f64])
    where
        S: OdeSystem + ?Sized,
    {
        let h = self.config.step_size_sec;
        let n = y.len();
        self.resize(n);

        system.derivatives(t, y, &mut self.k1);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k1[i];
        }
        system.derivatives(t, &self.y_temp, &mut self.k2);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k2[i];
        }
        system.derivatives(t, &self.y_temp, &mut self.k3);

        for i in 0..n {
            self.y_temp[i] = y[i] + h * self.k3[i];
        }
        system.derivatives(t, &self.y_temp, &mut self.k4);

        let h_6 = h / 6.0;
        for i in 0..n {
            y[i] += h_6 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }

    /// Integrate from `x0` at `t0` and return the state at every grid point.
    ///
    /// The grid has `floor(t_end / h)` points starting at `t0`, with column 0
    /// equal to `x0`, so callers wanting `T` whole seconds past `t0` at `h = 1`
    /// pass `t_end = T + 1`. Fails with `InvalidStateLength` when `x0` does not
    /// fit the system and with `NonFinite` as soon as a step produces NaN or
    /// infinity.
    pub fn integrate<S>(&mut self, system: &S, x0: &[f64], t0: f64, t_end: f64) -> Result<Trajectory>
    where
        S: OdeSystem + ?Sized,
    {
        let h = self.config.step_size_sec;
        if !(h > 0.0) || !h.is_finite() {
            return Err(SimulationError::InvalidStepSize(h));
        }
        if x0.is_empty() {
            return Err(SimulationError::InvalidStateLength { expected: 1, got: 0 });
        }
        if let Some(expected) = system.state_len() {
            if x0.len() != expected {
                return Err(SimulationError::InvalidStateLength {
                    expected,
                    got: x0.len(),
                });
            }
        }

        let n_states = x0.len();
        let n_points = grid_points(t_end, h);
        log::debug!(
            "RK4: {} states, {} points from t = {} s, h = {} s",
            n_states,
            n_points,
            t0,
            h
        );

        // Time-major while stepping, transposed on return
        let mut samples = Vec::with_capacity(n_states * n_points);
        samples.extend_from_slice(x0);
        let mut y = x0.to_vec();

        for i in 1..n_points {
            let t = t0 + (i - 1) as f64 * h;
            self.step(system, t, &mut y);
            if y.iter().any(|x| !x.is_finite()) {
                log::debug!("RK4: non-finite state after step {} (h = {} s)", i, h);
                return Err(SimulationError::NonFinite {
                    time: t + h,
                    step_size: h,
                });
            }
            samples.extend_from_slice(&y);
        }

        Ok(Trajectory::from_time_major(n_states, t0, h, &samples))
    }
}

impl Default for Rk4Integrator {
    fn default() -> Self {
        Self::new(IntegratorConfig::default())
    }
}
