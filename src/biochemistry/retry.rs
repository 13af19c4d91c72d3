//! Adaptive step-size retry around the fixed-step integrator.
//!
//! Stiff parameter sets make the nominal 1 s RK4 step overshoot: species go
//! negative or the state overflows. The controller then repeats the whole
//! integration on a finer step (0.1 s, then 0.01 s by default) and keeps every
//! `h / h_fine`-th column, so the caller always receives the nominal time grid.
//!
//! Ladder:
//! 1. Integrate at the nominal step.
//! 2. Negative values: try each refinement until the down-sampled result is
//!    non-negative. Overflow inside this ladder moves on to the next tier.
//! 3. Overflow at the nominal step: try each refinement until one stays
//!    finite. Overflow at the last tier is an error.
//! 4. Negatives that survive every tier are handled by the `FailurePolicy`.

use serde::{Deserialize, Serialize};

use super::integrator::{grid_points, IntegratorConfig, OdeSystem, Rk4Integrator};
use super::network::PhosphoNetwork;
use crate::error::{Result, SimulationError};
use crate::state::Trajectory;

/// Relative tolerance when checking that a refinement divides the nominal step
const STRIDE_TOLERANCE: f64 = 1e-9;

/// Integration time window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindow {
    pub t0_sec: f64,
    /// Run length in seconds; the integration runs to `t_end_sec + 1`, so the
    /// grid covers `t0_sec ..= t0_sec + t_end_sec` at 1 s
    pub t_end_sec: f64,
    /// Nominal step (s)
    pub step_size_sec: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            t0_sec: 0.0,
            t_end_sec: 3600.0,
            step_size_sec: 1.0,
        }
    }
}

impl TimeWindow {
    pub fn new(t0_sec: f64, t_end_sec: f64, step_size_sec: f64) -> Self {
        Self {
            t0_sec,
            t_end_sec,
            step_size_sec,
        }
    }

    /// Window from 0 to `t_end_sec` at 1 s
    pub fn seconds(t_end_sec: f64) -> Self {
        Self::new(0.0, t_end_sec, 1.0)
    }

    /// End time handed to the integrator
    pub fn integration_end(&self) -> f64 {
        self.t_end_sec + 1.0
    }

    /// Columns of the nominal grid
    pub fn nominal_points(&self) -> usize {
        grid_points(self.integration_end(), self.step_size_sec)
    }
}

/// What to do when negatives survive the finest step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Return the last trajectory with a `BestEffort` status
    #[default]
    SoftFail,
    /// Fail with `PersistentNegative`
    Strict,
}

/// Retry ladder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Finer step sizes tried in order (s)
    pub refinements: Vec<f64>,
    pub failure_policy: FailurePolicy,
    /// Accept negatives from the nominal step without retrying.
    /// Used with noisy signals, where small excursions below zero are expected.
    pub skip_negative_retry: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            refinements: vec![0.1, 0.01],
            failure_policy: FailurePolicy::SoftFail,
            skip_negative_retry: false,
        }
    }
}

impl RetryPolicy {
    pub fn strict() -> Self {
        Self {
            failure_policy: FailurePolicy::Strict,
            ..Self::default()
        }
    }

    /// Nominal step only
    pub fn no_retry() -> Self {
        Self {
            refinements: Vec::new(),
            ..Self::default()
        }
    }

    /// `(step, stride)` for each refinement of the nominal step `h`
    pub fn ladder(&self, h: f64) -> Result<Vec<(f64, usize)>> {
        if !(h > 0.0) || !h.is_finite() {
            return Err(SimulationError::InvalidStepSize(h));
        }
        let mut previous = h;
        let mut ladder = Vec::with_capacity(self.refinements.len());
        for &fine in &self.refinements {
            if !(fine > 0.0) || !fine.is_finite() {
                return Err(SimulationError::InvalidRetryLadder(format!(
                    "refinement {} is not a positive step",
                    fine
                )));
            }
            if fine >= previous {
                return Err(SimulationError::InvalidRetryLadder(format!(
                    "refinement {} is not smaller than {}",
                    fine, previous
                )));
            }
            let stride = (h / fine).round();
            if (stride * fine - h).abs() > STRIDE_TOLERANCE * h {
                return Err(SimulationError::InvalidRetryLadder(format!(
                    "refinement {} does not divide the nominal step {}",
                    fine, h
                )));
            }
            ladder.push((fine, stride as usize));
            previous = fine;
        }
        Ok(ladder)
    }
}

/// Failure that triggered a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryCause {
    NegativeValues,
    NonFinite,
}

/// Result of one integration attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Accepted,
    Negative { count: usize },
    NonFinite { time: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub step_size: f64,
    pub outcome: AttemptOutcome,
}

/// How the returned trajectory was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Nominal step succeeded
    Nominal,
    /// A finer step succeeded
    Recovered { step_size: f64, cause: RetryCause },
    /// Negatives remain; trajectory returned under the soft-fail policy
    BestEffort { step_size: f64, negative_count: usize },
}

/// Trajectory on the nominal grid plus its provenance
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub trajectory: Trajectory,
    pub status: RunStatus,
    /// Every attempt in order, nominal first
    pub attempts: Vec<Attempt>,
}

impl SimulationRun {
    pub fn is_nominal(&self) -> bool {
        self.status == RunStatus::Nominal
    }

    /// Step size that produced the returned trajectory
    pub fn step_size(&self) -> Option<f64> {
        match self.status {
            RunStatus::Nominal => self.attempts.first().map(|a| a.step_size),
            RunStatus::Recovered { step_size, .. } | RunStatus::BestEffort { step_size, .. } => {
                Some(step_size)
            }
        }
    }
}

/// Runs the retry ladder around an `Rk4Integrator`
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    pub policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn run<S>(&self, system: &S, x0: &[f64], window: &TimeWindow) -> Result<SimulationRun>
    where
        S: OdeSystem + ?Sized,
    {
        let h = window.step_size_sec;
        let ladder = self.policy.ladder(h)?;
        let mut attempts = Vec::with_capacity(ladder.len() + 1);

        match integrate(system, x0, window, h) {
            Ok(trajectory) => {
                let negatives = trajectory.negative_count();
                if negatives == 0 {
                    attempts.push(Attempt {
                        step_size: h,
                        outcome: AttemptOutcome::Accepted,
                    });
                    return Ok(SimulationRun {
                        trajectory,
                        status: RunStatus::Nominal,
                        attempts,
                    });
                }
                attempts.push(Attempt {
                    step_size: h,
                    outcome: AttemptOutcome::Negative { count: negatives },
                });
                if self.policy.skip_negative_retry {
                    log::debug!("{} negative values at h = {} s, retry disabled", negatives, h);
                    return self.give_up(trajectory, h, attempts);
                }
                self.retry_negative(system, x0, window, &ladder, trajectory, attempts)
            }
            Err(SimulationError::NonFinite { time, .. }) => {
                attempts.push(Attempt {
                    step_size: h,
                    outcome: AttemptOutcome::NonFinite { time },
                });
                self.retry_non_finite(system, x0, window, &ladder, time, attempts)
            }
            Err(e) => Err(e),
        }
    }

    fn retry_negative<S>(
        &self,
        system: &S,
        x0: &[f64],
        window: &TimeWindow,
        ladder: &[(f64, usize)],
        nominal: Trajectory,
        mut attempts: Vec<Attempt>,
    ) -> Result<SimulationRun>
    where
        S: OdeSystem + ?Sized,
    {
        let n_points = window.nominal_points();
        let mut best = (nominal, window.step_size_sec);

        for (tier, &(fine, stride)) in ladder.iter().enumerate() {
            log::warn!(
                "Negative concentrations at h = {} s, retrying at h = {} s",
                best.1,
                fine
            );
            match integrate(system, x0, window, fine) {
                Ok(trajectory) => {
                    let coarse = trajectory.downsample(stride, n_points);
                    let negatives = coarse.negative_count();
                    if negatives == 0 {
                        log::info!("Recovered non-negative trajectory at h = {} s", fine);
                        attempts.push(Attempt {
                            step_size: fine,
                            outcome: AttemptOutcome::Accepted,
                        });
                        return Ok(SimulationRun {
                            trajectory: coarse,
                            status: RunStatus::Recovered {
                                step_size: fine,
                                cause: RetryCause::NegativeValues,
                            },
                            attempts,
                        });
                    }
                    attempts.push(Attempt {
                        step_size: fine,
                        outcome: AttemptOutcome::Negative { count: negatives },
                    });
                    best = (coarse, fine);
                }
                Err(SimulationError::NonFinite { time, step_size }) => {
                    attempts.push(Attempt {
                        step_size: fine,
                        outcome: AttemptOutcome::NonFinite { time },
                    });
                    if tier + 1 == ladder.len() {
                        return Err(SimulationError::NonFinite { time, step_size });
                    }
                    log::warn!("Non-finite state at h = {} s, moving to next step size", fine);
                }
                Err(e) => return Err(e),
            }
        }

        let (trajectory, step_size) = best;
        self.give_up(trajectory, step_size, attempts)
    }

    fn retry_non_finite<S>(
        &self,
        system: &S,
        x0: &[f64],
        window: &TimeWindow,
        ladder: &[(f64, usize)],
        nominal_failure_time: f64,
        mut attempts: Vec<Attempt>,
    ) -> Result<SimulationRun>
    where
        S: OdeSystem + ?Sized,
    {
        let n_points = window.nominal_points();
        let mut failure = SimulationError::NonFinite {
            time: nominal_failure_time,
            step_size: window.step_size_sec,
        };

        for &(fine, stride) in ladder {
            log::warn!("{}, retrying at h = {} s", failure, fine);
            match integrate(system, x0, window, fine) {
                Ok(trajectory) => {
                    let coarse = trajectory.downsample(stride, n_points);
                    let negatives = coarse.negative_count();
                    if negatives > 0 {
                        attempts.push(Attempt {
                            step_size: fine,
                            outcome: AttemptOutcome::Negative { count: negatives },
                        });
                        return self.give_up(coarse, fine, attempts);
                    }
                    log::info!("Recovered finite trajectory at h = {} s", fine);
                    attempts.push(Attempt {
                        step_size: fine,
                        outcome: AttemptOutcome::Accepted,
                    });
                    return Ok(SimulationRun {
                        trajectory: coarse,
                        status: RunStatus::Recovered {
                            step_size: fine,
                            cause: RetryCause::NonFinite,
                        },
                        attempts,
                    });
                }
                Err(SimulationError::NonFinite { time, step_size }) => {
                    attempts.push(Attempt {
                        step_size: fine,
                        outcome: AttemptOutcome::NonFinite { time },
                    });
                    failure = SimulationError::NonFinite { time, step_size };
                }
                Err(e) => return Err(e),
            }
        }

        Err(failure)
    }

    /// Apply the failure policy to a trajectory that still has negatives
    fn give_up(
        &self,
        trajectory: Trajectory,
        step_size: f64,
        attempts: Vec<Attempt>,
    ) -> Result<SimulationRun> {
        let negative_count = trajectory.negative_count();
        match self.policy.failure_policy {
            FailurePolicy::SoftFail => {
                log::warn!(
                    "{} negative values remain at h = {} s, returning best effort",
                    negative_count,
                    step_size
                );
                Ok(SimulationRun {
                    trajectory,
                    status: RunStatus::BestEffort {
                        step_size,
                        negative_count,
                    },
                    attempts,
                })
            }
            FailurePolicy::Strict => Err(SimulationError::PersistentNegative {
                step_size,
                negative_count,
            }),
        }
    }
}

fn integrate<S>(system: &S, x0: &[f64], window: &TimeWindow, h: f64) -> Result<Trajectory>
where
    S: OdeSystem + ?Sized,
{
    Rk4Integrator::new(IntegratorConfig::with_step(h)).integrate(
        system,
        x0,
        window.t0_sec,
        window.integration_end(),
    )
}

/// Validate the network against `x0` and run it through the retry ladder
pub fn simulate(
    network: &PhosphoNetwork,
    x0: &[f64],
    window: &TimeWindow,
    policy: &RetryPolicy,
) -> Result<SimulationRun> {
    network.check_state(x0)?;
    RetryController::new(policy.clone()).run(network, x0, window)
}
