//! Steady-state dose-response sweeps.
//!
//! A sweep integrates the network for every combination of parameter set,
//! phosphatase level and kinase level, and reads the phosphorylation-level
//! fractions at `t_end`. Grid points are independent, so they run in parallel
//! on the rayon pool; results come back in grid order regardless of
//! scheduling.

use rayon::prelude::*;

use super::enzyme::{EnzymeLevels, EnzymePool};
use super::network::{ModelVariant, ParameterSet, PhosphoNetwork};
use super::retry::{simulate, RetryPolicy, RunStatus, TimeWindow};
use super::signal::Signal;
use crate::error::Result;

/// `10^x` for `n` evenly spaced exponents `x` in `[lo_exp, hi_exp]`
pub fn log_spaced(lo_exp: f64, hi_exp: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(lo_exp)],
        _ => {
            let step = (hi_exp - lo_exp) / (n - 1) as f64;
            (0..n)
                .map(|i| 10f64.powf(lo_exp + i as f64 * step))
                .collect()
        }
    }
}

/// One swept enzyme and its concentrations (M)
#[derive(Debug, Clone, PartialEq)]
pub struct DoseAxis {
    pub pool: EnzymePool,
    pub levels_M: Vec<f64>,
}

impl DoseAxis {
    pub fn new(pool: EnzymePool, levels_M: Vec<f64>) -> Self {
        Self { pool, levels_M }
    }
}

/// Readout of one converged grid point
#[derive(Debug, Clone, PartialEq)]
pub struct SteadyState {
    /// State vector at `t_end`
    pub state: Vec<f64>,
    /// 0P ... 4P fractions at `t_end`
    pub fractions: [f64; 5],
    pub status: RunStatus,
}

#[derive(Debug)]
pub struct SweepPoint {
    pub parameter_index: usize,
    pub phosphatase_M: f64,
    pub kinase_M: f64,
    /// Failing points keep their error; the rest of the sweep is unaffected
    pub outcome: Result<SteadyState>,
}

/// Kinase x phosphatase grid over a list of parameter sets
#[derive(Debug, Clone)]
pub struct DoseResponseSweep {
    pub variant: ModelVariant,
    pub parameter_sets: Vec<ParameterSet>,
    /// Levels of the enzymes that are not swept
    pub base_enzymes: EnzymeLevels,
    pub kinase: DoseAxis,
    pub phosphatase: DoseAxis,
    pub signal: Option<Signal>,
    pub initial_state: Vec<f64>,
    pub window: TimeWindow,
    pub retry: RetryPolicy,
}

impl DoseResponseSweep {
    /// Number of grid points
    pub fn len(&self) -> usize {
        self.parameter_sets.len() * self.phosphatase.levels_M.len() * self.kinase.levels_M.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate every grid point, ordered by parameter set, then phosphatase, then kinase
    pub fn run(&self) -> Vec<SweepPoint> {
        let n_kinase = self.kinase.levels_M.len();
        let n_phosphatase = self.phosphatase.levels_M.len();
        log::info!(
            "Dose-response sweep: {} parameter sets x {} {} x {} {} levels",
            self.parameter_sets.len(),
            n_phosphatase,
            self.phosphatase.pool.name(),
            n_kinase,
            self.kinase.pool.name()
        );

        (0..self.len())
            .into_par_iter()
            .map(|idx| {
                let parameter_index = idx / (n_phosphatase * n_kinase);
                let phosphatase_M = self.phosphatase.levels_M[(idx / n_kinase) % n_phosphatase];
                let kinase_M = self.kinase.levels_M[idx % n_kinase];
                SweepPoint {
                    parameter_index,
                    phosphatase_M,
                    kinase_M,
                    outcome: self.evaluate(parameter_index, phosphatase_M, kinase_M),
                }
            })
            .collect()
    }

    fn evaluate(&self, parameter_index: usize, phosphatase_M: f64, kinase_M: f64) -> Result<SteadyState> {
        let enzymes = self
            .base_enzymes
            .with(self.phosphatase.pool, phosphatase_M)
            .with(self.kinase.pool, kinase_M);
        let network = PhosphoNetwork::new(
            self.variant,
            &self.parameter_sets[parameter_index],
            enzymes,
            self.signal.clone(),
        )?;
        let run = simulate(&network, &self.initial_state, &self.window, &self.retry)?;
        let last = run.trajectory.n_points().saturating_sub(1);
        Ok(SteadyState {
            state: run.trajectory.column(last),
            fractions: run.trajectory.fractions_at(last)?,
            status: run.status,
        })
    }
}
