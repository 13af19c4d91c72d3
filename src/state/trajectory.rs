//! Dense state x time trajectory.
//!
//! Rows are species in state-vector order, columns are time points on a
//! regular grid `t0 + j * step_size`. Storage is row-major, so a species'
//! time course is one contiguous slice.

use serde::{Deserialize, Serialize};

use crate::biochemistry::species::{PhosphoLevel, StateLayout};
use crate::error::{Result, SimulationError};

/// Integration result, immutable once returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    n_states: usize,
    n_points: usize,
    t0: f64,
    step_size: f64,
    /// Row-major `n_states x n_points`
    data: Vec<f64>,
}

impl Trajectory {
    /// Build from time-major samples (one state vector after another)
    pub fn from_time_major(n_states: usize, t0: f64, step_size: f64, samples: &[f64]) -> Self {
        let n_points = if n_states == 0 {
            0
        } else {
            samples.len() / n_states
        };
        let mut data = vec![0.0; n_states * n_points];
        for (j, state) in samples.chunks_exact(n_states.max(1)).enumerate().take(n_points) {
            for (i, &x) in state.iter().enumerate() {
                data[i * n_points + j] = x;
            }
        }
        Self {
            n_states,
            n_points,
            t0,
            step_size,
            data,
        }
    }

    /// Build from state-major rows of equal length
    pub fn from_rows(rows: &[Vec<f64>], t0: f64, step_size: f64) -> Result<Self> {
        let n_points = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_points) {
            return Err(SimulationError::InvalidStateLength {
                expected: n_points,
                got: bad.len(),
            });
        }
        Ok(Self {
            n_states: rows.len(),
            n_points,
            t0,
            step_size,
            data: rows.concat(),
        })
    }

    /// `(n_states, n_points)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_states, self.n_points)
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Spacing of the returned columns (s)
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Time course of one species
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_points..(i + 1) * self.n_points]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_points.max(1)).take(self.n_states)
    }

    /// State vector at column `j`
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n_states).map(|i| self.value(i, j)).collect()
    }

    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n_points + j]
    }

    pub fn time(&self, j: usize) -> f64 {
        self.t0 + j as f64 * self.step_size
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_points).map(move |j| self.time(j))
    }

    pub fn last_column(&self) -> Option<Vec<f64>> {
        self.n_points.checked_sub(1).map(|j| self.column(j))
    }

    /// Total mass per column
    pub fn column_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_points];
        for row in self.rows() {
            for (total, &x) in totals.iter_mut().zip(row) {
                *total += x;
            }
        }
        totals
    }

    pub fn negative_count(&self) -> usize {
        self.data.iter().filter(|&&x| x < 0.0).count()
    }

    pub fn has_negative(&self) -> bool {
        self.data.iter().any(|&x| x < 0.0)
    }

    pub fn min_value(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Every `stride`-th column starting at column 0, at most `max_columns` of them
    pub fn downsample(&self, stride: usize, max_columns: usize) -> Self {
        let stride = stride.max(1);
        let columns: Vec<usize> = (0..self.n_points).step_by(stride).take(max_columns).collect();
        let n_points = columns.len();
        let mut data = Vec::with_capacity(self.n_states * n_points);
        for row in self.rows() {
            data.extend(columns.iter().map(|&j| row[j]));
        }
        Self {
            n_states: self.n_states,
            n_points,
            t0: self.t0,
            step_size: self.step_size * stride as f64,
            data,
        }
    }

    /// Species layout, for trajectories of the phosphorylation network
    pub fn layout(&self) -> Option<StateLayout> {
        StateLayout::from_len(self.n_states)
    }

    fn require_layout(&self) -> Result<StateLayout> {
        self.layout().ok_or(SimulationError::InvalidStateLength {
            expected: StateLayout::Eight.len(),
            got: self.n_states,
        })
    }

    /// Fraction of total mass at one phosphorylation level, per column.
    ///
    /// Values are computed lazily. A column whose total is zero yields 0.
    pub fn fraction(&self, level: PhosphoLevel) -> Result<impl Iterator<Item = f64> + '_> {
        let rows = self.require_layout()?.level_rows(level);
        Ok((0..self.n_points).map(move |j| {
            let total: f64 = (0..self.n_states).map(|i| self.value(i, j)).sum();
            let part: f64 = rows.iter().map(|&i| self.value(i, j)).sum();
            if total == 0.0 {
                0.0
            } else {
                part / total
            }
        }))
    }

    /// Fractions of all five levels at one column (0P first).
    ///
    /// # Panics
    /// Panics if `column` is out of range.
    pub fn fractions_at(&self, column: usize) -> Result<[f64; 5]> {
        let layout = self.require_layout()?;
        let state = self.column(column);
        let total: f64 = state.iter().sum();
        let mut out = [0.0; 5];
        for (slot, level) in out.iter_mut().zip(PhosphoLevel::ALL) {
            let part: f64 = layout.level_rows(level).iter().map(|&i| state[i]).sum();
            *slot = if total == 0.0 { 0.0 } else { part / total };
        }
        Ok(out)
    }

    /// Largest relative deviation of a column total from the initial total
    pub fn mass_drift(&self) -> f64 {
        let totals = self.column_totals();
        let Some(&initial) = totals.first() else {
            return 0.0;
        };
        let scale = if initial == 0.0 { 1.0 } else { initial.abs() };
        totals
            .iter()
            .map(|t| (t - initial).abs() / scale)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        // 2 states, 4 points, time-major input
        Trajectory::from_time_major(2, 0.0, 0.5, &[1.0, 0.0, 0.8, 0.2, 0.6, 0.4, 0.4, 0.6])
    }

    #[test]
    fn test_time_major_is_transposed() {
        let traj = sample();
        assert_eq!(traj.shape(), (2, 4));
        assert_eq!(traj.row(0), &[1.0, 0.8, 0.6, 0.4]);
        assert_eq!(traj.row(1), &[0.0, 0.2, 0.4, 0.6]);
        assert_eq!(traj.column(2), vec![0.6, 0.4]);
        assert_eq!(traj.times().collect::<Vec<_>>(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_downsample_keeps_every_stride_column() {
        let traj = sample();
        let coarse = traj.downsample(2, 10);
        assert_eq!(coarse.shape(), (2, 2));
        assert_eq!(coarse.row(0), &[1.0, 0.6]);
        assert_eq!(coarse.step_size(), 1.0);

        let truncated = traj.downsample(1, 3);
        assert_eq!(truncated.shape(), (2, 3));
    }

    #[test]
    fn test_negative_and_finite_checks() {
        let traj = Trajectory::from_rows(&[vec![1.0, -0.1], vec![0.0, f64::NAN]], 0.0, 1.0).unwrap();
        assert!(traj.has_negative());
        assert_eq!(traj.negative_count(), 1);
        assert!(!traj.is_finite());
    }

    #[test]
    fn test_fraction_eight_species() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64 + 1.0, 0.0]).collect();
        let traj = Trajectory::from_rows(&rows, 0.0, 1.0).unwrap();
        let one_p: Vec<f64> = traj.fraction(PhosphoLevel::One).unwrap().collect();
        // rows 1 and 4 hold 2 + 5 out of 36
        assert!((one_p[0] - 7.0 / 36.0).abs() < 1e-12);
        // zero total
        assert_eq!(one_p[1], 0.0);

        let all = traj.fractions_at(0).unwrap();
        assert!((all.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_requires_network_layout() {
        assert!(sample().fraction(PhosphoLevel::Zero).is_err());
    }

    #[test]
    fn test_mass_drift() {
        let traj = sample();
        assert!(traj.mass_drift() < 1e-15);
    }
}
