//! Exogenous signals gating enzyme activity.
//!
//! A signal is a dimensionless multiplier applied to the PKA concentration of
//! the non-autonomous network variants. Pulses model beta-adrenergic
//! stimulation episodes; the decaying form lets activity relax exponentially
//! once a stimulus ends.
//!
//! All signals are deterministic functions of time. Randomness only enters
//! through the generators (`PulseTrain`, `noisy_levels`), which take the
//! caller's RNG so runs are reproducible under a fixed seed.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Closed time interval `[start, stop]` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub stop: f64,
}

impl Interval {
    pub fn new(start: f64, stop: f64) -> Result<Self> {
        if !start.is_finite() || !stop.is_finite() {
            return Err(SimulationError::InvalidSignal(format!(
                "interval bounds must be finite, got [{}, {}]",
                start, stop
            )));
        }
        if start > stop {
            return Err(SimulationError::InvalidSignal(format!(
                "interval start {} after stop {}",
                start, stop
            )));
        }
        Ok(Self { start, stop })
    }

    /// Inclusive on both ends
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.stop
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }
}

/// Time-varying multiplier of an enzyme concentration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// Fixed level
    Constant(f64),
    /// 1 inside any interval, 0 elsewhere
    Intervals(Vec<Interval>),
    /// 1 inside an interval, then `exp(-decay_rate * (t - stop))` after it
    DecayingPulses {
        intervals: Vec<Interval>,
        /// Relaxation rate (1/s)
        decay_rate: f64,
    },
    /// Sampled profile held constant between sample times
    Tabulated { times: Vec<f64>, values: Vec<f64> },
}

impl Signal {
    /// Rectangular pulses from `(start, stop)` pairs
    pub fn from_intervals(pairs: &[(f64, f64)]) -> Result<Self> {
        Ok(Signal::Intervals(intervals_from_pairs(pairs)?))
    }

    /// Rectangular pulses from a flat `[start0, stop0, start1, stop1, ...]` list
    pub fn from_flat(bounds: &[f64]) -> Result<Self> {
        Ok(Signal::Intervals(intervals_from_flat(bounds)?))
    }

    pub fn decaying(pairs: &[(f64, f64)], decay_rate: f64) -> Result<Self> {
        if !decay_rate.is_finite() {
            return Err(SimulationError::InvalidSignal(format!(
                "decay rate must be finite, got {}",
                decay_rate
            )));
        }
        Ok(Signal::DecayingPulses {
            intervals: intervals_from_pairs(pairs)?,
            decay_rate,
        })
    }

    /// Zero-order hold over `(times, values)`; times must be non-decreasing
    pub fn tabulated(times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if times.is_empty() || times.len() != values.len() {
            return Err(SimulationError::InvalidSignal(format!(
                "tabulated signal needs matching non-empty columns, got {} times and {} values",
                times.len(),
                values.len()
            )));
        }
        if times.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(SimulationError::InvalidSignal(
                "tabulated signal times must be non-decreasing".to_string(),
            ));
        }
        Ok(Signal::Tabulated { times, values })
    }

    /// Signal level at time `t`
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Signal::Constant(level) => *level,
            Signal::Intervals(intervals) => {
                if intervals.iter().any(|iv| iv.contains(t)) {
                    1.0
                } else {
                    0.0
                }
            }
            Signal::DecayingPulses {
                intervals,
                decay_rate,
            } => {
                // Later intervals override earlier ones once started
                let mut level = 0.0;
                for iv in intervals.iter().filter(|iv| t >= iv.start) {
                    level = if t < iv.stop {
                        1.0
                    } else {
                        (-decay_rate * (t - iv.stop)).exp()
                    };
                }
                level
            }
            Signal::Tabulated { times, values } => {
                let idx = times.partition_point(|&s| s <= t);
                values.get(idx.saturating_sub(1)).copied().unwrap_or(0.0)
            }
        }
    }

    /// Values on the grid `i * h` for `i in 0..floor(t_end / h)`
    pub fn sample(&self, t_end: f64, h: f64) -> Result<Vec<f64>> {
        if !(h > 0.0) || !h.is_finite() {
            return Err(SimulationError::InvalidStepSize(h));
        }
        let n = (t_end / h + 1e-9).floor().max(0.0) as usize;
        Ok((0..n).map(|i| self.value(i as f64 * h)).collect())
    }

    /// Intervals of a pulse-shaped signal, if any
    pub fn intervals(&self) -> Option<&[Interval]> {
        match self {
            Signal::Intervals(intervals) | Signal::DecayingPulses { intervals, .. } => {
                Some(intervals)
            }
            _ => None,
        }
    }
}

fn intervals_from_pairs(pairs: &[(f64, f64)]) -> Result<Vec<Interval>> {
    pairs
        .iter()
        .map(|&(start, stop)| Interval::new(start, stop))
        .collect()
}

fn intervals_from_flat(bounds: &[f64]) -> Result<Vec<Interval>> {
    if bounds.len() % 2 != 0 {
        return Err(SimulationError::InvalidSignal(format!(
            "flat interval list needs an even length, got {}",
            bounds.len()
        )));
    }
    bounds
        .chunks_exact(2)
        .map(|pair| Interval::new(pair[0], pair[1]))
        .collect()
}

/// Pulse schedule with random displacement of individual pulses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseTrain {
    pub count: usize,
    /// Pulse length (s)
    pub duration: f64,
    /// Gap between regular pulses (s)
    pub pause: f64,
    /// Onset of the first regular pulse (s)
    pub first_onset: f64,
    /// Probability that a pulse keeps its regular slot
    pub p_regular: f64,
    /// Displaced pulses start at a uniform integer second in `[0, horizon]`
    pub horizon: f64,
}

impl PulseTrain {
    /// Fully regular schedule
    pub fn regular(count: usize, duration: f64, pause: f64, first_onset: f64) -> Self {
        Self {
            count,
            duration,
            pause,
            first_onset,
            p_regular: 1.0,
            horizon: 0.0,
        }
    }

    /// Onset of pulse `i` in the regular schedule
    pub fn regular_onset(&self, i: usize) -> f64 {
        self.first_onset + i as f64 * (self.duration + self.pause)
    }

    /// Draw one realisation of the schedule, sorted by start time
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Interval>> {
        if !(0.0..=1.0).contains(&self.p_regular) {
            return Err(SimulationError::InvalidSignal(format!(
                "p_regular must lie in [0, 1], got {}",
                self.p_regular
            )));
        }
        if !(self.duration >= 0.0) || !(self.horizon >= 0.0) {
            return Err(SimulationError::InvalidSignal(
                "pulse duration and horizon must be non-negative".to_string(),
            ));
        }

        let latest = self.horizon.floor() as u64;
        let mut pulses = (0..self.count)
            .map(|i| {
                let onset = if rng.gen::<f64>() < self.p_regular {
                    self.regular_onset(i)
                } else {
                    rng.gen_range(0..=latest) as f64
                };
                Interval::new(onset, onset + self.duration)
            })
            .collect::<Result<Vec<_>>>()?;

        pulses.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(pulses)
    }

    /// Rectangular signal for one realisation
    pub fn signal<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Signal> {
        Ok(Signal::Intervals(self.generate(rng)?))
    }
}

/// Piecewise-constant Gaussian levels over `n` samples.
///
/// The first `hold` samples carry `mean`; a new level drawn from
/// N(mean, sd) starts at every later multiple of `hold`.
pub fn noisy_levels<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    mean: f64,
    sd: f64,
    hold: usize,
) -> Result<Vec<f64>> {
    if hold == 0 {
        return Err(SimulationError::InvalidSignal(
            "hold period must be at least one sample".to_string(),
        ));
    }
    let normal = Normal::new(mean, sd)
        .map_err(|e| SimulationError::InvalidSignal(format!("noise distribution: {}", e)))?;

    let mut level = mean;
    Ok((0..n)
        .map(|i| {
            if i > 0 && i % hold == 0 {
                level = normal.sample(rng);
            }
            level
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_interval_rejects_reversed_bounds() {
        assert!(Interval::new(10.0, 5.0).is_err());
        assert!(Interval::new(f64::NAN, 5.0).is_err());
        assert!(Interval::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn test_from_flat_requires_pairs() {
        assert!(Signal::from_flat(&[1.0, 2.0, 3.0]).is_err());
        let s = Signal::from_flat(&[1.0, 2.0, 5.0, 6.0]).unwrap();
        assert_eq!(s.intervals().map(|iv| iv.len()), Some(2));
    }

    #[test]
    fn test_decaying_pulse_shape() {
        let s = Signal::decaying(&[(10.0, 20.0)], 0.1).unwrap();
        assert_eq!(s.value(5.0), 0.0);
        assert_eq!(s.value(10.0), 1.0);
        assert_eq!(s.value(19.9), 1.0);
        assert_eq!(s.value(20.0), 1.0);
        assert!((s.value(30.0) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_decaying_last_started_pulse_wins() {
        let s = Signal::decaying(&[(0.0, 10.0), (15.0, 20.0)], 1.0).unwrap();
        assert!(s.value(12.0) < 1.0);
        assert_eq!(s.value(16.0), 1.0);
    }

    #[test]
    fn test_tabulated_zero_order_hold() {
        let s = Signal::tabulated(vec![0.0, 10.0, 20.0], vec![0.5, 1.0, 0.0]).unwrap();
        assert_eq!(s.value(-1.0), 0.5);
        assert_eq!(s.value(0.0), 0.5);
        assert_eq!(s.value(9.99), 0.5);
        assert_eq!(s.value(10.0), 1.0);
        assert_eq!(s.value(100.0), 0.0);
        assert!(Signal::tabulated(vec![1.0, 0.0], vec![1.0, 1.0]).is_err());
        assert!(Signal::tabulated(vec![], vec![]).is_err());
    }

    #[test]
    fn test_sample_grid() {
        let s = Signal::from_intervals(&[(2.0, 3.0)]).unwrap();
        let samples = s.sample(5.0, 1.0).unwrap();
        assert_eq!(samples, vec![0.0, 0.0, 1.0, 1.0, 0.0]);
        assert_eq!(s.sample(1.0, 0.1).unwrap().len(), 10);
    }

    #[test]
    fn test_regular_pulse_train() {
        let train = PulseTrain::regular(3, 60.0, 240.0, 100.0);
        let mut rng = StdRng::seed_from_u64(7);
        let pulses = train.generate(&mut rng).unwrap();
        assert_eq!(pulses.len(), 3);
        assert_eq!(pulses[0], Interval { start: 100.0, stop: 160.0 });
        assert_eq!(pulses[2], Interval { start: 700.0, stop: 760.0 });
    }

    #[test]
    fn test_noisy_levels_hold() {
        let mut rng = StdRng::seed_from_u64(3);
        let levels = noisy_levels(&mut rng, 25, 1.0, 0.2, 10).unwrap();
        assert_eq!(levels.len(), 25);
        assert!(levels[..10].iter().all(|&x| x == 1.0));
        assert!(levels[10..20].iter().all(|&x| x == levels[10]));
        assert!(levels[20..].iter().all(|&x| x == levels[20]));
    }
}
