//! CSV export of phosphorylation-level time courses.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::biochemistry::species::PhosphoLevel;
use crate::error::Result;
use crate::state::Trajectory;

/// One row of the fraction time course
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FractionRecord {
    /// Simulation time (seconds)
    pub time_sec: f64,
    /// Unphosphorylated fraction
    pub p0: f64,
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    /// Fully phosphorylated fraction
    pub p4: f64,
}

impl FractionRecord {
    fn new(time_sec: f64, fractions: [f64; 5]) -> Self {
        let [p0, p1, p2, p3, p4] = fractions;
        Self {
            time_sec,
            p0,
            p1,
            p2,
            p3,
            p4,
        }
    }
}

/// Fraction records for every column of a network trajectory
pub fn fraction_records(trajectory: &Trajectory) -> Result<Vec<FractionRecord>> {
    let mut levels = PhosphoLevel::ALL
        .iter()
        .map(|&level| trajectory.fraction(level))
        .collect::<Result<Vec<_>>>()?;

    Ok(trajectory
        .times()
        .map(|t| {
            let mut fractions = [0.0; 5];
            for (slot, level) in fractions.iter_mut().zip(levels.iter_mut()) {
                *slot = level.next().unwrap_or(0.0);
            }
            FractionRecord::new(t, fractions)
        })
        .collect())
}

/// CSV exporter for fraction time courses
pub struct FractionCsvExporter {
    writer: csv::Writer<File>,
    rows_written: usize,
    /// Path to output file
    path: PathBuf,
}

impl FractionCsvExporter {
    /// Create an exporter writing to `exports/fractions_<label>_<timestamp>.csv`
    ///
    /// Creates the exports directory if it doesn't exist.
    pub fn new(label: &str) -> Result<Self> {
        Self::in_dir("exports", label)
    }

    /// Same as `new`, in a chosen directory
    pub fn in_dir<P: AsRef<Path>>(dir: P, label: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("fractions_{}_{}.csv", label, timestamp);
        let path = dir.join(filename);

        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            rows_written: 0,
            path,
        })
    }

    /// Append every time point of a trajectory
    pub fn write_trajectory(&mut self, trajectory: &Trajectory) -> Result<usize> {
        let records = fraction_records(trajectory)?;
        for record in &records {
            self.writer.serialize(record)?;
        }
        self.rows_written += records.len();
        Ok(records.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!(
            "CSV export completed: {} ({} rows)",
            self.path.display(),
            self.rows_written
        );
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write the fraction time course of `trajectory` to `path`
pub fn write_fraction_csv<P: AsRef<Path>>(path: P, trajectory: &Trajectory) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for record in fraction_records(trajectory)? {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::info!("Fractions written: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_trajectory() -> Trajectory {
        let mut rows = vec![vec![0.0, 0.0]; 8];
        rows[0] = vec![1.0, 0.5];
        rows[1] = vec![0.0, 0.5];
        Trajectory::from_rows(&rows, 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_fraction_records() {
        let records = fraction_records(&two_point_trajectory()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], FractionRecord::new(0.0, [1.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(records[1], FractionRecord::new(1.0, [0.5, 0.5, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_write_fraction_csv() {
        let path = std::env::temp_dir().join(format!("cmybpc_fractions_{}.csv", std::process::id()));
        write_fraction_csv(&path, &two_point_trajectory()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("time_sec,p0,p1,p2,p3,p4"));
        assert_eq!(lines.count(), 2);
        std::fs::remove_file(&path).ok();
    }
}
