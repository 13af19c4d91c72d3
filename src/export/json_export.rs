//! JSON export of dose-response sweeps.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::biochemistry::network::ModelVariant;
use crate::biochemistry::retry::RunStatus;
use crate::biochemistry::sweep::SweepPoint;
use crate::error::Result;

/// One grid point in the export
#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub parameter_index: usize,
    pub phosphatase_M: f64,
    pub kinase_M: f64,
    /// 0P ... 4P at t_end, absent for failed points
    pub fractions: Option<[f64; 5]>,
    pub status: Option<RunStatus>,
    pub error: Option<String>,
}

impl From<&SweepPoint> for SweepRecord {
    fn from(point: &SweepPoint) -> Self {
        let (fractions, status, error) = match &point.outcome {
            Ok(steady) => (Some(steady.fractions), Some(steady.status), None),
            Err(e) => (None, None, Some(e.to_string())),
        };
        Self {
            parameter_index: point.parameter_index,
            phosphatase_M: point.phosphatase_M,
            kinase_M: point.kinase_M,
            fractions,
            status,
            error,
        }
    }
}

/// Full sweep export structure
#[derive(Debug, Clone, Serialize)]
pub struct SweepExport {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    pub variant: ModelVariant,
    pub points: Vec<SweepRecord>,
}

impl SweepExport {
    pub fn new(variant: ModelVariant, points: &[SweepPoint]) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: "1.0.0",
            variant,
            points: points.iter().map(SweepRecord::from).collect(),
        }
    }
}

/// Export sweep results to `exports/sweep_YYYYMMDD_HHMMSS.json`
///
/// Creates the exports directory if it doesn't exist.
pub fn export_sweep_json(variant: ModelVariant, points: &[SweepPoint]) -> Result<PathBuf> {
    export_sweep_json_in("exports", variant, points)
}

/// Export sweep results to a timestamped file under `dir`
pub fn export_sweep_json_in<P: AsRef<Path>>(
    dir: P,
    variant: ModelVariant,
    points: &[SweepPoint],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let filename = format!("sweep_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    export_sweep_json_to(variant, points, &path)?;
    Ok(path)
}

/// Export sweep results to a specific file
pub fn export_sweep_json_to<P: AsRef<Path>>(
    variant: ModelVariant,
    points: &[SweepPoint],
    path: P,
) -> Result<()> {
    let export = SweepExport::new(variant, points);
    let file = std::fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &export)?;

    log::info!("JSON sweep exported: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;

    #[test]
    fn test_failed_point_keeps_error() {
        let point = SweepPoint {
            parameter_index: 2,
            phosphatase_M: 1e-7,
            kinase_M: 1e-9,
            outcome: Err(SimulationError::NonFinite {
                time: 3.0,
                step_size: 0.01,
            }),
        };
        let record = SweepRecord::from(&point);
        assert!(record.fractions.is_none());
        assert!(record.error.unwrap().contains("non-finite"));

        let json = serde_json::to_string(&SweepExport::new(ModelVariant::Final, &[point])).unwrap();
        assert!(json.contains("\"variant\":\"Final\""));
    }

    #[test]
    fn test_export_lands_in_requested_directory() {
        let dir = std::env::temp_dir().join(format!("cmybpc_sweep_{}", std::process::id()));
        let path = export_sweep_json_in(&dir, ModelVariant::MichaelisMenten, &[]).unwrap();

        assert_eq!(path.parent(), Some(dir.as_path()));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("MichaelisMenten"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
