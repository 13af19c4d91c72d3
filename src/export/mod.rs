//! Export functionality for simulation data.
//!
//! Provides CSV export of phosphorylation-level time courses and JSON export
//! of dose-response sweeps.

mod csv_export;
mod json_export;

pub use csv_export::{fraction_records, write_fraction_csv, FractionCsvExporter, FractionRecord};
pub use json_export::{
    export_sweep_json, export_sweep_json_in, export_sweep_json_to, SweepExport, SweepRecord,
};
