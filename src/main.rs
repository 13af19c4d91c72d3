//! cMyBP-C simulator - Entry point
//!
//! CLI Usage:
//!   cargo run                           # Pulse time course, final model
//!   cargo run -- --sweep                # PKA x PP1 steady-state dose response
//!   cargo run -- --config run.json      # Override window / retry settings
//!   cargo run -- --export               # Also write results to the export directory

use std::time::Instant;

use anyhow::Result;
use cmybpc_sim::{
    biochemistry::{log_spaced, sweep::SteadyState},
    export::{export_sweep_json_in, FractionCsvExporter},
    simulate, DoseAxis, DoseResponseSweep, EnzymeLevels, EnzymePool, ModelVariant, ParameterSet,
    PhosphoLevel, PhosphoNetwork, Signal, SimulationConfig, StateLayout,
};

/// Total cMyBP-C (M)
const TOTAL_CMYBPC_M: f64 = 20e-6;

/// Demonstration kinetics: k = 1/s and Km = 1 uM for every reaction
fn reference_parameters() -> ParameterSet {
    // k2_fast, Km2_fast, k_isoF, k_isoR, k3_fast, Km3_fast
    ParameterSet::uniform(1.0, 1e-6, vec![5.0, 1e-6, 0.01, 0.001, 5.0, 1e-6])
}

struct CliOptions {
    sweep: bool,
    export: bool,
    config_path: String,
}

fn parse_args() -> CliOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = CliOptions {
        sweep: false,
        export: false,
        config_path: "data/simulation.json".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sweep" | "-s" => options.sweep = true,
            "--export" | "-e" => options.export = true,
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    options.config_path = args[i].clone();
                }
            }
            "--help" | "-h" => {
                println!("cMyBP-C phosphorylation simulator");
                println!();
                println!("Usage: cmybpc-sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --sweep, -s          Run a PKA x PP1 dose response");
                println!("  --config, -c PATH    JSON run configuration (default: data/simulation.json)");
                println!("  --export, -e         Write results to the export directory");
                println!("  --help, -h           Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    options
}

/// Three 10 min PKA pulses, 20 min apart, on the final model
fn run_time_course(config: &SimulationConfig, export: bool) -> Result<()> {
    println!("=== cMyBP-C time course (final model) ===\n");

    let signal = Signal::from_intervals(&[(300.0, 900.0), (2100.0, 2700.0), (3900.0, 4500.0)])?;
    let enzymes = EnzymeLevels::new(1e-7, 1e-8, 1e-7, 1e-8);
    let network = PhosphoNetwork::new(
        ModelVariant::Final,
        &reference_parameters(),
        enzymes,
        Some(signal),
    )?;
    let x0 = StateLayout::Nine.unphosphorylated(TOTAL_CMYBPC_M);

    let start = Instant::now();
    let run = simulate(&network, &x0, &config.window, &config.retry)?;
    println!(
        "Integrated {} points in {:.2?} ({:?})",
        run.trajectory.n_points(),
        start.elapsed(),
        run.status
    );
    println!("Mass drift: {:.2e}\n", run.trajectory.mass_drift());

    println!("  time_s      0P      1P      2P      3P      4P");
    let every = (600.0 / config.window.step_size_sec).round().max(1.0) as usize;
    for column in (0..run.trajectory.n_points()).step_by(every) {
        let f = run.trajectory.fractions_at(column)?;
        println!(
            "{:8.0}  {:6.3}  {:6.3}  {:6.3}  {:6.3}  {:6.3}",
            run.trajectory.time(column),
            f[0],
            f[1],
            f[2],
            f[3],
            f[4]
        );
    }

    if export {
        let mut exporter = FractionCsvExporter::in_dir(&config.export.directory, "final")?;
        exporter.write_trajectory(&run.trajectory)?;
        let path = exporter.finish()?;
        println!("\nFractions written to {}", path.display());
    }
    Ok(())
}

/// Steady state after continuous PKA exposure over a PKA x PP1 grid
fn run_sweep(config: &SimulationConfig, export: bool) -> Result<()> {
    println!("=== cMyBP-C dose response (PKA x PP1) ===\n");

    let window = config.window;
    let kinase_levels: Vec<f64> = log_spaced(-11.0, -5.0, 7)
        .into_iter()
        .filter(|&x| x <= 6e-6)
        .collect();

    let sweep = DoseResponseSweep {
        variant: ModelVariant::Final,
        parameter_sets: vec![reference_parameters()],
        base_enzymes: EnzymeLevels::default(),
        kinase: DoseAxis::new(EnzymePool::Pka, kinase_levels),
        phosphatase: DoseAxis::new(EnzymePool::Pp1, log_spaced(-9.0, -6.0, 4)),
        signal: Some(Signal::from_intervals(&[(
            window.t0_sec,
            window.t0_sec + window.integration_end(),
        )])?),
        initial_state: StateLayout::Nine.unphosphorylated(TOTAL_CMYBPC_M),
        window,
        retry: config.retry.clone(),
    };

    let start = Instant::now();
    let points = sweep.run();
    println!("{} grid points in {:.2?}\n", points.len(), start.elapsed());

    println!("     PP1_M      PKA_M     0P     4P  status");
    for point in &points {
        match &point.outcome {
            Ok(SteadyState { fractions, status, .. }) => println!(
                "{:10.2e} {:10.2e}  {:5.3}  {:5.3}  {:?}",
                point.phosphatase_M,
                point.kinase_M,
                fractions[PhosphoLevel::Zero.count()],
                fractions[PhosphoLevel::Four.count()],
                status
            ),
            Err(e) => println!(
                "{:10.2e} {:10.2e}  failed: {}",
                point.phosphatase_M, point.kinase_M, e
            ),
        }
    }

    if export {
        let path = export_sweep_json_in(&config.export.directory, sweep.variant, &points)?;
        println!("\nSweep written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args();
    let config = SimulationConfig::load_or_default(&options.config_path);
    let export = options.export || config.export.enabled;

    log::info!(
        "cMyBP-C simulator starting: t_end = {} s, h = {} s",
        config.window.t_end_sec,
        config.window.step_size_sec
    );

    if options.sweep {
        run_sweep(&config, export)
    } else {
        run_time_course(&config, export)
    }
}
