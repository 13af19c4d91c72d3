//! Validation tests for the cMyBP-C phosphorylation network.
//!
//! Covers:
//! - Mass conservation of total cMyBP-C for every model variant
//! - Non-negativity for well-behaved parameter sets
//! - The reference PKA/PP1 time course on the 8-species model
//! - PKA gating by an exogenous signal in the final model

use cmybpc_sim::{
    biochemistry::{
        network::RSK2_MEASURED,
        species::{PhosphoLevel, StateLayout},
    },
    simulate, EnzymeLevels, ModelVariant, OdeSystem, ParameterSet, PhosphoNetwork, RetryController,
    RetryPolicy, RunStatus, Signal, SimulationError, TimeWindow,
};

const TOTAL_M: f64 = 20e-6;

fn auxiliary(variant: ModelVariant) -> Vec<f64> {
    let iso_full = vec![5.0, 1e-6, 0.01, 0.001, 5.0, 1e-6];
    match variant {
        ModelVariant::MichaelisMenten => vec![],
        ModelVariant::PhenomenologicalActivation => vec![2.0, 0.3],
        ModelVariant::AllostericActivation => vec![0.5, 2.0, 1e-6],
        ModelVariant::Isomerization => vec![5.0, 1e-6, 0.01, 0.001],
        ModelVariant::IsomerizationFull | ModelVariant::Final | ModelVariant::FinalRsk2 => iso_full,
    }
}

fn network_for(variant: ModelVariant) -> PhosphoNetwork {
    let mut params = ParameterSet::uniform(1.0, 1e-6, auxiliary(variant));
    if variant == ModelVariant::FinalRsk2 {
        params = params.with_rsk2(RSK2_MEASURED);
    }
    let enzymes = EnzymeLevels::new(1e-7, 1e-8, 1e-7, 1e-8).with_rsk2(1e-7);
    let signal = variant
        .is_non_autonomous()
        .then(|| Signal::from_intervals(&[(300.0, 3900.0)]).unwrap());
    PhosphoNetwork::new(variant, &params, enzymes, signal).unwrap()
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn test_reference_time_course() {
    let params = ParameterSet::uniform(1.0, 1e-6, vec![]);
    let enzymes = EnzymeLevels::new(1e-7, 0.0, 1e-7, 0.0);
    let network = PhosphoNetwork::new(ModelVariant::MichaelisMenten, &params, enzymes, None).unwrap();
    let x0 = StateLayout::Eight.unphosphorylated(TOTAL_M);

    let run = simulate(&network, &x0, &TimeWindow::seconds(3600.0), &RetryPolicy::default()).unwrap();
    let traj = &run.trajectory;

    assert_eq!(traj.shape(), (8, 3601), "one column per second including t_end");
    assert_eq!(traj.column(0), x0, "column 0 must be the initial state");

    for (j, total) in traj.column_totals().iter().enumerate() {
        assert!(
            ((total - TOTAL_M) / TOTAL_M).abs() < 1e-9,
            "total at column {} drifted to {}",
            j,
            total
        );
    }
    assert_eq!(run.status, RunStatus::Nominal, "h = 1 must suffice without retries");
    assert!(!traj.has_negative(), "reference run must stay non-negative");

    // Without PKC the delta-containing species never appear
    let last = traj.last_column().unwrap();
    for (i, &x) in last.iter().enumerate().skip(4) {
        assert_eq!(x, 0.0, "row {} should stay empty without PKC", i);
    }

    let expected = [7.94e-6, 5.55e-6, 3.84e-6, 2.67e-6];
    for (i, &e) in expected.iter().enumerate() {
        assert!(
            ((last[i] - e) / e).abs() < 0.01,
            "row {} at t_end: expected ~{}, got {}",
            i,
            e,
            last[i]
        );
    }
}

#[test]
fn test_reference_fractions_sum_to_one() {
    let params = ParameterSet::uniform(1.0, 1e-6, vec![]);
    let enzymes = EnzymeLevels::new(1e-7, 0.0, 1e-7, 0.0);
    let network = PhosphoNetwork::new(ModelVariant::MichaelisMenten, &params, enzymes, None).unwrap();
    let x0 = StateLayout::Eight.unphosphorylated(TOTAL_M);
    let run = simulate(&network, &x0, &TimeWindow::seconds(600.0), &RetryPolicy::default()).unwrap();

    let columns: Vec<Vec<f64>> = PhosphoLevel::ALL
        .iter()
        .map(|&level| run.trajectory.fraction(level).unwrap().collect())
        .collect();
    for j in 0..run.trajectory.n_points() {
        let sum: f64 = columns.iter().map(|c| c[j]).sum();
        assert!((sum - 1.0).abs() < 1e-12, "fractions at column {} sum to {}", j, sum);
    }
    assert_eq!(columns[0][0], 1.0);
    assert!(columns[0][600] < 1.0, "PKA should phosphorylate within 10 min");
}

// ============================================================================
// Conservation and Positivity Across Variants
// ============================================================================

#[test]
fn test_mass_conservation_all_variants() {
    for variant in ModelVariant::ALL {
        let network = network_for(variant);
        let x0 = variant.layout().unphosphorylated(TOTAL_M);
        let run = simulate(&network, &x0, &TimeWindow::seconds(3600.0), &RetryPolicy::default())
            .unwrap_or_else(|e| panic!("{} failed: {}", variant, e));

        assert_eq!(run.trajectory.shape(), (variant.layout().len(), 3601));
        assert!(
            run.trajectory.mass_drift() < 1e-9,
            "{}: mass drift {}",
            variant,
            run.trajectory.mass_drift()
        );
        assert!(run.is_nominal(), "{} needed a retry: {:?}", variant, run.status);
        assert!(!run.trajectory.has_negative(), "{} went negative", variant);
    }
}

#[test]
fn test_derivatives_conserve_mass_at_arbitrary_states() {
    for variant in ModelVariant::ALL {
        let network = network_for(variant);
        let n = variant.layout().len();
        let y: Vec<f64> = (0..n).map(|i| 1e-6 * ((i * 7) % 5 + 1) as f64).collect();
        let mut dydt = vec![0.0; n];
        network.derivatives(1000.0, &y, &mut dydt);

        let scale: f64 = dydt.iter().map(|d| d.abs()).sum();
        let sum: f64 = dydt.iter().sum();
        assert!(sum.abs() <= 1e-12 * scale, "{}: derivative sum {}", variant, sum);
    }
}

#[test]
fn test_structural_transition_populates_alpha_tr() {
    let network = network_for(ModelVariant::Isomerization);
    let x0 = StateLayout::Nine.unphosphorylated(TOTAL_M);
    let run = simulate(&network, &x0, &TimeWindow::seconds(1800.0), &RetryPolicy::default()).unwrap();
    let atr = run.trajectory.row(2);
    assert_eq!(atr[0], 0.0);
    assert!(
        atr.iter().any(|&x| x > 0.0),
        "PP1 removal of beta should produce the structured alpha form"
    );
}

// ============================================================================
// Signal Gating
// ============================================================================

#[test]
fn test_pka_follows_signal_in_final_model() {
    let params = ParameterSet::uniform(1.0, 1e-6, auxiliary(ModelVariant::Final));
    let enzymes = EnzymeLevels::new(1e-7, 0.0, 1e-7, 0.0);
    let signal = Signal::from_intervals(&[(300.0, 3900.0)]).unwrap();
    let network = PhosphoNetwork::new(ModelVariant::Final, &params, enzymes, Some(signal)).unwrap();
    let x0 = StateLayout::Nine.unphosphorylated(TOTAL_M);

    let run = simulate(&network, &x0, &TimeWindow::seconds(600.0), &RetryPolicy::default()).unwrap();
    let zero_p: Vec<f64> = run.trajectory.fraction(PhosphoLevel::Zero).unwrap().collect();

    assert_eq!(zero_p[300], 1.0, "no phosphorylation before the pulse starts");
    assert!(zero_p[310] < 1.0, "PKA should act once the pulse is on");
}

#[test]
fn test_rsk2_phosphorylates_without_pka() {
    let params = ParameterSet::uniform(1.0, 1e-6, auxiliary(ModelVariant::Final)).with_rsk2(RSK2_MEASURED);
    let enzymes = EnzymeLevels::new(0.0, 0.0, 1e-8, 0.0).with_rsk2(1e-7);
    let network = PhosphoNetwork::new(
        ModelVariant::FinalRsk2,
        &params,
        enzymes,
        Some(Signal::Constant(1.0)),
    )
    .unwrap();
    let x0 = StateLayout::Nine.unphosphorylated(TOTAL_M);

    let run = simulate(&network, &x0, &TimeWindow::seconds(600.0), &RetryPolicy::default()).unwrap();
    let f = run.trajectory.fractions_at(600).unwrap();
    assert!(f[1] > 0.0, "RSK2 should produce singly phosphorylated protein");
    assert!(run.trajectory.mass_drift() < 1e-9);
}

// ============================================================================
// Input Validation
// ============================================================================

#[test]
fn test_wrong_state_length_rejected() {
    let network = network_for(ModelVariant::MichaelisMenten);
    let x0 = StateLayout::Nine.unphosphorylated(TOTAL_M);
    let err = simulate(&network, &x0, &TimeWindow::seconds(10.0), &RetryPolicy::default()).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidStateLength { expected: 8, got: 9 }));
}

#[test]
fn test_wrong_state_length_rejected_by_controller() {
    let network = network_for(ModelVariant::Final);
    let err = RetryController::default()
        .run(&network, &[TOTAL_M, 0.0, 0.0, 0.0, 0.0], &TimeWindow::seconds(10.0))
        .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidStateLength { expected: 9, got: 5 }));
}

#[test]
fn test_late_start_keeps_grid_size() {
    let network = network_for(ModelVariant::MichaelisMenten);
    let x0 = StateLayout::Eight.unphosphorylated(TOTAL_M);
    let run = simulate(&network, &x0, &TimeWindow::new(100.0, 600.0, 1.0), &RetryPolicy::default()).unwrap();

    assert_eq!(run.trajectory.shape(), (8, 601), "point count depends on t_end only");
    assert_eq!(run.trajectory.time(0), 100.0);
    assert_eq!(run.trajectory.time(600), 700.0);
    assert_eq!(run.trajectory.column(0), x0);
}

#[test]
fn test_enzyme_count_must_match_variant() {
    let params = ParameterSet::uniform(1.0, 1e-6, auxiliary(ModelVariant::Final)).with_rsk2(RSK2_MEASURED);
    let err = PhosphoNetwork::from_enzyme_slice(
        ModelVariant::FinalRsk2,
        &params,
        &[1e-7, 0.0, 1e-7, 0.0],
        Some(Signal::Constant(1.0)),
    )
    .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidEnzymeCount { expected: 5, got: 4 }));
}

#[test]
fn test_flat_parameter_row() {
    let mut row = vec![1.0; 30];
    row.extend(vec![1e-6; 30]);
    let params = ParameterSet::from_flat(&row, ModelVariant::MichaelisMenten).unwrap();
    assert_eq!(params, ParameterSet::uniform(1.0, 1e-6, vec![]));

    row.push(0.5);
    assert!(matches!(
        ParameterSet::from_flat(&row, ModelVariant::MichaelisMenten),
        Err(SimulationError::InvalidParameterLength { .. })
    ));
}
