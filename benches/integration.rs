//! Integration benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cmybpc_sim::biochemistry::integrator::{IntegratorConfig, Rk4Integrator};
use cmybpc_sim::{
    simulate, EnzymeLevels, ModelVariant, OdeSystem, ParameterSet, PhosphoNetwork, RetryPolicy,
    Signal, StateLayout, TimeWindow,
};

fn final_network() -> PhosphoNetwork {
    let params = ParameterSet::uniform(1.0, 1e-6, vec![5.0, 1e-6, 0.01, 0.001, 5.0, 1e-6]);
    let enzymes = EnzymeLevels::new(1e-7, 1e-8, 1e-7, 1e-8);
    let signal = Signal::from_intervals(&[(300.0, 900.0), (2100.0, 2700.0)]).unwrap();
    PhosphoNetwork::new(ModelVariant::Final, &params, enzymes, Some(signal)).unwrap()
}

fn bench_derivatives(c: &mut Criterion) {
    let network = final_network();
    let y: Vec<f64> = (0..9).map(|i| 1e-6 * (i as f64 + 1.0)).collect();
    let mut dydt = vec![0.0; 9];

    c.bench_function("final_derivatives", |b| {
        b.iter(|| network.derivatives(black_box(500.0), black_box(&y), &mut dydt))
    });
}

fn bench_one_hour(c: &mut Criterion) {
    let network = final_network();
    let x0 = StateLayout::Nine.unphosphorylated(20e-6);
    let window = TimeWindow::seconds(3600.0);
    let policy = RetryPolicy::default();

    c.bench_function("final_one_hour", |b| {
        b.iter(|| simulate(black_box(&network), black_box(&x0), &window, &policy))
    });
}

fn bench_one_hour_fine_step(c: &mut Criterion) {
    let network = final_network();
    let x0 = StateLayout::Nine.unphosphorylated(20e-6);
    let mut integrator = Rk4Integrator::new(IntegratorConfig::with_step(0.1));

    c.bench_function("final_one_hour_h0.1", |b| {
        b.iter(|| integrator.integrate(black_box(&network), black_box(&x0), 0.0, 3601.0))
    });
}

criterion_group!(
    benches,
    bench_derivatives,
    bench_one_hour,
    bench_one_hour_fine_step
);
criterion_main!(benches);
