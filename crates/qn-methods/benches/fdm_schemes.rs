use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qn_core::{Exercise, OptionType, PlainVanillaPayoff};
use qn_methods::finite_differences::{
    FdmBlackScholesMesher, FdmBlackScholesSolver, FdmBoundaryConditionSet, FdmHestonSolver,
    FdmHestonVarianceMesher, FdmLogInnerValue, FdmMesher, FdmMesherComposite, FdmSchemeDesc,
    FdmSolverDesc, FdmStepConditionComposite,
};
use qn_processes::{GeneralizedBlackScholesProcess, HestonProcess};
use qn_termstructures::{BlackConstantVol, FlatForward};
use std::hint::black_box;
use std::sync::Arc;

fn schemes() -> [(&'static str, FdmSchemeDesc); 5] {
    [
        ("douglas", FdmSchemeDesc::douglas()),
        ("crank_nicolson", FdmSchemeDesc::crank_nicolson()),
        ("craig_sneyd", FdmSchemeDesc::craig_sneyd()),
        ("modified_craig_sneyd", FdmSchemeDesc::modified_craig_sneyd()),
        ("hundsdorfer", FdmSchemeDesc::hundsdorfer()),
    ]
}

fn solver_desc(
    mesher: Arc<dyn FdmMesher>,
    exercise: &Exercise,
    time_steps: usize,
) -> FdmSolverDesc {
    let payoff = Arc::new(PlainVanillaPayoff::new(OptionType::Put, 100.0).expect("valid strike"));
    let calculator = Arc::new(FdmLogInnerValue::new(payoff, Arc::clone(&mesher), 0));
    FdmSolverDesc {
        condition: FdmStepConditionComposite::vanilla_composite(
            exercise,
            calculator.clone(),
            Arc::clone(&mesher),
        ),
        mesher,
        bc_set: FdmBoundaryConditionSet::new(),
        calculator,
        maturity: exercise.last_time(),
        time_steps,
        damping_steps: 0,
    }
}

fn bench_black_scholes_american(c: &mut Criterion) {
    let process = Arc::new(GeneralizedBlackScholesProcess::new(
        100.0,
        Arc::new(FlatForward::new(0.05)),
        Arc::new(FlatForward::new(0.02)),
        Arc::new(BlackConstantVol::new(0.2)),
    ));
    let exercise = Exercise::american(0.0, 1.0).expect("valid exercise");
    let mut group = c.benchmark_group("fdm_black_scholes_american");

    for size in [100, 200, 400] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let spot = FdmBlackScholesMesher::new(size, &process, 1.0, 100.0, 1e-4, 1.5)
                    .expect("mesher");
                let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(spot));
                let desc = solver_desc(mesher, &exercise, size / 2);
                let solver = FdmBlackScholesSolver::new(
                    Arc::clone(&process),
                    100.0,
                    desc,
                    FdmSchemeDesc::douglas(),
                    false,
                    None,
                )
                .expect("solver");
                black_box(solver.value_at(black_box(100.0)))
            })
        });
    }
    group.finish();
}

fn bench_heston_schemes(c: &mut Criterion) {
    let process = Arc::new(
        HestonProcess::new(
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.0)),
            100.0,
            0.04,
            1.5,
            0.04,
            0.3,
            -0.7,
        )
        .expect("valid Heston parameters"),
    );
    let bs = GeneralizedBlackScholesProcess::new(
        100.0,
        Arc::new(FlatForward::new(0.05)),
        Arc::new(FlatForward::new(0.0)),
        Arc::new(BlackConstantVol::new(0.2)),
    );
    let exercise = Exercise::european(1.0).expect("valid exercise");
    let mut group = c.benchmark_group("fdm_heston_schemes");
    group.sample_size(10);

    for (name, scheme) in schemes() {
        group.bench_function(name, |b| {
            b.iter(|| {
                let spot = FdmBlackScholesMesher::new(60, &bs, 1.0, 100.0, 1e-4, 1.5)
                    .expect("spot mesher");
                let variance =
                    FdmHestonVarianceMesher::new(20, &process, 1.0, 1e-4).expect("variance mesher");
                let mesher: Arc<dyn FdmMesher> =
                    Arc::new(FdmMesherComposite::from_2d(spot, variance));
                let desc = solver_desc(mesher, &exercise, 50);
                let solver =
                    FdmHestonSolver::new(Arc::clone(&process), desc, scheme).expect("solver");
                black_box(solver.value_at(black_box(100.0), 0.04))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_black_scholes_american, bench_heston_schemes);
criterion_main!(benches);
