//! The three numerical methods price the same American put.

use approx::assert_abs_diff_eq;
use qn_core::{Exercise, OptionType, Payoff, PlainVanillaPayoff, Real};
use qn_methods::finite_differences::{
    FdmBlackScholesMesher, FdmBlackScholesSolver, FdmBoundaryConditionSet, FdmLogInnerValue,
    FdmMesher, FdmMesherComposite, FdmSchemeDesc, FdmSolverDesc, FdmStepConditionComposite,
};
use qn_methods::lattice::{
    BinomialTree, BinomialType, BlackScholesLattice, DiscretizedAsset, DiscretizedVanillaOption,
};
use qn_methods::monte_carlo::{
    AmericanPathPricer, LongstaffSchwartzPathPricer, MonteCarloModel, PathGenerator,
};
use qn_methods::TimeGrid;
use qn_processes::GeneralizedBlackScholesProcess;
use qn_termstructures::{BlackConstantVol, FlatForward};
use std::sync::Arc;

const SPOT: Real = 100.0;
const STRIKE: Real = 100.0;
const RATE: Real = 0.05;
const DIVIDEND: Real = 0.02;
const VOL: Real = 0.25;
const MATURITY: Real = 1.0;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn process() -> Arc<GeneralizedBlackScholesProcess> {
    Arc::new(GeneralizedBlackScholesProcess::new(
        SPOT,
        Arc::new(FlatForward::new(RATE)),
        Arc::new(FlatForward::new(DIVIDEND)),
        Arc::new(BlackConstantVol::new(VOL)),
    ))
}

fn payoff() -> Arc<PlainVanillaPayoff> {
    Arc::new(PlainVanillaPayoff::new(OptionType::Put, STRIKE).unwrap())
}

fn finite_differences(exercise: &Exercise) -> Real {
    let process = process();
    let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
        FdmBlackScholesMesher::new(400, &process, MATURITY, STRIKE, 1e-5, 1.5).unwrap(),
    ));
    let calculator = Arc::new(FdmLogInnerValue::new(payoff(), Arc::clone(&mesher), 0));
    let desc = FdmSolverDesc {
        condition: FdmStepConditionComposite::vanilla_composite(
            exercise,
            calculator.clone(),
            Arc::clone(&mesher),
        ),
        mesher,
        bc_set: FdmBoundaryConditionSet::new(),
        calculator,
        maturity: MATURITY,
        time_steps: 200,
        damping_steps: 5,
    };
    FdmBlackScholesSolver::new(process, STRIKE, desc, FdmSchemeDesc::douglas(), false, None)
        .unwrap()
        .value_at(SPOT)
}

fn binomial(exercise: &Exercise) -> Real {
    let steps = 801;
    let process = process();
    let tree =
        BinomialTree::new(BinomialType::LeisenReimer, &process, MATURITY, steps, STRIKE).unwrap();
    let lattice = BlackScholesLattice::build(tree, RATE, MATURITY, steps).unwrap();
    let mut option = DiscretizedVanillaOption::new(payoff(), exercise);
    option.initialize(&lattice, MATURITY).unwrap();
    option.rollback(&lattice, 0.0).unwrap();
    option.present_value(&lattice).unwrap()
}

fn longstaff_schwartz() -> (Real, Real) {
    let grid = TimeGrid::new(MATURITY, 50).unwrap();
    let curve = FlatForward::new(RATE);
    let payoff: Arc<dyn Payoff> = payoff();
    let exercise = AmericanPathPricer::new(payoff, STRIKE, 3).unwrap();
    let pricer = LongstaffSchwartzPathPricer::new(&grid, Box::new(exercise), &curve).unwrap();
    let generator = PathGenerator::new(process(), grid, 17).unwrap();
    let mut model = MonteCarloModel::new(generator, pricer, true);
    model.add_samples(4096);
    model.pricer_mut().calibrate().unwrap();
    model.reset_statistics();
    model.add_samples(16_384);
    let stats = model.statistics();
    (stats.mean().unwrap(), stats.error_estimate().unwrap())
}

#[test]
fn lattice_and_finite_differences_agree() {
    init_logging();
    let american = Exercise::american(0.0, MATURITY).unwrap();
    let fd = finite_differences(&american);
    let tree = binomial(&american);
    assert_abs_diff_eq!(fd, tree, epsilon = 2e-2);

    let european = Exercise::european(MATURITY).unwrap();
    assert!(fd > finite_differences(&european) + 0.1);
}

#[test]
fn least_squares_monte_carlo_is_close_below() {
    init_logging();
    let american = Exercise::american(0.0, MATURITY).unwrap();
    let reference = binomial(&american);
    let (value, error) = longstaff_schwartz();
    // a Bermudan with 50 dates and a sub-optimal rule sits slightly below
    assert!(value < reference + 3.0 * error, "{value} ± {error} vs {reference}");
    assert!(value > reference - 0.15, "{value} vs {reference}");
}
