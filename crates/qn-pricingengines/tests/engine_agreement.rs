//! Engines built on different numerical methods agree on the same
//! instruments, all configured from one TOML document.

use approx::assert_abs_diff_eq;
use qn_core::{Exercise, OptionType, Real};
use qn_methods::lattice::SwapType;
use qn_models::{HullWhite, G2};
use qn_pricingengines::{
    black_scholes_price, BinomialVanillaEngine, EngineConfig, FdBlackScholesVanillaEngine,
    FdG2SwaptionEngine, FdHestonVanillaEngine, FdHullWhiteSwaptionEngine, McAmericanEngine,
    PricingEngine, SwaptionArgs, TreeSwaptionEngine, VanillaOptionArgs,
};
use qn_processes::{GeneralizedBlackScholesProcess, HestonProcess};
use qn_termstructures::{BlackConstantVol, FlatForward, YieldTermStructure};
use std::sync::Arc;

const SETTINGS: &str = r#"
[fd]
t_grid = 100
x_grid = 200
v_grid = 40
damping_steps = 2
scheme = { kind = "Douglas", theta = 0.5, mu = 0.0 }

[tree]
time_steps = 400
binomial = "LeisenReimer"

[mc]
samples = 16384
calibration_samples = 4096
seed = 1234
"#;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> EngineConfig {
    EngineConfig::from_toml_str(SETTINGS).unwrap()
}

fn black_scholes(spot: Real, r: Real, q: Real, vol: Real) -> Arc<GeneralizedBlackScholesProcess> {
    Arc::new(GeneralizedBlackScholesProcess::new(
        spot,
        Arc::new(FlatForward::new(r)),
        Arc::new(FlatForward::new(q)),
        Arc::new(BlackConstantVol::new(vol)),
    ))
}

#[test]
fn european_call_by_grid_tree_and_formula() {
    init_logging();
    let config = config();
    let process = black_scholes(100.0, 0.05, 0.02, 0.25);
    let args =
        VanillaOptionArgs::vanilla(OptionType::Call, 100.0, Exercise::european(1.0).unwrap())
            .unwrap();
    let exact = black_scholes_price(OptionType::Call, 100.0, 100.0, 0.05, 0.02, 0.25, 1.0);

    let fd = FdBlackScholesVanillaEngine::from_config(process.clone(), &config)
        .unwrap()
        .calculate(&args)
        .unwrap();
    let tree = BinomialVanillaEngine::from_config(process, &config)
        .unwrap()
        .calculate(&args)
        .unwrap();

    assert_abs_diff_eq!(fd.value, exact.value, epsilon = 2e-2);
    assert_abs_diff_eq!(tree.value, exact.value, epsilon = 2e-3);
    assert_abs_diff_eq!(fd.delta.unwrap(), tree.delta.unwrap(), epsilon = 1e-2);
    assert_abs_diff_eq!(fd.gamma.unwrap(), tree.gamma.unwrap(), epsilon = 2e-3);
}

#[test]
fn american_put_by_grid_tree_and_regression() {
    init_logging();
    let config = config();
    let process = black_scholes(36.0, 0.06, 0.0, 0.2);
    let args =
        VanillaOptionArgs::vanilla(OptionType::Put, 40.0, Exercise::american(0.0, 1.0).unwrap())
            .unwrap();

    let fd = FdBlackScholesVanillaEngine::from_config(process.clone(), &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .value;
    let tree = BinomialVanillaEngine::from_config(process.clone(), &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .value;
    let mc = McAmericanEngine::from_config(process, &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .value;

    assert_abs_diff_eq!(fd, 4.478, epsilon = 2e-2);
    assert_abs_diff_eq!(tree, 4.478, epsilon = 1e-2);
    assert_abs_diff_eq!(mc, 4.478, epsilon = 0.1);
}

#[test]
fn heston_with_quiet_variance_is_close_to_black_scholes() {
    init_logging();
    let r: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.04));
    let q: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.01));
    let heston = Arc::new(HestonProcess::new(r, q, 100.0, 0.04, 2.0, 0.04, 0.05, 0.0).unwrap());
    let args =
        VanillaOptionArgs::vanilla(OptionType::Put, 100.0, Exercise::european(1.0).unwrap())
            .unwrap();
    let fd = FdHestonVanillaEngine::from_config(heston, &config())
        .unwrap()
        .calculate(&args)
        .unwrap()
        .value;
    let exact = black_scholes_price(OptionType::Put, 100.0, 100.0, 0.04, 0.01, 0.2, 1.0).value;
    assert_abs_diff_eq!(fd, exact, epsilon = 5e-2);
}

#[test]
fn bermudan_swaption_on_grids_and_trees() {
    init_logging();
    let config = config();
    let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.04));
    let args = SwaptionArgs::regular(
        SwapType::Receiver,
        100.0,
        0.04,
        1.0,
        5.0,
        1.0,
        0.5,
        Exercise::bermudan(vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
    )
    .unwrap();

    let hull_white = Arc::new(HullWhite::new(curve.clone(), 0.08, 0.009).unwrap());
    let hw_fd = FdHullWhiteSwaptionEngine::from_config(hull_white.clone(), &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .npv;
    let hw_tree = TreeSwaptionEngine::from_config(hull_white, &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .npv;
    assert!(hw_fd > 0.0);
    assert_abs_diff_eq!(hw_fd, hw_tree, epsilon = 2e-2);

    // a second factor with a tiny volatility leaves the Hull-White price
    let g2 = Arc::new(G2::new(curve, 0.08, 0.009, 0.5, 1e-5, 0.0).unwrap());
    let g2_fd = FdG2SwaptionEngine::from_config(g2, &config)
        .unwrap()
        .calculate(&args)
        .unwrap()
        .npv;
    assert_abs_diff_eq!(g2_fd, hw_fd, epsilon = 3e-2);
}
