//! Finite-difference engines for swaptions under Hull-White and G2++.
//!
//! The state grids are quantile meshers of the model's driftless
//! Ornstein-Uhlenbeck factors; today's state is the origin. At each
//! exercise time the option is worth at least the swap over the coupons
//! resetting from then on, valued with the model's closed-form bonds.

use crate::config::EngineConfig;
use crate::instruments::SwaptionArgs;
use crate::results::{PricingEngine, PricingResults};
use qn_core::{ensure, errors::Result, Real, Size, Time};
use qn_methods::finite_differences::{
    FdmAffineSwapInnerValue, FdmBoundaryConditionSet, FdmG2Solver, FdmHullWhiteSolver, FdmMesher,
    FdmMesherComposite, FdmSchemeDesc, FdmSimpleProcess1dMesher, FdmSolverDesc,
    FdmStepConditionComposite,
};
use qn_models::{HullWhite, G2};
use qn_processes::OrnsteinUhlenbeckProcess;
use std::sync::Arc;
use tracing::debug;

const INV_EPS: Real = 1e-5;

fn swaption_maturity(args: &SwaptionArgs) -> Result<Time> {
    let maturity = args.exercise.last_time();
    ensure!(maturity > 0.0, "swaption already expired");
    ensure!(
        maturity < args.end_time(),
        "last exercise at {maturity} on or after the swap's end {}",
        args.end_time()
    );
    Ok(maturity)
}

fn check_grid(
    t_grid: Size,
    x_grid: Size,
    damping_steps: Size,
    scheme: &FdmSchemeDesc,
) -> Result<()> {
    ensure!(t_grid > 0, "at least one time step required");
    ensure!(x_grid >= 3, "at least three state points required, got {x_grid}");
    ensure!(
        damping_steps <= t_grid,
        "{damping_steps} damping steps exceed {t_grid} time steps"
    );
    scheme.validate()
}

fn state_mesher(
    size: Size,
    speed: Real,
    volatility: Real,
    maturity: Time,
) -> Result<FdmSimpleProcess1dMesher> {
    let process = OrnsteinUhlenbeckProcess::new(speed, volatility, 0.0, 0.0);
    FdmSimpleProcess1dMesher::new(size, &process, maturity, 1, INV_EPS, None)
}

// ── Hull-White ───────────────────────────────────────────────────────────────

/// Swaptions on the Hull-White state `x = r − α(t)`.
#[derive(Debug, Clone)]
pub struct FdHullWhiteSwaptionEngine {
    model: Arc<HullWhite>,
    t_grid: Size,
    x_grid: Size,
    damping_steps: Size,
    scheme: FdmSchemeDesc,
}

impl FdHullWhiteSwaptionEngine {
    /// Engine with `t_grid` time steps and `x_grid` state points.
    pub fn new(
        model: Arc<HullWhite>,
        t_grid: Size,
        x_grid: Size,
        damping_steps: Size,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        check_grid(t_grid, x_grid, damping_steps, &scheme)?;
        Ok(Self {
            model,
            t_grid,
            x_grid,
            damping_steps,
            scheme,
        })
    }

    /// Engine with the grid and scheme of `config.fd`.
    pub fn from_config(model: Arc<HullWhite>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let fd = &config.fd;
        Self::new(model, fd.t_grid, fd.x_grid, fd.damping_steps, fd.scheme)
    }
}

impl PricingEngine<SwaptionArgs> for FdHullWhiteSwaptionEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &SwaptionArgs) -> Result<PricingResults> {
        let maturity = swaption_maturity(args)?;
        let model = &self.model;
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(state_mesher(
            self.x_grid,
            model.mean_reversion(),
            model.sigma(),
            maturity,
        )?));
        let calculator = Arc::new(FdmAffineSwapInnerValue::new(
            Arc::clone(model),
            args.swap_type,
            args.legs()?,
            Arc::clone(&mesher),
        ));
        let desc = FdmSolverDesc {
            condition: FdmStepConditionComposite::vanilla_composite(
                &args.exercise,
                calculator.clone(),
                Arc::clone(&mesher),
            ),
            mesher,
            bc_set: FdmBoundaryConditionSet::new(),
            calculator,
            maturity,
            time_steps: self.t_grid,
            damping_steps: self.damping_steps,
        };
        debug!(x_grid = self.x_grid, t_grid = self.t_grid, maturity, "fd hull-white swaption");
        let solver = FdmHullWhiteSolver::new(&model.process(), desc, self.scheme)?;
        Ok(PricingResults::from_npv(solver.value_at(0.0)))
    }
}

// ── G2++ ─────────────────────────────────────────────────────────────────────

/// Swaptions on the two G2++ factors; `y_grid` points along the second.
#[derive(Debug, Clone)]
pub struct FdG2SwaptionEngine {
    model: Arc<G2>,
    t_grid: Size,
    x_grid: Size,
    y_grid: Size,
    damping_steps: Size,
    scheme: FdmSchemeDesc,
}

impl FdG2SwaptionEngine {
    /// Engine on an `x_grid × y_grid` state grid.
    pub fn new(
        model: Arc<G2>,
        t_grid: Size,
        x_grid: Size,
        y_grid: Size,
        damping_steps: Size,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        check_grid(t_grid, x_grid.min(y_grid), damping_steps, &scheme)?;
        Ok(Self {
            model,
            t_grid,
            x_grid,
            y_grid,
            damping_steps,
            scheme,
        })
    }

    /// Engine with the grids and scheme of `config.fd`; the second factor
    /// uses `v_grid` points.
    pub fn from_config(model: Arc<G2>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let fd = &config.fd;
        Self::new(model, fd.t_grid, fd.x_grid, fd.v_grid, fd.damping_steps, fd.scheme)
    }
}

impl PricingEngine<SwaptionArgs> for FdG2SwaptionEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &SwaptionArgs) -> Result<PricingResults> {
        let maturity = swaption_maturity(args)?;
        let model = &self.model;
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            state_mesher(self.x_grid, model.a(), model.sigma(), maturity)?,
            state_mesher(self.y_grid, model.b(), model.eta(), maturity)?,
        ));
        let calculator = Arc::new(FdmAffineSwapInnerValue::new(
            Arc::clone(model),
            args.swap_type,
            args.legs()?,
            Arc::clone(&mesher),
        ));
        let desc = FdmSolverDesc {
            condition: FdmStepConditionComposite::vanilla_composite(
                &args.exercise,
                calculator.clone(),
                Arc::clone(&mesher),
            ),
            mesher,
            bc_set: FdmBoundaryConditionSet::new(),
            calculator,
            maturity,
            time_steps: self.t_grid,
            damping_steps: self.damping_steps,
        };
        debug!(
            x_grid = self.x_grid,
            y_grid = self.y_grid,
            t_grid = self.t_grid,
            scheme = ?self.scheme.kind,
            "fd g2 swaption"
        );
        let solver = FdmG2Solver::new(&model.process()?, desc, self.scheme)?;
        Ok(PricingResults::from_npv(solver.value_at(0.0, 0.0)))
    }
}
