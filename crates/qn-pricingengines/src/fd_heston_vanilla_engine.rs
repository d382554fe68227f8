//! Finite-difference engine for vanilla options under Heston.

use crate::config::EngineConfig;
use crate::instruments::VanillaOptionArgs;
use crate::results::{OptionResults, PricingEngine};
use qn_core::{ensure, errors::Result, Real, Size, Time};
use qn_methods::finite_differences::{
    FdmBlackScholesMesher, FdmBoundaryConditionSet, FdmHestonSolver, FdmHestonVarianceMesher,
    FdmLogInnerValue, FdmMesher, FdmMesherComposite, FdmSchemeDesc, FdmSolverDesc,
    FdmStepConditionComposite,
};
use qn_processes::{GeneralizedBlackScholesProcess, HestonProcess};
use qn_termstructures::BlackConstantVol;
use std::sync::Arc;
use tracing::debug;

/// Vanilla options on a log-spot × variance grid.
///
/// The spot range is that of a Black-Scholes process whose volatility is
/// the root of the expected average variance up to maturity.
#[derive(Debug, Clone)]
pub struct FdHestonVanillaEngine {
    process: Arc<HestonProcess>,
    t_grid: Size,
    x_grid: Size,
    v_grid: Size,
    damping_steps: Size,
    scheme: FdmSchemeDesc,
}

impl FdHestonVanillaEngine {
    /// Engine with `x_grid` spot and `v_grid` variance points.
    pub fn new(
        process: Arc<HestonProcess>,
        t_grid: Size,
        x_grid: Size,
        v_grid: Size,
        damping_steps: Size,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        ensure!(t_grid > 0, "at least one time step required");
        ensure!(
            x_grid >= 3 && v_grid >= 3,
            "grids need at least three points, got {x_grid} × {v_grid}"
        );
        ensure!(
            damping_steps <= t_grid,
            "{damping_steps} damping steps exceed {t_grid} time steps"
        );
        scheme.validate()?;
        Ok(Self {
            process,
            t_grid,
            x_grid,
            v_grid,
            damping_steps,
            scheme,
        })
    }

    /// Engine with the grids and scheme of `config.fd`.
    pub fn from_config(process: Arc<HestonProcess>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let fd = &config.fd;
        Self::new(process, fd.t_grid, fd.x_grid, fd.v_grid, fd.damping_steps, fd.scheme)
    }

    fn average_variance(&self, maturity: Time) -> Real {
        let p = &self.process;
        let kt = p.kappa() * maturity;
        if kt.abs() < 1e-8 {
            p.v0()
        } else {
            p.theta() + (p.v0() - p.theta()) * (-(-kt).exp_m1()) / kt
        }
    }
}

impl PricingEngine<VanillaOptionArgs> for FdHestonVanillaEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        let maturity = args.exercise.last_time();
        ensure!(maturity > 0.0, "option already expired");
        let strike = args.strike();
        let p = &self.process;

        let vol_estimate = self.average_variance(maturity).max(1e-4).sqrt();
        let proxy = GeneralizedBlackScholesProcess::new(
            p.s0(),
            Arc::clone(p.risk_free_rate()),
            Arc::clone(p.dividend_yield()),
            Arc::new(BlackConstantVol::new(vol_estimate)),
        );
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            FdmBlackScholesMesher::with_concentration(
                self.x_grid,
                &proxy,
                maturity,
                strike,
                1e-4,
                1.5,
                Some((strike, 0.1)),
            )?,
            FdmHestonVarianceMesher::new(self.v_grid, p, maturity, 1e-4)?,
        ));
        let calculator =
            Arc::new(FdmLogInnerValue::new(args.plain_payoff(), Arc::clone(&mesher), 0));
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
            v_grid = self.v_grid,
            t_grid = self.t_grid,
            scheme = ?self.scheme.kind,
            vol_estimate,
            "fd heston vanilla"
        );
        let solver = FdmHestonSolver::new(Arc::clone(p), desc, self.scheme)?;

        let (s0, v0) = (p.s0(), p.v0());
        Ok(OptionResults {
            value: solver.value_at(s0, v0),
            delta: Some(solver.delta_at(s0, v0)),
            gamma: Some(solver.gamma_at(s0, v0)),
            theta: Some(solver.theta_at(s0, v0)?),
            error_estimate: None,
        })
    }
}
