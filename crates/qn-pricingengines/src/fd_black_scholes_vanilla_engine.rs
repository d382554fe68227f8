//! Finite-difference engine for vanilla options under Black-Scholes,
//! optionally with local volatility.

use crate::config::EngineConfig;
use crate::instruments::VanillaOptionArgs;
use crate::results::{OptionResults, PricingEngine};
use qn_core::{ensure, errors::Result, Real, Size};
use qn_methods::finite_differences::{
    FdmBlackScholesMesher, FdmBlackScholesSolver, FdmBoundaryConditionSet, FdmLogInnerValue,
    FdmMesher, FdmMesherComposite, FdmSchemeDesc, FdmSolverDesc, FdmStepConditionComposite,
};
use qn_processes::GeneralizedBlackScholesProcess;
use std::sync::Arc;
use tracing::debug;

/// European, American and Bermudan vanilla options on a log-spot grid
/// concentrated at the strike.
#[derive(Debug, Clone)]
pub struct FdBlackScholesVanillaEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
    t_grid: Size,
    x_grid: Size,
    damping_steps: Size,
    scheme: FdmSchemeDesc,
    local_vol: bool,
    illegal_local_vol_overwrite: Option<Real>,
}

impl FdBlackScholesVanillaEngine {
    /// Engine with `t_grid` time steps (the first `damping_steps` implicit)
    /// and `x_grid` spot points.
    pub fn new(
        process: Arc<GeneralizedBlackScholesProcess>,
        t_grid: Size,
        x_grid: Size,
        damping_steps: Size,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        ensure!(t_grid > 0, "at least one time step required");
        ensure!(x_grid >= 3, "at least three spot points required, got {x_grid}");
        ensure!(
            damping_steps <= t_grid,
            "{damping_steps} damping steps exceed {t_grid} time steps"
        );
        scheme.validate()?;
        Ok(Self {
            process,
            t_grid,
            x_grid,
            damping_steps,
            scheme,
            local_vol: false,
            illegal_local_vol_overwrite: None,
        })
    }

    /// Engine with the grid and scheme of `config.fd`.
    pub fn from_config(
        process: Arc<GeneralizedBlackScholesProcess>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let fd = &config.fd;
        Self::new(process, fd.t_grid, fd.x_grid, fd.damping_steps, fd.scheme)
    }

    /// Diffuse with the process's local volatility; where it is not a
    /// positive number, `illegal_local_vol_overwrite` is used instead if
    /// given.
    pub fn with_local_vol(mut self, illegal_local_vol_overwrite: Option<Real>) -> Result<Self> {
        ensure!(
            self.process.local_volatility().is_some(),
            "process carries no local volatility surface"
        );
        self.local_vol = true;
        self.illegal_local_vol_overwrite = illegal_local_vol_overwrite;
        Ok(self)
    }
}

impl PricingEngine<VanillaOptionArgs> for FdBlackScholesVanillaEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        let maturity = args.exercise.last_time();
        ensure!(maturity > 0.0, "option already expired");
        let strike = args.strike();

        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
            FdmBlackScholesMesher::with_concentration(
                self.x_grid,
                &self.process,
                maturity,
                strike,
                1e-4,
                1.5,
                Some((strike, 0.1)),
            )?,
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
            exercise = ?args.exercise.exercise_type(),
            t_grid = self.t_grid,
            x_grid = self.x_grid,
            local_vol = self.local_vol,
            "fd black-scholes vanilla"
        );
        let solver = FdmBlackScholesSolver::new(
            Arc::clone(&self.process),
            strike,
            desc,
            self.scheme,
            self.local_vol,
            self.illegal_local_vol_overwrite,
        )?;

        let spot = self.process.spot();
        Ok(OptionResults {
            value: solver.value_at(spot),
            delta: Some(solver.delta_at(spot)),
            gamma: Some(solver.gamma_at(spot)),
            theta: Some(solver.theta_at(spot)?),
            error_estimate: None,
        })
    }
}
