use super::{Fdm1DimSolver, FdmSolverDesc};
use crate::finite_differences::operators::FdmBlackScholesOp;
use crate::finite_differences::schemes::FdmSchemeDesc;
use qn_core::{errors::Result, Real};
use qn_processes::GeneralizedBlackScholesProcess;
use std::sync::Arc;

/// Black-Scholes PDE on a log-spot grid, read back in spot.
#[derive(Debug)]
pub struct FdmBlackScholesSolver {
    solver: Fdm1DimSolver,
}

impl FdmBlackScholesSolver {
    /// Solve for `process`; `strike` selects the Black volatility unless
    /// `local_vol` is set.
    pub fn new(
        process: Arc<GeneralizedBlackScholesProcess>,
        strike: Real,
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        local_vol: bool,
        illegal_local_vol_overwrite: Option<Real>,
    ) -> Result<Self> {
        let op = FdmBlackScholesOp::new(
            Arc::clone(&desc.mesher),
            process,
            strike,
            local_vol,
            illegal_local_vol_overwrite,
            0,
        );
        let solver = Fdm1DimSolver::new(desc, scheme, Box::new(op))?;
        Ok(Self { solver })
    }

    /// The underlying log-spot solver.
    pub fn solver(&self) -> &Fdm1DimSolver {
        &self.solver
    }

    /// Value at spot `s`.
    pub fn value_at(&self, s: Real) -> Real {
        self.solver.interpolate_at(s.ln())
    }

    /// `∂V/∂S`.
    pub fn delta_at(&self, s: Real) -> Real {
        self.solver.derivative_x(s.ln()) / s
    }

    /// `∂²V/∂S²`.
    pub fn gamma_at(&self, s: Real) -> Real {
        let x = s.ln();
        (self.solver.derivative_xx(x) - self.solver.derivative_x(x)) / (s * s)
    }

    /// `∂V/∂t`.
    pub fn theta_at(&self, s: Real) -> Result<Real> {
        self.solver.theta_at(s.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{
        FdmBlackScholesMesher, FdmBoundaryConditionSet, FdmLogInnerValue, FdmMesher,
        FdmMesherComposite, FdmStepConditionComposite,
    };
    use approx::assert_abs_diff_eq;
    use qn_core::{
        exercise::Exercise,
        payoff::{OptionType, PlainVanillaPayoff},
    };
    use qn_math::{black_formula, normal_cdf};
    use qn_termstructures::{BlackConstantVol, FlatForward};

    fn solve(
        option_type: OptionType,
        exercise: &Exercise,
        scheme: FdmSchemeDesc,
    ) -> FdmBlackScholesSolver {
        let process = Arc::new(GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            Arc::new(BlackConstantVol::new(0.2)),
        ));
        let maturity = exercise.last_time();
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
            FdmBlackScholesMesher::new(200, &process, maturity, 100.0, 1e-4, 1.5).unwrap(),
        ));
        let payoff = Arc::new(PlainVanillaPayoff::new(option_type, 100.0).unwrap());
        let calculator = Arc::new(FdmLogInnerValue::new(payoff, Arc::clone(&mesher), 0));
        let desc = FdmSolverDesc {
            condition: FdmStepConditionComposite::vanilla_composite(
                exercise,
                calculator.clone(),
                Arc::clone(&mesher),
            ),
            mesher,
            bc_set: FdmBoundaryConditionSet::new(),
            calculator,
            maturity,
            time_steps: 100,
            damping_steps: 0,
        };
        FdmBlackScholesSolver::new(process, 100.0, desc, scheme, false, None).unwrap()
    }

    #[test]
    fn european_call_matches_black_scholes() {
        let exercise = Exercise::european(1.0).unwrap();
        let solver = solve(OptionType::Call, &exercise, FdmSchemeDesc::douglas());
        let (df, fwd, sd): (Real, Real, Real) = ((-0.05_f64).exp(), 100.0 * (0.03_f64).exp(), 0.2);
        let expected = black_formula(OptionType::Call, 100.0, fwd, sd, df);
        assert_abs_diff_eq!(solver.value_at(100.0), expected, epsilon = 2e-2);

        let d1 = ((fwd / 100.0).ln() + 0.5 * sd * sd) / sd;
        let delta = (-0.02_f64).exp() * normal_cdf(d1);
        assert_abs_diff_eq!(solver.delta_at(100.0), delta, epsilon = 2e-3);
        let gamma = (-0.02_f64).exp() * qn_math::normal_pdf(d1) / (100.0 * sd);
        assert_abs_diff_eq!(solver.gamma_at(100.0), gamma, epsilon = 1e-3);
        assert!(solver.theta_at(100.0).unwrap() < 0.0);
    }

    #[test]
    fn american_put_carries_an_early_exercise_premium() {
        let american = solve(
            OptionType::Put,
            &Exercise::american(0.0, 1.0).unwrap(),
            FdmSchemeDesc::crank_nicolson(),
        );
        let european = solve(
            OptionType::Put,
            &Exercise::european(1.0).unwrap(),
            FdmSchemeDesc::crank_nicolson(),
        );
        let (a, e) = (american.value_at(100.0), european.value_at(100.0));
        assert!(a > e + 0.05, "american {a} vs european {e}");
        // deep in the money the american put is worth its exercise value
        assert_abs_diff_eq!(american.value_at(60.0), 40.0, epsilon = 1e-2);
    }
}
