//! Least-squares Monte Carlo for early exercise.
//!
//! The pricer runs in two phases. While calibrating it only stores the
//! paths it is shown and prices them at zero. [`calibrate`] then walks
//! backwards over the exercise dates, regressing discounted future cash
//! flows on a basis of functions of the state over the in-the-money
//! paths. Afterwards every path is priced by exercising as soon as the
//! exercise value beats the regressed continuation value.
//!
//! [`calibrate`]: LongstaffSchwartzPathPricer::calibrate

use super::model::PathPricer;
use super::path::Path;
use crate::lattice::TimeGrid;
use qn_core::{ensure, errors::Result, DiscountFactor, Error, Payoff, Real};
use qn_math::linear_least_squares::LinearLeastSquaresRegression;
use qn_math::Array;
use qn_termstructures::YieldTermStructure;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A regression basis function of the exercise state.
pub type BasisFunction = Box<dyn Fn(&Array) -> Real + Send + Sync>;

/// Exercise payoff and regression state of an early-exercise product.
pub trait EarlyExercisePathPricer<P>: Send + Sync {
    /// Undiscounted exercise value at point `t` of `path`.
    fn exercise_value(&self, path: &P, t: usize) -> Real;

    /// Regression variables at point `t` of `path`.
    fn state(&self, path: &P, t: usize) -> Array;

    /// Functions of the state spanning the continuation value.
    fn basis_system(&self) -> Vec<BasisFunction>;
}

/// Monomials `1, x, …, x^order` of the first state variable.
pub fn monomial_basis(order: usize) -> Vec<BasisFunction> {
    (0..=order)
        .map(|k| {
            let power = k as i32;
            Box::new(move |x: &Array| x[0].powi(power)) as BasisFunction
        })
        .collect()
}

// ─── American payoff on a scalar path ─────────────────────────────────────────

/// Exercise of a payoff on the path value, regressed on monomials of the
/// value scaled by `scaling` plus the payoff itself.
#[derive(Debug, Clone)]
pub struct AmericanPathPricer {
    payoff: Arc<dyn Payoff>,
    scaling: Real,
    polynomial_order: usize,
}

impl AmericanPathPricer {
    /// Pricer for `payoff`; `scaling` is typically the strike.
    pub fn new(payoff: Arc<dyn Payoff>, scaling: Real, polynomial_order: usize) -> Result<Self> {
        ensure!(scaling > 0.0, "scaling must be positive, got {scaling}");
        ensure!(
            polynomial_order <= 6,
            "polynomial order {polynomial_order} too high for a stable regression"
        );
        Ok(Self {
            payoff,
            scaling,
            polynomial_order,
        })
    }
}

impl EarlyExercisePathPricer<Path> for AmericanPathPricer {
    fn exercise_value(&self, path: &Path, t: usize) -> Real {
        self.payoff.value(path[t])
    }

    fn state(&self, path: &Path, t: usize) -> Array {
        Array::from_element(1, path[t] / self.scaling)
    }

    fn basis_system(&self) -> Vec<BasisFunction> {
        let mut basis = monomial_basis(self.polynomial_order);
        let payoff = Arc::clone(&self.payoff);
        let scaling = self.scaling;
        basis.push(Box::new(move |x: &Array| payoff.value(x[0] * scaling) / scaling));
        basis
    }
}

// ─── LongstaffSchwartzPathPricer ──────────────────────────────────────────────

/// Path pricer for early-exercise products by least-squares regression.
pub struct LongstaffSchwartzPathPricer<P> {
    calibration_phase: bool,
    pricer: Box<dyn EarlyExercisePathPricer<P>>,
    basis: Vec<BasisFunction>,
    coefficients: Vec<Array>,
    step_discounts: Vec<DiscountFactor>,
    paths: Mutex<Vec<P>>,
}

impl<P: Clone + Send> LongstaffSchwartzPathPricer<P> {
    /// Pricer over `time_grid`, every grid point after zero being an
    /// exercise opportunity, discounting on `discount_curve`.
    pub fn new(
        time_grid: &TimeGrid,
        pricer: Box<dyn EarlyExercisePathPricer<P>>,
        discount_curve: &dyn YieldTermStructure,
    ) -> Result<Self> {
        ensure!(time_grid.steps() > 0, "time grid without steps");
        let step_discounts = (0..time_grid.steps())
            .map(|i| {
                discount_curve.discount(time_grid.time(i + 1))
                    / discount_curve.discount(time_grid.time(i))
            })
            .collect();
        let basis = pricer.basis_system();
        ensure!(!basis.is_empty(), "empty regression basis");
        Ok(Self {
            calibration_phase: true,
            pricer,
            basis,
            coefficients: vec![Array::zeros(0); time_grid.steps().saturating_sub(1)],
            step_discounts,
            paths: Mutex::new(Vec::new()),
        })
    }

    /// Whether paths are still being collected.
    pub fn is_calibrating(&self) -> bool {
        self.calibration_phase
    }

    /// Number of paths collected for calibration so far.
    pub fn calibration_paths(&self) -> usize {
        self.paths.lock().map_or(0, |paths| paths.len())
    }

    fn continuation_value(&self, coefficients: &Array, state: &Array) -> Real {
        self.basis
            .iter()
            .zip(coefficients.iter())
            .map(|(f, c)| c * f(state))
            .sum()
    }

    /// Fit the exercise strategy on the collected paths and switch to the
    /// pricing phase.
    pub fn calibrate(&mut self) -> Result<()> {
        ensure!(self.calibration_phase, "pricer already calibrated");
        let paths = std::mem::take(
            self.paths
                .get_mut()
                .map_err(|_| Error::Runtime("calibration paths poisoned".into()))?,
        );
        ensure!(!paths.is_empty(), "no calibration paths collected");

        let len = self.step_discounts.len() + 1;
        let mut prices: Vec<Real> = paths
            .iter()
            .map(|path| self.pricer.exercise_value(path, len - 1))
            .collect();
        let mut exercise = vec![0.0; paths.len()];

        for i in (1..len - 1).rev() {
            let df = self.step_discounts[i];
            let mut x = Vec::new();
            let mut y = Vec::new();
            for (j, path) in paths.iter().enumerate() {
                exercise[j] = self.pricer.exercise_value(path, i);
                if exercise[j] > 0.0 {
                    x.push(self.pricer.state(path, i));
                    y.push(df * prices[j]);
                }
            }

            let coefficients = if self.basis.len() <= x.len() {
                LinearLeastSquaresRegression::new(&x, &y, &self.basis)?
                    .coefficients()
                    .clone()
            } else {
                Array::zeros(self.basis.len())
            };

            let mut in_the_money = x.iter();
            for (price, &ex) in prices.iter_mut().zip(&exercise) {
                *price *= df;
                if ex > 0.0 {
                    let state = in_the_money
                        .next()
                        .ok_or_else(|| Error::Runtime("regression state missing".into()))?;
                    if self.continuation_value(&coefficients, state) < ex {
                        *price = ex;
                    }
                }
            }
            self.coefficients[i - 1] = coefficients;
        }

        self.calibration_phase = false;
        debug!(
            paths = paths.len(),
            exercise_dates = len - 2,
            basis = self.basis.len(),
            "Longstaff-Schwartz calibration done"
        );
        Ok(())
    }
}

impl<P: Clone + Send> PathPricer<P> for LongstaffSchwartzPathPricer<P> {
    fn value(&self, path: &P) -> Real {
        if self.calibration_phase {
            if let Ok(mut paths) = self.paths.lock() {
                paths.push(path.clone());
            }
            return 0.0;
        }

        let len = self.step_discounts.len() + 1;
        let mut price = self.pricer.exercise_value(path, len - 1);
        for i in (1..len - 1).rev() {
            price *= self.step_discounts[i];
            let ex = self.pricer.exercise_value(path, i);
            if ex > 0.0 {
                let state = self.pricer.state(path, i);
                if self.continuation_value(&self.coefficients[i - 1], &state) < ex {
                    price = ex;
                }
            }
        }
        price * self.step_discounts[0]
    }
}

impl<P> std::fmt::Debug for LongstaffSchwartzPathPricer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongstaffSchwartzPathPricer")
            .field("calibration_phase", &self.calibration_phase)
            .field("basis", &self.basis.len())
            .field("step_discounts", &self.step_discounts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::{MonteCarloModel, PathGenerator};
    use qn_core::{OptionType, PlainVanillaPayoff};
    use qn_processes::GeneralizedBlackScholesProcess;
    use qn_termstructures::{BlackConstantVol, FlatForward};

    #[test]
    fn monomials_evaluate_powers() {
        let basis = monomial_basis(3);
        let x = Array::from_element(1, 2.0);
        let values: Vec<Real> = basis.iter().map(|f| f(&x)).collect();
        assert_eq!(values, vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn american_put_beats_european_and_matches_the_classic_value() {
        // S = 36, K = 40, r = 6%, σ = 20%, T = 1: American put ≈ 4.478
        let curve = Arc::new(FlatForward::new(0.06));
        let process = Arc::new(GeneralizedBlackScholesProcess::new(
            36.0,
            curve.clone(),
            Arc::new(FlatForward::new(0.0)),
            Arc::new(BlackConstantVol::new(0.2)),
        ));
        let grid = TimeGrid::new(1.0, 50).unwrap();
        let payoff = Arc::new(PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap());
        let exercise = AmericanPathPricer::new(payoff, 40.0, 2).unwrap();
        let pricer =
            LongstaffSchwartzPathPricer::new(&grid, Box::new(exercise), curve.as_ref()).unwrap();
        let generator = PathGenerator::new(process, grid, 2024).unwrap();

        let mut model = MonteCarloModel::new(generator, pricer, true);
        model.add_samples(4096);
        assert_eq!(model.pricer().calibration_paths(), 8192);
        model.pricer_mut().calibrate().unwrap();
        assert!(!model.pricer().is_calibrating());
        model.reset_statistics();
        model.add_samples(16_384);

        let value = model.statistics().mean().unwrap();
        assert!(value > 3.85, "{value}");
        assert!((value - 4.478).abs() < 0.1, "{value}");
    }

    #[test]
    fn calibration_needs_paths() {
        let grid = TimeGrid::new(1.0, 4).unwrap();
        let payoff = Arc::new(PlainVanillaPayoff::new(OptionType::Put, 1.0).unwrap());
        let exercise = AmericanPathPricer::new(payoff, 1.0, 1).unwrap();
        let curve = FlatForward::new(0.0);
        let mut pricer =
            LongstaffSchwartzPathPricer::<Path>::new(&grid, Box::new(exercise), &curve).unwrap();
        assert!(pricer.calibrate().is_err());
    }
}
