//! One-dimensional meshers.
//!
//! # Overview
//!
//! * [`Fdm1dMesher`]: sorted grid locations with forward (`dplus`) and
//!   backward (`dminus`) spacings
//! * [`Uniform1dMesher`], [`Concentrating1dMesher`]: generic grids
//! * [`FdmBlackScholesMesher`]: log-spot grid covering the forward range
//! * [`FdmHestonVarianceMesher`]: variance grid from the square-root
//!   process distribution at maturity
//! * [`FdmSimpleProcess1dMesher`]: quantile grid of any 1-D process, used
//!   for short-rate state variables

use qn_core::{ensure, errors::Result, Real, Size, Time};
use qn_math::{brent, inverse_cumulative_normal};
use qn_processes::{GeneralizedBlackScholesProcess, HestonProcess, StochasticProcess1D};
use qn_termstructures::BlackVolTermStructure;
use statrs::distribution::{ContinuousCDF, Gamma};
use std::ops::Deref;
use tracing::debug;

/// Grid locations along one direction.
///
/// `dplus(i) = x[i+1] − x[i]` and `dminus(i) = x[i] − x[i−1]`; both are
/// `NaN` where the neighbour does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Fdm1dMesher {
    locations: Vec<Real>,
    dplus: Vec<Real>,
    dminus: Vec<Real>,
}

impl Fdm1dMesher {
    /// Mesher over strictly increasing `locations`.
    pub fn from_locations(locations: Vec<Real>) -> Result<Self> {
        ensure!(locations.len() >= 2, "a mesher needs at least two points");
        ensure!(
            locations.windows(2).all(|w| w[1] > w[0]),
            "mesher locations must be strictly increasing"
        );
        Ok(Self::from_sorted(locations))
    }

    fn from_sorted(locations: Vec<Real>) -> Self {
        let n = locations.len();
        let mut dplus = vec![Real::NAN; n];
        let mut dminus = vec![Real::NAN; n];
        for i in 0..n - 1 {
            dplus[i] = locations[i + 1] - locations[i];
            dminus[i + 1] = dplus[i];
        }
        Self {
            locations,
            dplus,
            dminus,
        }
    }

    /// Number of points.
    pub fn size(&self) -> Size {
        self.locations.len()
    }

    /// All grid locations.
    pub fn locations(&self) -> &[Real] {
        &self.locations
    }

    /// Location of point `i`.
    pub fn location(&self, i: Size) -> Real {
        self.locations[i]
    }

    /// Distance to the next point.
    pub fn dplus(&self, i: Size) -> Real {
        self.dplus[i]
    }

    /// Distance to the previous point.
    pub fn dminus(&self, i: Size) -> Real {
        self.dminus[i]
    }
}

macro_rules! mesher_newtype {
    ($name:ident) => {
        impl Deref for $name {
            type Target = Fdm1dMesher;

            fn deref(&self) -> &Fdm1dMesher {
                &self.0
            }
        }

        impl From<$name> for Fdm1dMesher {
            fn from(m: $name) -> Fdm1dMesher {
                m.0
            }
        }
    };
}

// ── Uniform ──────────────────────────────────────────────────────────────────

/// Equally spaced points from `start` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform1dMesher(Fdm1dMesher);

impl Uniform1dMesher {
    /// `size` points covering `[start, end]`.
    pub fn new(start: Real, end: Real, size: Size) -> Result<Self> {
        ensure!(end > start, "end {end} must be larger than start {start}");
        ensure!(size >= 2, "a mesher needs at least two points");
        let dx = (end - start) / (size - 1) as Real;
        let mut locations: Vec<Real> = (0..size).map(|i| start + i as Real * dx).collect();
        locations[size - 1] = end;
        Ok(Self(Fdm1dMesher::from_sorted(locations)))
    }
}

mesher_newtype!(Uniform1dMesher);

// ── Concentrating ────────────────────────────────────────────────────────────

/// Points concentrated around a given location by a sinh transform.
///
/// `density` is relative to the interval width; smaller values concentrate
/// more strongly.
#[derive(Debug, Clone, PartialEq)]
pub struct Concentrating1dMesher(Fdm1dMesher);

impl Concentrating1dMesher {
    /// `size` points on `[start, end]` concentrated at `c_point`. With
    /// `require_c_point` the point closest to `c_point` is moved onto it.
    pub fn new(
        start: Real,
        end: Real,
        size: Size,
        c_point: Real,
        density: Real,
        require_c_point: bool,
    ) -> Result<Self> {
        ensure!(end > start, "end {end} must be larger than start {start}");
        ensure!(size >= 2, "a mesher needs at least two points");
        ensure!(density > 0.0, "density must be positive, got {density}");
        ensure!(
            c_point >= start && c_point <= end,
            "concentration point {c_point} outside [{start}, {end}]"
        );

        let scale = density * (end - start);
        let c1 = ((start - c_point) / scale).asinh();
        let c2 = ((end - c_point) / scale).asinh();
        let n = (size - 1) as Real;
        let mut locations: Vec<Real> = (0..size)
            .map(|i| {
                let li = i as Real / n;
                c_point + scale * (c1 * (1.0 - li) + c2 * li).sinh()
            })
            .collect();
        locations[0] = start;
        locations[size - 1] = end;

        if require_c_point {
            let closest = (0..size)
                .min_by(|&a, &b| {
                    (locations[a] - c_point)
                        .abs()
                        .total_cmp(&(locations[b] - c_point).abs())
                })
                .unwrap_or(0);
            if closest > 0 && closest < size - 1 {
                locations[closest] = c_point;
            }
        }
        Ok(Self(Fdm1dMesher::from_locations(locations)?))
    }
}

mesher_newtype!(Concentrating1dMesher);

// ── Black-Scholes ────────────────────────────────────────────────────────────

/// Log-spot mesher for a Black-Scholes process.
///
/// The grid spans the range of forwards up to maturity, widened by
/// `scale_factor · Φ⁻¹(1 − eps) · σ√T` on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmBlackScholesMesher(Fdm1dMesher);

impl FdmBlackScholesMesher {
    /// Uniform log-spot grid.
    pub fn new(
        size: Size,
        process: &GeneralizedBlackScholesProcess,
        maturity: Time,
        strike: Real,
        eps: Real,
        scale_factor: Real,
    ) -> Result<Self> {
        Self::with_concentration(size, process, maturity, strike, eps, scale_factor, None)
    }

    /// Log-spot grid, optionally concentrated at the spot level
    /// `concentration.0` with relative density `concentration.1`.
    pub fn with_concentration(
        size: Size,
        process: &GeneralizedBlackScholesProcess,
        maturity: Time,
        strike: Real,
        eps: Real,
        scale_factor: Real,
        concentration: Option<(Real, Real)>,
    ) -> Result<Self> {
        ensure!(maturity > 0.0, "maturity must be positive, got {maturity}");
        ensure!(eps > 0.0 && eps < 0.5, "eps must be in (0, 0.5), got {eps}");
        let spot = process.spot();
        ensure!(spot > 0.0, "negative or null underlying given");

        let intermediate_steps = ((24.0 * maturity) as Size).max(2);
        let (mut lo, mut hi) = (spot, spot);
        for i in 1..=intermediate_steps {
            let t = maturity * i as Real / intermediate_steps as Real;
            let fwd = process.forward(t);
            lo = lo.min(fwd);
            hi = hi.max(fwd);
        }

        let sigma_sqrt_t = process
            .black_volatility()
            .black_forward_vol(0.0, maturity, strike)
            * maturity.sqrt();
        let width = sigma_sqrt_t * inverse_cumulative_normal(1.0 - eps) * scale_factor;
        let x_min = lo.ln() - width;
        let x_max = hi.ln() + width;
        debug!(size, x_min, x_max, "black-scholes mesher");

        let mesher = match concentration {
            Some((s, density)) if s > 0.0 && s.ln() > x_min && s.ln() < x_max => {
                Concentrating1dMesher::new(x_min, x_max, size, s.ln(), density, true)?.into()
            }
            _ => Uniform1dMesher::new(x_min, x_max, size)?.into(),
        };
        Ok(Self(mesher))
    }
}

mesher_newtype!(FdmBlackScholesMesher);

// ── Heston variance ──────────────────────────────────────────────────────────

/// Variance mesher for the Heston model.
///
/// The upper bound is the `1 − eps` quantile of the variance at maturity,
/// approximated by the moment-matched gamma distribution of the
/// square-root process; points are concentrated around `v0`, which lies on
/// the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmHestonVarianceMesher(Fdm1dMesher);

impl FdmHestonVarianceMesher {
    /// Variance grid with `size` points.
    pub fn new(size: Size, process: &HestonProcess, maturity: Time, eps: Real) -> Result<Self> {
        ensure!(maturity > 0.0, "maturity must be positive, got {maturity}");
        ensure!(size >= 3, "variance mesher needs at least three points");
        let (v0, kappa) = (process.v0(), process.kappa());
        let (theta, sigma) = (process.theta(), process.sigma());

        let e = (-kappa * maturity).exp();
        let mean = theta + (v0 - theta) * e;
        let variance = v0 * sigma * sigma * e * (1.0 - e) / kappa
            + theta * sigma * sigma * (1.0 - e) * (1.0 - e) / (2.0 * kappa);

        let fallback = || {
            let vol = sigma * (theta / (2.0 * kappa)).sqrt();
            (v0 + 4.0 * vol).max(theta + 4.0 * vol)
        };
        let upper = if variance > 0.0 && mean > 0.0 {
            let shape = mean * mean / variance;
            let rate = mean / variance;
            match Gamma::new(shape, rate) {
                Ok(gamma) => {
                    let target = 1.0 - eps;
                    let hi = mean + 50.0 * variance.sqrt();
                    brent(|v| gamma.cdf(v) - target, 0.0, hi, 1e-10)
                        .map(|q| q.max(v0))
                        .unwrap_or_else(|_| fallback())
                }
                Err(_) => fallback(),
            }
        } else {
            fallback()
        };
        let upper = upper.max(1.5 * v0).max(1e-4);
        debug!(size, upper, mean, "heston variance mesher");

        let mesher = if v0 > 0.0 && v0 < upper {
            Concentrating1dMesher::new(0.0, upper, size, v0, 0.1, true)?.into()
        } else {
            Uniform1dMesher::new(0.0, upper, size)?.into()
        };
        Ok(Self(mesher))
    }
}

mesher_newtype!(FdmHestonVarianceMesher);

// ── Simple process ───────────────────────────────────────────────────────────

/// Quantile mesher for a one-dimensional process.
///
/// Locations are the quantiles `eps … 1 − eps` of the process started at
/// `x0`, averaged over `t_avg_steps` horizons up to maturity; `x0` (or the
/// given mandatory point) always lies inside the range.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmSimpleProcess1dMesher(Fdm1dMesher);

impl FdmSimpleProcess1dMesher {
    /// Mesher with `size` points.
    pub fn new(
        size: Size,
        process: &dyn StochasticProcess1D,
        maturity: Time,
        t_avg_steps: Size,
        eps: Real,
        mandatory_point: Option<Real>,
    ) -> Result<Self> {
        ensure!(size >= 2, "a mesher needs at least two points");
        ensure!(maturity > 0.0, "maturity must be positive, got {maturity}");
        ensure!(t_avg_steps > 0, "at least one averaging step required");
        ensure!(eps > 0.0 && eps < 0.5, "eps must be in (0, 0.5), got {eps}");

        let x0 = process.x0();
        let mp = mandatory_point.unwrap_or(x0);
        let mut locations = vec![0.0; size];
        for l in 1..=t_avg_steps {
            let t = maturity * l as Real / t_avg_steps as Real;
            let q_min = mp
                .min(x0)
                .min(process.evolve_1d(0.0, x0, t, inverse_cumulative_normal(eps)));
            let q_max = mp
                .max(x0)
                .max(process.evolve_1d(0.0, x0, t, inverse_cumulative_normal(1.0 - eps)));
            let dp = (1.0 - 2.0 * eps) / (size - 1) as Real;
            let mut p = eps;
            locations[0] += q_min;
            for loc in locations.iter_mut().take(size - 1).skip(1) {
                p += dp;
                *loc += process.evolve_1d(0.0, x0, t, inverse_cumulative_normal(p));
            }
            locations[size - 1] += q_max;
        }
        for loc in &mut locations {
            *loc /= t_avg_steps as Real;
        }
        Ok(Self(Fdm1dMesher::from_locations(locations)?))
    }
}

mesher_newtype!(FdmSimpleProcess1dMesher);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_processes::OrnsteinUhlenbeckProcess;
    use qn_termstructures::{BlackConstantVol, FlatForward};
    use std::sync::Arc;

    #[test]
    fn uniform_spacing() {
        let m = Uniform1dMesher::new(-1.0, 1.0, 5).unwrap();
        assert_eq!(m.size(), 5);
        assert_abs_diff_eq!(m.dplus(0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(m.dminus(4), 0.5, epsilon = 1e-15);
        assert!(m.dminus(0).is_nan());
        assert!(m.dplus(4).is_nan());
    }

    #[test]
    fn concentrating_mesher_is_denser_at_the_point() {
        let m = Concentrating1dMesher::new(0.0, 10.0, 51, 3.0, 0.05, true).unwrap();
        assert!(m.locations().contains(&3.0));
        let i = m.locations().iter().position(|&x| x == 3.0).unwrap();
        assert!(m.dplus(i) < m.dplus(0));
        assert!(m.dplus(i) < m.dminus(50));
        assert_eq!(m.location(0), 0.0);
        assert_eq!(m.location(50), 10.0);
    }

    #[test]
    fn black_scholes_mesher_brackets_the_spot() {
        let process = GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.0)),
            Arc::new(BlackConstantVol::new(0.2)),
        );
        let m = FdmBlackScholesMesher::new(101, &process, 1.0, 100.0, 1e-4, 1.5).unwrap();
        let x = 100.0_f64.ln();
        assert!(m.location(0) < x - 1.0);
        assert!(m.location(100) > x + 1.0);
        let c = FdmBlackScholesMesher::with_concentration(
            101,
            &process,
            1.0,
            100.0,
            1e-4,
            1.5,
            Some((100.0, 0.1)),
        )
        .unwrap();
        assert!(c.locations().iter().any(|&l| (l - x).abs() < 1e-14));
    }

    #[test]
    fn simple_process_mesher_contains_x0() {
        let ou = OrnsteinUhlenbeckProcess::new(0.1, 0.01, 0.0, 0.0);
        let m = FdmSimpleProcess1dMesher::new(41, &ou, 5.0, 10, 1e-4, None).unwrap();
        assert!(m.location(0) < 0.0 && m.location(40) > 0.0);
        // symmetric process, symmetric grid
        assert_abs_diff_eq!(m.location(0), -m.location(40), epsilon = 1e-12);
    }
}
