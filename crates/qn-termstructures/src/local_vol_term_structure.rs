//! `LocalVolTermStructure`, local volatility `σ(t, S)`.

use crate::black_vol_term_structure::BlackVarianceCurve;
use crate::term_structure::TermStructure;
use qn_core::{Real, Time, Volatility};
use std::sync::Arc;

/// A local volatility surface.
pub trait LocalVolTermStructure: TermStructure {
    /// Local volatility at time `t` and underlying level `underlying`.
    fn local_vol(&self, t: Time, underlying: Real) -> Volatility;
}

/// Flat local volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConstantVol {
    volatility: Volatility,
}

impl LocalConstantVol {
    /// Constant local volatility.
    pub fn new(volatility: Volatility) -> Self {
        Self { volatility }
    }
}

impl TermStructure for LocalConstantVol {}

impl LocalVolTermStructure for LocalConstantVol {
    fn local_vol(&self, _t: Time, _underlying: Real) -> Volatility {
        self.volatility
    }
}

/// Local volatility implied by a strike-independent variance curve: the
/// instantaneous forward volatility `sqrt(∂(σ²t)/∂t)`.
#[derive(Debug, Clone)]
pub struct LocalVolCurve {
    curve: Arc<BlackVarianceCurve>,
}

impl LocalVolCurve {
    /// Local vol from `curve`.
    pub fn new(curve: Arc<BlackVarianceCurve>) -> Self {
        Self { curve }
    }
}

impl TermStructure for LocalVolCurve {
    fn max_time(&self) -> Time {
        self.curve.max_time()
    }
}

impl LocalVolTermStructure for LocalVolCurve {
    fn local_vol(&self, t: Time, _underlying: Real) -> Volatility {
        self.curve.instantaneous_variance(t).max(0.0).sqrt()
    }
}
