//! Recombining binomial trees for the Black-Scholes process.
//!
//! | Variant | Construction |
//! |---|---|
//! | [`BinomialType::JarrowRudd`] | equal probabilities, drift in the nodes |
//! | [`BinomialType::CoxRossRubinstein`] | equal jumps, drift in the probabilities |
//! | [`BinomialType::AdditiveEqp`] | equal probabilities, additive jumps |
//! | [`BinomialType::Trigeorgis`] | equal jumps, additive |
//! | [`BinomialType::Tian`] | third-moment matching |
//! | [`BinomialType::LeisenReimer`] | Peizer-Pratt inversion, strike-centred |
//! | [`BinomialType::Joshi4`] | fourth-order Joshi probabilities |
//!
//! Trees are built on the log-spot with the carry and total variance of
//! the process up to `end`; the last two variants force an odd number of
//! steps.

use super::Tree;
use qn_core::{ensure, errors::Result, Real, Time};
use qn_processes::GeneralizedBlackScholesProcess;
use qn_termstructures::BlackVolTermStructure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The binomial tree variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BinomialType {
    /// Jarrow-Rudd.
    JarrowRudd,
    /// Cox-Ross-Rubinstein.
    #[default]
    CoxRossRubinstein,
    /// Additive equal probabilities.
    #[serde(rename = "AdditiveEQP")]
    AdditiveEqp,
    /// Trigeorgis.
    Trigeorgis,
    /// Tian.
    Tian,
    /// Leisen-Reimer.
    LeisenReimer,
    /// Joshi, fourth order.
    Joshi4,
}

impl fmt::Display for BinomialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinomialType::JarrowRudd => "JarrowRudd",
            BinomialType::CoxRossRubinstein => "CoxRossRubinstein",
            BinomialType::AdditiveEqp => "AdditiveEQP",
            BinomialType::Trigeorgis => "Trigeorgis",
            BinomialType::Tian => "Tian",
            BinomialType::LeisenReimer => "LeisenReimer",
            BinomialType::Joshi4 => "Joshi4",
        };
        f.write_str(name)
    }
}

/// How node values are laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Nodes {
    /// `x0 exp(i drift + (2 index − i) step)`.
    Additive { drift_per_step: Real, step: Real },
    /// `x0 down^(i − index) up^index`.
    Multiplicative { up: Real, down: Real },
}

/// A recombining binomial tree. Branch 0 is down, branch 1 is up.
#[derive(Debug, Clone, PartialEq)]
pub struct BinomialTree {
    kind: BinomialType,
    x0: Real,
    dt: Time,
    steps: usize,
    nodes: Nodes,
    pu: Real,
    pd: Real,
}

impl BinomialTree {
    /// Build a tree of the given `kind` for `process` up to `end`. The
    /// `strike` is used by the Leisen-Reimer and Joshi variants and for the
    /// Black variance lookup.
    pub fn new(
        kind: BinomialType,
        process: &GeneralizedBlackScholesProcess,
        end: Time,
        steps: usize,
        strike: Real,
    ) -> Result<Self> {
        ensure!(end > 0.0, "tree end time must be positive, got {end}");
        ensure!(steps > 0, "binomial tree needs at least one step");
        let steps = match kind {
            BinomialType::LeisenReimer | BinomialType::Joshi4 => {
                if steps % 2 == 1 {
                    steps
                } else {
                    steps + 1
                }
            }
            _ => steps,
        };
        let x0 = process.spot();
        let dt = end / steps as Real;
        let total_variance = process.black_volatility().black_variance(end, strike);
        ensure!(
            total_variance > 0.0,
            "binomial tree needs positive variance, got {total_variance}"
        );
        let variance = total_variance / steps as Real;
        let drift_per_step = process.carry(0.0, end) * dt - 0.5 * variance;

        let (nodes, pu) = match kind {
            BinomialType::JarrowRudd => (
                Nodes::Additive {
                    drift_per_step,
                    step: variance.sqrt(),
                },
                0.5,
            ),
            BinomialType::CoxRossRubinstein => {
                let dx = variance.sqrt();
                (
                    Nodes::Additive {
                        drift_per_step: 0.0,
                        step: dx,
                    },
                    0.5 + 0.5 * drift_per_step / dx,
                )
            }
            BinomialType::AdditiveEqp => {
                let disc = 4.0 * variance - 3.0 * drift_per_step * drift_per_step;
                ensure!(disc > 0.0, "additive EQP tree: too few steps ({steps})");
                (
                    Nodes::Additive {
                        drift_per_step,
                        step: -0.5 * drift_per_step + 0.5 * disc.sqrt(),
                    },
                    0.5,
                )
            }
            BinomialType::Trigeorgis => {
                let dx = (variance + drift_per_step * drift_per_step).sqrt();
                (
                    Nodes::Additive {
                        drift_per_step: 0.0,
                        step: dx,
                    },
                    0.5 + 0.5 * drift_per_step / dx,
                )
            }
            BinomialType::Tian => {
                let q = variance.exp();
                let r = drift_per_step.exp() * q.sqrt();
                let root = (q * q + 2.0 * q - 3.0).sqrt();
                let up = 0.5 * r * q * (q + 1.0 + root);
                let down = 0.5 * r * q * (q + 1.0 - root);
                (Nodes::Multiplicative { up, down }, (r - down) / (up - down))
            }
            BinomialType::LeisenReimer | BinomialType::Joshi4 => {
                ensure!(strike > 0.0, "strike must be positive, got {strike}");
                let ermqdt = (drift_per_step + 0.5 * variance).exp();
                let sd = total_variance.sqrt();
                let d2 = ((x0 / strike).ln() + drift_per_step * steps as Real) / sd;
                let (pu, pdash) = if kind == BinomialType::LeisenReimer {
                    (peizer_pratt_2(d2, steps), peizer_pratt_2(d2 + sd, steps))
                } else {
                    let k = (steps as Real - 1.0) / 2.0;
                    (joshi4_up_probability(k, d2), joshi4_up_probability(k, d2 + sd))
                };
                let up = ermqdt * pdash / pu;
                let down = (ermqdt - pu * up) / (1.0 - pu);
                (Nodes::Multiplicative { up, down }, pu)
            }
        };
        ensure!(
            (0.0..=1.0).contains(&pu),
            "{kind} tree: negative probability (pu = {pu}), use more steps"
        );
        Ok(Self {
            kind,
            x0,
            dt,
            steps,
            nodes,
            pu,
            pd: 1.0 - pu,
        })
    }

    /// The variant.
    pub fn kind(&self) -> BinomialType {
        self.kind
    }

    /// Number of time steps (may exceed the requested number by one).
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Step length.
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// Spot at the root.
    pub fn x0(&self) -> Real {
        self.x0
    }
}

impl Tree for BinomialTree {
    fn columns(&self) -> usize {
        self.steps + 1
    }

    fn size(&self, i: usize) -> usize {
        i + 1
    }

    fn underlying(&self, i: usize, index: usize) -> Real {
        match self.nodes {
            Nodes::Additive {
                drift_per_step,
                step,
            } => {
                let j = 2.0 * index as Real - i as Real;
                self.x0 * (i as Real * drift_per_step + j * step).exp()
            }
            Nodes::Multiplicative { up, down } => {
                self.x0 * down.powi((i - index) as i32) * up.powi(index as i32)
            }
        }
    }

    fn descendant(&self, _i: usize, index: usize, branch: usize) -> usize {
        index + branch
    }

    fn probability(&self, _i: usize, _index: usize, branch: usize) -> Real {
        if branch == 1 {
            self.pu
        } else {
            self.pd
        }
    }

    fn branches(&self) -> usize {
        2
    }
}

// ─── Helper functions ─────────────────────────────────────────────────────────

/// Peizer-Pratt method 2 inversion for an odd number of steps `n`.
fn peizer_pratt_2(z: Real, n: usize) -> Real {
    let nf = n as Real;
    let r = z / (nf + 1.0 / 3.0 + 0.1 / (nf + 1.0));
    let ex = (-r * r * (nf + 1.0 / 6.0)).exp();
    0.5 + z.signum() * (0.25 * (1.0 - ex)).sqrt()
}

/// Joshi's fourth-order up probability.
fn joshi4_up_probability(k: Real, dj: Real) -> Real {
    let alpha = dj / 8.0_f64.sqrt();
    let alpha2 = alpha * alpha;
    let alpha3 = alpha * alpha2;
    let alpha5 = alpha3 * alpha2;
    let alpha7 = alpha5 * alpha2;
    let beta = -0.375 * alpha - alpha3;
    let gamma = (5.0 / 6.0) * alpha5 + (13.0 / 12.0) * alpha3 + (25.0 / 128.0) * alpha;
    let delta = -0.1025 * alpha - 0.9285 * alpha3 - 1.43 * alpha5 - 0.5 * alpha7;
    let rootk = k.sqrt();
    0.5 + alpha / rootk
        + beta / (k * rootk)
        + gamma / (k * k * rootk)
        + delta / (k * k * k * rootk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_core::OptionType;
    use qn_math::black_formula;
    use qn_termstructures::{BlackConstantVol, FlatForward};
    use std::sync::Arc;

    const ALL: [BinomialType; 7] = [
        BinomialType::JarrowRudd,
        BinomialType::CoxRossRubinstein,
        BinomialType::AdditiveEqp,
        BinomialType::Trigeorgis,
        BinomialType::Tian,
        BinomialType::LeisenReimer,
        BinomialType::Joshi4,
    ];

    fn process() -> GeneralizedBlackScholesProcess {
        GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            Arc::new(BlackConstantVol::new(0.20)),
        )
    }

    fn european_call(tree: &BinomialTree, strike: Real) -> Real {
        let n = tree.steps();
        let disc = (-0.05 * tree.dt()).exp();
        let mut values: Vec<Real> = (0..tree.size(n))
            .map(|j| (tree.underlying(n, j) - strike).max(0.0))
            .collect();
        for i in (0..n).rev() {
            for j in 0..tree.size(i) {
                values[j] = disc
                    * (tree.probability(i, j, 0) * values[tree.descendant(i, j, 0)]
                        + tree.probability(i, j, 1) * values[tree.descendant(i, j, 1)]);
            }
        }
        values[0]
    }

    fn reference() -> Real {
        let fwd = 100.0 * (0.03_f64).exp();
        black_formula(OptionType::Call, 100.0, fwd, 0.2, (-0.05_f64).exp())
    }

    #[test]
    fn every_variant_converges() {
        let bs = reference();
        for kind in ALL {
            let tree = BinomialTree::new(kind, &process(), 1.0, 801, 100.0).unwrap();
            let price = european_call(&tree, 100.0);
            assert!((price - bs).abs() < 2e-2, "{kind}: {price} vs {bs}");
        }
    }

    #[test]
    fn strike_centred_variants_converge_fast() {
        let bs = reference();
        for kind in [BinomialType::LeisenReimer, BinomialType::Joshi4] {
            let tree = BinomialTree::new(kind, &process(), 1.0, 50, 100.0).unwrap();
            assert_eq!(tree.steps(), 51);
            let price = european_call(&tree, 100.0);
            assert!((price - bs).abs() < 2e-3, "{kind}: {price} vs {bs}");
        }
    }

    #[test]
    fn variant_names_round_trip_through_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: BinomialType,
        }
        let w: Wrapper = toml::from_str("kind = \"LeisenReimer\"").unwrap();
        assert_eq!(w.kind, BinomialType::LeisenReimer);
    }
}
