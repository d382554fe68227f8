//! Rate and evolution time grids of a market-model simulation, and the
//! numeraire choices compatible with them.
//!
//! Forward `i` accrues over `[T_i, T_{i+1}]` where `T` are the rate times.
//! Step `k` evolves the curve from `t_{k−1}` (or `0`) to the evolution time
//! `t_k`. Numeraire `j` is the zero bond maturing at `T_j`.

use qn_core::{ensure, errors::Result, Time};

/// Rate times, evolution times and the forwards each step needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionDescription {
    rate_times: Vec<Time>,
    rate_taus: Vec<Time>,
    evolution_times: Vec<Time>,
    relevance_rates: Vec<(usize, usize)>,
    first_alive_rate: Vec<usize>,
}

impl EvolutionDescription {
    /// Description over `rate_times`.
    ///
    /// Empty `evolution_times` default to every rate time but the last;
    /// empty `relevance_rates` mark every forward relevant at every step.
    pub fn new(
        rate_times: Vec<Time>,
        evolution_times: Vec<Time>,
        relevance_rates: Vec<(usize, usize)>,
    ) -> Result<Self> {
        ensure!(rate_times.len() >= 2, "at least two rate times required");
        check_increasing_times(&rate_times)?;
        let number_of_rates = rate_times.len() - 1;

        let evolution_times = if evolution_times.is_empty() {
            rate_times[..number_of_rates].to_vec()
        } else {
            evolution_times
        };
        check_increasing_times(&evolution_times)?;
        let last_evolution = evolution_times[evolution_times.len() - 1];
        ensure!(
            last_evolution <= rate_times[number_of_rates - 1],
            "last evolution time ({last_evolution}) past the last fixing time ({})",
            rate_times[number_of_rates - 1]
        );

        let steps = evolution_times.len();
        let relevance_rates = if relevance_rates.is_empty() {
            vec![(0, number_of_rates); steps]
        } else {
            relevance_rates
        };
        ensure!(
            relevance_rates.len() == steps,
            "{} relevance ranges for {steps} steps",
            relevance_rates.len()
        );

        let rate_taus = rate_times.windows(2).map(|w| w[1] - w[0]).collect();

        let mut first_alive_rate = Vec::with_capacity(steps);
        let mut current = 0.0;
        let mut alive = 0;
        for &t in &evolution_times {
            while rate_times[alive] <= current {
                alive += 1;
            }
            first_alive_rate.push(alive);
            current = t;
        }

        Ok(Self {
            rate_times,
            rate_taus,
            evolution_times,
            relevance_rates,
            first_alive_rate,
        })
    }

    /// Rate times `T_0 < … < T_n`.
    pub fn rate_times(&self) -> &[Time] {
        &self.rate_times
    }

    /// Accrual periods `T_{i+1} − T_i`.
    pub fn rate_taus(&self) -> &[Time] {
        &self.rate_taus
    }

    /// Evolution times.
    pub fn evolution_times(&self) -> &[Time] {
        &self.evolution_times
    }

    /// For each step, the half-open range of forwards the product needs.
    pub fn relevance_rates(&self) -> &[(usize, usize)] {
        &self.relevance_rates
    }

    /// For each step, the first forward still alive during the step.
    pub fn first_alive_rate(&self) -> &[usize] {
        &self.first_alive_rate
    }

    /// Number of forwards.
    pub fn number_of_rates(&self) -> usize {
        self.rate_times.len() - 1
    }

    /// Number of evolution steps.
    pub fn number_of_steps(&self) -> usize {
        self.evolution_times.len()
    }

    /// Time at which forward `i` stops diffusing during step `k`:
    /// `min(t_k, T_i)`.
    pub fn effective_stop_time(&self, step: usize, rate: usize) -> Time {
        self.evolution_times[step].min(self.rate_times[rate])
    }
}

/// Fails unless `times` is non-empty, non-negative and strictly increasing.
pub fn check_increasing_times(times: &[Time]) -> Result<()> {
    ensure!(!times.is_empty(), "at least one time required");
    ensure!(times[0] >= 0.0, "first time ({}) is negative", times[0]);
    for w in times.windows(2) {
        ensure!(w[1] > w[0], "times not strictly increasing: {} then {}", w[0], w[1]);
    }
    Ok(())
}

// ── Numeraire choices ────────────────────────────────────────────────────────

/// The last bond at every step.
pub fn terminal_measure(evolution: &EvolutionDescription) -> Vec<usize> {
    vec![evolution.number_of_rates(); evolution.number_of_steps()]
}

/// At each step, the first bond maturing at or after the evolution time,
/// shifted `offset` bonds further out and capped at the last one.
pub fn money_market_plus_measure(
    evolution: &EvolutionDescription,
    offset: usize,
) -> Result<Vec<usize>> {
    let rate_times = evolution.rate_times();
    let max_numeraire = rate_times.len() - 1;
    ensure!(
        offset <= max_numeraire,
        "offset ({offset}) greater than the maximum numeraire ({max_numeraire})"
    );
    let mut j = 0;
    Ok(evolution
        .evolution_times()
        .iter()
        .map(|&t| {
            while rate_times[j] < t {
                j += 1;
            }
            (j + offset).min(max_numeraire)
        })
        .collect())
}

/// The discretely rebalanced money-market account.
pub fn money_market_measure(evolution: &EvolutionDescription) -> Vec<usize> {
    // offset 0 is always admissible
    money_market_plus_measure(evolution, 0).unwrap_or_default()
}

/// Whether `numeraires` is the terminal measure of `evolution`.
pub fn is_in_terminal_measure(evolution: &EvolutionDescription, numeraires: &[usize]) -> bool {
    numeraires.iter().all(|&n| n == evolution.number_of_rates())
}

/// Whether `numeraires` is the money-market-plus measure with `offset`.
pub fn is_in_money_market_plus_measure(
    evolution: &EvolutionDescription,
    numeraires: &[usize],
    offset: usize,
) -> bool {
    money_market_plus_measure(evolution, offset).is_ok_and(|m| m == numeraires)
}

/// Whether `numeraires` is the money-market measure.
pub fn is_in_money_market_measure(evolution: &EvolutionDescription, numeraires: &[usize]) -> bool {
    is_in_money_market_plus_measure(evolution, numeraires, 0)
}

/// Fails unless there is one numeraire per step, each an existing bond that
/// has not matured before the end of its step.
pub fn check_compatibility(evolution: &EvolutionDescription, numeraires: &[usize]) -> Result<()> {
    let steps = evolution.number_of_steps();
    ensure!(
        numeraires.len() == steps,
        "{} numeraires for {steps} steps",
        numeraires.len()
    );
    let rate_times = evolution.rate_times();
    for (k, (&n, &t)) in numeraires.iter().zip(evolution.evolution_times()).enumerate() {
        ensure!(n < rate_times.len(), "step {k}: numeraire {n} out of range");
        ensure!(
            rate_times[n] >= t,
            "step {k}: numeraire {n} matures at {} before the evolution time {t}",
            rate_times[n]
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evolution() -> EvolutionDescription {
        EvolutionDescription::new(vec![0.5, 1.0, 1.5, 2.0, 2.5], Vec::new(), Vec::new()).unwrap()
    }

    #[test]
    fn defaults_follow_the_rate_times() {
        let e = evolution();
        assert_eq!(e.number_of_rates(), 4);
        assert_eq!(e.number_of_steps(), 4);
        assert_eq!(e.evolution_times(), &[0.5, 1.0, 1.5, 2.0]);
        assert_eq!(e.rate_taus(), &[0.5; 4]);
        assert_eq!(e.first_alive_rate(), &[0, 1, 2, 3]);
        assert_eq!(e.relevance_rates()[2], (0, 4));
        assert_eq!(e.effective_stop_time(1, 0), 0.5);
        assert_eq!(e.effective_stop_time(1, 3), 1.0);
    }

    #[test]
    fn measures() {
        let e = evolution();
        let terminal = terminal_measure(&e);
        assert_eq!(terminal, vec![4; 4]);
        assert!(is_in_terminal_measure(&e, &terminal));

        let mm = money_market_measure(&e);
        assert_eq!(mm, vec![0, 1, 2, 3]);
        assert!(is_in_money_market_measure(&e, &mm));
        assert!(!is_in_money_market_measure(&e, &terminal));
        assert_eq!(money_market_plus_measure(&e, 2).unwrap(), vec![2, 3, 4, 4]);
        assert!(money_market_plus_measure(&e, 5).is_err());

        check_compatibility(&e, &mm).unwrap();
        check_compatibility(&e, &terminal).unwrap();
        assert!(check_compatibility(&e, &[0, 0, 2, 3]).is_err());
        assert!(check_compatibility(&e, &[4, 4]).is_err());
    }

    #[test]
    fn rejects_bad_grids() {
        assert!(EvolutionDescription::new(vec![1.0], Vec::new(), Vec::new()).is_err());
        assert!(EvolutionDescription::new(vec![1.0, 0.5], Vec::new(), Vec::new()).is_err());
        let off_grid = EvolutionDescription::new(vec![0.5, 1.0, 1.5], vec![0.5, 1.2], Vec::new());
        assert!(off_grid.is_err());
        assert!(EvolutionDescription::new(vec![0.5, 1.0, 1.5], Vec::new(), vec![(0, 2)]).is_err());
    }
}
