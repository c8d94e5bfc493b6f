//! Bankroll survival simulation.
//!
//! Resamples the player's own per-entry returns (in buy-in units) to
//! estimate how likely a starting bankroll of `B` buy-ins survives a long
//! stretch of independent one-buy-in tournaments.
//!
//! For each candidate bankroll, `runs_per_bankroll` independent runs start
//! at capital `B` and repeatedly add a uniformly drawn return. A run is
//! bankrupt as soon as capital is `<= 0`, and survives if it lasts the
//! whole trial cap `max(trial_multiplier × N, min_trial_cap)` where `N` is
//! the number of non-freeroll tournaments.
//!
//! Run `k` always draws from the stream seeded with `seed + k`, whatever
//! the bankroll. Without a profit exit this makes survival monotone in `B`
//! for a fixed seed; with one, a small bankroll can exit early on a path
//! that a larger bankroll rides down to ruin.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{AnalysisError, TournamentSummary};

/// Default candidate bankrolls, in buy-ins.
pub const DEFAULT_BANKROLL_CANDIDATES: &[f64] = &[10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Independent runs per candidate bankroll.
    pub runs_per_bankroll: u32,
    /// Lower bound on the number of draws per run.
    pub min_trial_cap: u64,
    /// Draws per historical tournament.
    pub trial_multiplier: u64,
    /// Base seed; drawn from the thread RNG when unset.
    pub seed: Option<u64>,
    /// Stop a run early once capital reaches `B × multiplier` (counted as
    /// survived). Must be >= 1.0.
    pub profit_exit_multiplier: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs_per_bankroll: 25_000,
            min_trial_cap: 40_000,
            trial_multiplier: 10,
            seed: None,
            profit_exit_multiplier: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Return population
// ---------------------------------------------------------------------------

/// Immutable sampling population: `rrs` of every non-freeroll tournament.
#[derive(Debug, Clone)]
pub struct ReturnPopulation {
    returns: Vec<f64>,
    tournaments: usize,
}

impl ReturnPopulation {
    pub fn from_summaries(summaries: &[TournamentSummary]) -> Self {
        let mut returns = Vec::new();
        let mut tournaments = 0;
        for t in summaries.iter().filter(|t| !t.is_freeroll()) {
            returns.extend(t.rrs());
            tournaments += 1;
        }
        Self { returns, tournaments }
    }

    pub fn from_returns(returns: Vec<f64>, tournaments: usize) -> Self {
        Self { returns, tournaments }
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Number of non-freeroll tournaments the population came from.
    pub fn tournaments(&self) -> usize {
        self.tournaments
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.returns.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Final capital / starting capital; 0.0 when bankrupt.
    pub final_ratio: f64,
    /// Draw (1-based) on which capital hit zero.
    pub bankrupt_at: Option<u64>,
}

/// Aggregated outcomes for one starting bankroll.
#[derive(Debug, Clone, Default)]
pub struct BankruptcyMetric {
    outcomes: Vec<RunOutcome>,
}

impl BankruptcyMetric {
    pub fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = RunOutcome>,
    {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn rate(&self, pred: impl Fn(&RunOutcome) -> bool) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.outcomes.iter().filter(|o| pred(o)).count() as f64 / self.outcomes.len() as f64
    }

    pub fn survival_rate(&self) -> f64 {
        self.rate(|o| o.bankrupt_at.is_none())
    }

    pub fn bankruptcy_rate(&self) -> f64 {
        self.rate(|o| o.bankrupt_at.is_some())
    }

    /// Runs that ended above their starting capital.
    pub fn profitable_rate(&self) -> f64 {
        self.rate(|o| o.final_ratio > 1.0)
    }

    /// Mean draw of ruin among bankrupt runs.
    pub fn mean_bankrupt_step(&self) -> Option<f64> {
        let steps: Vec<u64> = self.outcomes.iter().filter_map(|o| o.bankrupt_at).collect();
        if steps.is_empty() {
            None
        } else {
            Some(steps.iter().sum::<u64>() as f64 / steps.len() as f64)
        }
    }
}

/// Survival estimate for one candidate bankroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalEntry {
    /// Starting bankroll in buy-ins.
    pub bankroll: f64,
    pub survival_rate: f64,
    pub bankruptcy_rate: f64,
    pub profitable_rate: f64,
}

/// Survival probability per candidate bankroll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalTable {
    pub entries: Vec<SurvivalEntry>,
    pub runs_per_bankroll: u32,
    pub trial_cap: u64,
    pub population_size: usize,
    pub seed: u64,
}

impl SurvivalTable {
    pub fn get(&self, bankroll: f64) -> Option<&SurvivalEntry> {
        self.entries.iter().find(|e| e.bankroll == bankroll)
    }

    /// Smallest candidate whose survival rate reaches `target`.
    pub fn min_bankroll_for(&self, target: f64) -> Option<f64> {
        self.entries
            .iter()
            .filter(|e| e.survival_rate >= target)
            .map(|e| e.bankroll)
            .reduce(f64::min)
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct BankrollSimulator {
    config: SimulationConfig,
}

impl BankrollSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Draws per run for a history of `tournaments` non-freeroll results.
    pub fn trial_cap(&self, tournaments: usize) -> u64 {
        (self.config.trial_multiplier.saturating_mul(tournaments as u64))
            .max(self.config.min_trial_cap)
    }

    /// Build the population from `summaries` and simulate every candidate.
    pub fn simulate(
        &self,
        summaries: &[TournamentSummary],
        bankrolls: &[f64],
    ) -> Result<SurvivalTable, AnalysisError> {
        let population = ReturnPopulation::from_summaries(summaries);
        self.simulate_population(&population, bankrolls)
    }

    /// Simulate every candidate bankroll against a prepared population.
    pub fn simulate_population(
        &self,
        population: &ReturnPopulation,
        bankrolls: &[f64],
    ) -> Result<SurvivalTable, AnalysisError> {
        if population.is_empty() {
            return Err(AnalysisError::EmptyReturnPopulation);
        }
        self.validate(bankrolls)?;

        let trial_cap = self.trial_cap(population.tournaments());
        if trial_cap == 0 {
            return Err(AnalysisError::InvalidParameter(
                "trial cap must be at least 1".into(),
            ));
        }
        if population.sum() < 0.0 {
            warn!(
                sum = population.sum(),
                "Total relative return is negative; long-run ruin is expected"
            );
        }

        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            population = population.len(),
            candidates = bankrolls.len(),
            runs = self.config.runs_per_bankroll,
            trial_cap,
            seed,
            "Starting bankroll simulation"
        );

        let entries = bankrolls
            .iter()
            .map(|&bankroll| {
                let metric = self.run_bankroll(population.returns(), bankroll, trial_cap, seed);
                let entry = SurvivalEntry {
                    bankroll,
                    survival_rate: metric.survival_rate(),
                    bankruptcy_rate: metric.bankruptcy_rate(),
                    profitable_rate: metric.profitable_rate(),
                };
                debug!(
                    bankroll,
                    survival = format!("{:.2}%", entry.survival_rate * 100.0),
                    mean_ruin_step = ?metric.mean_bankrupt_step(),
                    "Bankroll simulated"
                );
                entry
            })
            .collect();

        Ok(SurvivalTable {
            entries,
            runs_per_bankroll: self.config.runs_per_bankroll,
            trial_cap,
            population_size: population.len(),
            seed,
        })
    }

    /// All runs for one bankroll, in parallel.
    ///
    /// Checks its own inputs, so it can be called without going through
    /// `simulate_population`.
    pub fn simulate_bankroll(
        &self,
        returns: &[f64],
        bankroll: f64,
        trial_cap: u64,
        seed: u64,
    ) -> Result<BankruptcyMetric, AnalysisError> {
        if returns.is_empty() {
            return Err(AnalysisError::EmptyReturnPopulation);
        }
        self.validate(&[bankroll])?;
        if trial_cap == 0 {
            return Err(AnalysisError::InvalidParameter(
                "trial cap must be at least 1".into(),
            ));
        }
        Ok(self.run_bankroll(returns, bankroll, trial_cap, seed))
    }

    /// Inputs already validated: non-empty returns, positive bankroll and cap.
    fn run_bankroll(
        &self,
        returns: &[f64],
        bankroll: f64,
        trial_cap: u64,
        seed: u64,
    ) -> BankruptcyMetric {
        let exit_capital = self
            .config
            .profit_exit_multiplier
            .map(|m| bankroll * m)
            .unwrap_or(f64::INFINITY);

        BankruptcyMetric::new(
            (0..self.config.runs_per_bankroll)
                .into_par_iter()
                .map(|run| {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(run as u64));
                    run_once(bankroll, returns, trial_cap, exit_capital, &mut rng)
                })
                .collect::<Vec<_>>(),
        )
    }

    fn validate(&self, bankrolls: &[f64]) -> Result<(), AnalysisError> {
        if bankrolls.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "at least one candidate bankroll is required".into(),
            ));
        }
        if let Some(bad) = bankrolls.iter().find(|b| !b.is_finite() || **b <= 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "bankroll must be positive, got {bad}"
            )));
        }
        if self.config.runs_per_bankroll == 0 {
            return Err(AnalysisError::InvalidParameter(
                "runs per bankroll must be positive".into(),
            ));
        }
        if let Some(m) = self.config.profit_exit_multiplier {
            if m.is_nan() || m < 1.0 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "profit exit multiplier must be >= 1.0, got {m}"
                )));
            }
        }
        Ok(())
    }
}

/// One run: draw with replacement until ruin, early exit, or the cap.
fn run_once<R: Rng>(
    initial_capital: f64,
    returns: &[f64],
    trial_cap: u64,
    exit_capital: f64,
    rng: &mut R,
) -> RunOutcome {
    let mut capital = initial_capital;
    for step in 1..=trial_cap {
        capital += returns[rng.gen_range(0..returns.len())];
        if capital <= 0.0 {
            return RunOutcome {
                final_ratio: 0.0,
                bankrupt_at: Some(step),
            };
        }
        if capital >= exit_capital {
            break;
        }
    }
    RunOutcome {
        final_ratio: capital / initial_capital,
        bankrupt_at: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
