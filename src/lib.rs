//! Pokercraft: tournament result analysis.
//!
//! Library crate exposing the ingestion, metrics and bankroll simulation
//! modules, plus the three top-level operations used by the binary and
//! integration tests.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod storage;
pub mod types;

use std::path::PathBuf;

use analysis::bankroll::{BankrollSimulator, SimulationConfig, SurvivalTable};
use analysis::metrics::{MetricsEngine, MetricsSeries};
use ingest::parser::SummaryParser;
use types::{AnalysisError, SummaryError, TournamentSummary};

/// Parse export files into the deduplicated, canonically ordered sequence.
///
/// Files with data errors are skipped; an invariant violation aborts.
pub fn ingest(
    file_paths: &[PathBuf],
    parser: &SummaryParser,
) -> Result<Vec<TournamentSummary>, SummaryError> {
    ingest::ingest(file_paths, parser, true).map(|report| report.summaries)
}

/// Cumulative and windowed metrics for every tournament.
pub fn compute_metrics(
    summaries: &[TournamentSummary],
    windows: &[usize],
) -> Result<MetricsSeries, AnalysisError> {
    MetricsEngine::new(windows).compute(summaries)
}

/// Survival probability for each candidate bankroll (in buy-ins).
pub fn simulate_bankroll(
    summaries: &[TournamentSummary],
    bankrolls: &[f64],
    runs_per_bankroll: u32,
    min_trial_cap: u64,
    seed: Option<u64>,
) -> Result<SurvivalTable, AnalysisError> {
    BankrollSimulator::new(SimulationConfig {
        runs_per_bankroll,
        min_trial_cap,
        seed,
        ..SimulationConfig::default()
    })
    .simulate(summaries, bankrolls)
}
