//! Bankroll simulator end to end, with small seeded runs.

use pokercraft::analysis::bankroll::{BankrollSimulator, SimulationConfig};
use pokercraft::types::{AnalysisError, TournamentSummary};

use crate::fixtures::summary;

/// A winning player: mostly bust, occasional 6x cash.
fn winning_history() -> Vec<TournamentSummary> {
    (1..=60)
        .map(|id| {
            let prize = if id % 4 == 0 { 60.0 } else { 0.0 };
            summary(id, 10.0, prize, 1)
        })
        .collect()
}

#[test]
fn test_survival_is_monotone_in_bankroll() {
    let table = pokercraft::simulate_bankroll(
        &winning_history(),
        &[1.0, 5.0, 20.0, 100.0],
        300,
        500,
        Some(11),
    )
    .unwrap();

    assert_eq!(table.entries.len(), 4);
    assert_eq!(table.trial_cap, 600);
    for pair in table.entries.windows(2) {
        assert!(pair[0].survival_rate <= pair[1].survival_rate);
    }
    for entry in &table.entries {
        assert!((0.0..=1.0).contains(&entry.survival_rate));
        assert!((entry.survival_rate + entry.bankruptcy_rate - 1.0).abs() < 1e-12);
    }
    // One buy-in of cushion against a 75% bust rate rarely lasts.
    assert!(table.entries[0].survival_rate < table.entries[3].survival_rate);
}

#[test]
fn test_same_seed_same_table() {
    let history = winning_history();
    let run = || {
        pokercraft::simulate_bankroll(&history, &[3.0, 30.0], 200, 300, Some(5)).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.entries, b.entries);
    assert_eq!(a.seed, 5);
}

#[test]
fn test_losing_history_goes_broke() {
    let history: Vec<_> = (1..=20).map(|id| summary(id, 5.0, 0.0, 1)).collect();
    let table = pokercraft::simulate_bankroll(&history, &[10.0, 50.0], 50, 200, Some(1)).unwrap();
    assert!(table.entries.iter().all(|e| e.survival_rate == 0.0));
}

#[test]
fn test_only_freerolls_is_empty_population() {
    let mut history = vec![summary(1, 10.0, 5.0, 1)];
    history[0].buy_in_pure = 0.0;
    history[0].rake = 0.0;
    let err = pokercraft::simulate_bankroll(&history, &[10.0], 10, 10, Some(1)).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyReturnPopulation));
}

#[test]
fn test_profit_exit_counts_as_survival() {
    let sim = BankrollSimulator::new(SimulationConfig {
        runs_per_bankroll: 200,
        min_trial_cap: 5_000,
        trial_multiplier: 10,
        seed: Some(3),
        profit_exit_multiplier: Some(2.0),
    });
    let table = sim.simulate(&winning_history(), &[50.0]).unwrap();
    let entry = &table.entries[0];
    assert!(entry.survival_rate > 0.5);
    assert!(entry.profitable_rate <= entry.survival_rate);
}

#[test]
fn test_re_entries_enlarge_population() {
    let history = vec![summary(1, 10.0, 100.0, 3), summary(2, 10.0, 0.0, 1)];
    let table = pokercraft::simulate_bankroll(&history, &[10.0], 20, 50, Some(9)).unwrap();
    assert_eq!(table.population_size, 4);
}
