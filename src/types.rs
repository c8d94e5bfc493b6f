//! Shared types for tournament analysis.
//!
//! These types form the data model used across all modules. A
//! `TournamentSummary` is built once by the parser and never mutated
//! afterwards; everything else (profit, relative returns, ordering) is
//! derived on demand from its stored fields.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Tournament identifier as printed in the export header.
///
/// Two summaries describe the same tournament iff their ids are equal,
/// whatever their other fields say. Deduplication and lookup go through
/// this key only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TournamentId(pub u64);

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Currencies that can appear in an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Cny,
    Thb,
    Vnd,
    Php,
    Krw,
}

impl Currency {
    /// The fixed recognized set.
    pub const ALL: &'static [Currency] = &[
        Currency::Usd,
        Currency::Cny,
        Currency::Thb,
        Currency::Vnd,
        Currency::Php,
        Currency::Krw,
    ];

    /// Symbol used in money tokens.
    pub fn symbol(&self) -> char {
        match self {
            Currency::Usd => '$',
            Currency::Cny => '¥',
            Currency::Thb => '฿',
            Currency::Vnd => '₫',
            Currency::Php => '₱',
            Currency::Krw => '₩',
        }
    }

    /// Default units of this currency per one USD.
    pub fn default_rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Cny => 7.25,
            Currency::Thb => 34.0,
            Currency::Vnd => 25_000.0,
            Currency::Php => 58.0,
            Currency::Krw => 1_380.0,
        }
    }

    /// Look up a currency by its symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.symbol() == symbol)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Cny => write!(f, "CNY"),
            Currency::Thb => write!(f, "THB"),
            Currency::Vnd => write!(f, "VND"),
            Currency::Php => write!(f, "PHP"),
            Currency::Krw => write!(f, "KRW"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tournament summary
// ---------------------------------------------------------------------------

/// One tournament result, all money normalised to USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    /// Entry fee excluding rake.
    pub buy_in_pure: f64,
    pub rake: f64,
    pub total_prize_pool: f64,
    /// Local time, as printed in the export.
    pub start_time: NaiveDateTime,
    pub my_rank: u32,
    pub total_players: u32,
    pub my_prize: f64,
    /// Entries played by the owner, re-entries included (>= 1).
    pub my_entries: u32,
}

impl fmt::Display for TournamentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) BI ${:.2} x{} | {}/{} | prize ${:.2}",
            self.id,
            self.name,
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.buy_in(),
            self.my_entries,
            self.my_rank,
            self.total_players,
            self.my_prize,
        )
    }
}

impl TournamentSummary {
    /// Deduplication key.
    pub fn key(&self) -> TournamentId {
        self.id
    }

    /// Canonical ordering key: start time, then id.
    pub fn sorting_key(&self) -> (NaiveDateTime, TournamentId) {
        (self.start_time, self.id)
    }

    /// Full buy-in of a single entry (pure + rake).
    pub fn buy_in(&self) -> f64 {
        self.buy_in_pure + self.rake
    }

    pub fn is_freeroll(&self) -> bool {
        self.buy_in() <= 0.0
    }

    /// Net profit across all entries.
    pub fn profit(&self) -> f64 {
        self.my_prize - self.buy_in() * self.my_entries as f64
    }

    /// Rake paid across all entries.
    pub fn rake_paid(&self) -> f64 {
        self.rake * self.my_entries as f64
    }

    /// Relative return with re-entries. NaN for freerolls.
    pub fn rre(&self) -> f64 {
        if self.is_freeroll() {
            f64::NAN
        } else {
            self.my_prize / self.buy_in() / self.my_entries as f64
        }
    }

    /// Per-entry net returns in buy-in units: every re-entry but the last
    /// is a full loss, the last entry carries the whole prize. Empty for
    /// freerolls.
    pub fn rrs(&self) -> Vec<f64> {
        if self.is_freeroll() {
            return Vec::new();
        }
        let losses = self.my_entries.saturating_sub(1) as usize;
        let mut returns = vec![-1.0; losses];
        returns.push(self.my_prize / self.buy_in() - 1.0);
        returns
    }

    /// Check structural invariants. A violation here is a defect in
    /// ingestion, not bad input data.
    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.my_entries == 0 {
            return Err(SummaryError::InvariantViolation(format!(
                "{}: entries must be at least 1",
                self.id
            )));
        }
        if self.total_players == 0 {
            return Err(SummaryError::InvariantViolation(format!(
                "{}: entrant count must be positive",
                self.id
            )));
        }
        if self.my_rank == 0 {
            return Err(SummaryError::InvariantViolation(format!(
                "{}: rank must be positive",
                self.id
            )));
        }
        let money = [
            ("buy_in_pure", self.buy_in_pure),
            ("rake", self.rake),
            ("total_prize_pool", self.total_prize_pool),
            ("my_prize", self.my_prize),
        ];
        for (field, value) in money {
            if !value.is_finite() || value < 0.0 {
                return Err(SummaryError::InvariantViolation(format!(
                    "{}: {field} must be a non-negative amount, got {value}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Helper to build a test/sample summary with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: u64, buy_in_pure: f64, rake: f64, prize: f64, entries: u32) -> Self {
        use chrono::NaiveDate;

        TournamentSummary {
            id: TournamentId(id),
            name: format!("Sample Tournament {id}"),
            buy_in_pure,
            rake,
            total_prize_pool: 1_000.0,
            start_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap_or_default()
                + chrono::Duration::minutes(id as i64),
            my_rank: 10,
            total_players: 100,
            my_prize: prize,
            my_entries: entries,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while turning one export file into a summary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SummaryError {
    #[error("Malformed {field} on line {line}: {content:?}")]
    MalformedField {
        field: &'static str,
        line: usize,
        content: String,
    },

    #[error("Currency mismatch on line {line}: expected {expected}, found {found}")]
    CurrencyMismatch {
        line: usize,
        expected: Currency,
        found: Currency,
    },

    #[error("Unknown currency symbol '{symbol}' on line {line}")]
    UnknownCurrency { line: usize, symbol: char },

    #[error("Incomplete record: missing {}", .missing.join(", "))]
    IncompleteRecord { missing: Vec<&'static str> },

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl SummaryError {
    /// Data-quality errors skip the file; anything else aborts the batch.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SummaryError::InvariantViolation(_))
    }
}

/// Errors raised by the metrics engine and bankroll simulator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("No non-freeroll results to resample; bankroll simulation cannot run")]
    EmptyReturnPopulation,

    #[error("Nothing to analyze: {0}")]
    EmptyInput(String),

    #[error("Summaries are not in canonical order at index {0}")]
    UnorderedInput(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields_single_entry() {
        let t = TournamentSummary::sample(1, 9.0, 1.0, 30.0, 1);
        assert_eq!(t.buy_in(), 10.0);
        assert_eq!(t.profit(), 20.0);
        assert_eq!(t.rre(), 3.0);
        assert_eq!(t.rrs(), vec![2.0]);
    }

    #[test]
    fn test_freeroll_has_no_returns() {
        let t = TournamentSummary::sample(2, 0.0, 0.0, 5.0, 1);
        assert_eq!(t.buy_in(), 0.0);
        assert!(t.is_freeroll());
        assert!(t.rre().is_nan());
        assert!(t.rrs().is_empty());
        assert_eq!(t.profit(), 5.0);
    }

    #[test]
    fn test_reentries_are_full_losses() {
        let t = TournamentSummary::sample(3, 0.5, 0.5, 0.0, 3);
        assert_eq!(t.buy_in(), 1.0);
        assert_eq!(t.rrs(), vec![-1.0, -1.0, -1.0]);
        assert_eq!(t.profit(), -3.0);
        assert_eq!(t.rake_paid(), 1.5);
    }

    #[test]
    fn test_rrs_length_matches_entries() {
        let t = TournamentSummary::sample(4, 20.0, 2.0, 110.0, 4);
        let rrs = t.rrs();
        assert_eq!(rrs.len(), 4);
        assert_eq!(&rrs[..3], &[-1.0, -1.0, -1.0]);
        assert!((rrs[3] - 4.0).abs() < 1e-12);
        assert!((t.rre() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_sorting_key_time_then_id() {
        let mut a = TournamentSummary::sample(50, 1.0, 0.1, 0.0, 1);
        let mut b = TournamentSummary::sample(10, 1.0, 0.1, 0.0, 1);
        b.start_time = a.start_time;
        assert!(b.sorting_key() < a.sorting_key());

        a.start_time -= chrono::Duration::hours(1);
        assert!(a.sorting_key() < b.sorting_key());
    }

    #[test]
    fn test_validate_rejects_zero_entries() {
        let t = TournamentSummary::sample(5, 1.0, 0.1, 0.0, 0);
        let err = t.validate().unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validate_rejects_negative_money() {
        let t = TournamentSummary::sample(6, 1.0, 0.1, -2.0, 1);
        assert!(matches!(t.validate(), Err(SummaryError::InvariantViolation(_))));
    }

    #[test]
    fn test_currency_symbols_roundtrip() {
        for c in Currency::ALL {
            assert_eq!(Currency::from_symbol(c.symbol()), Some(*c));
            assert!(c.default_rate() > 0.0);
        }
        assert_eq!(Currency::from_symbol('€'), None);
    }

    #[test]
    fn test_error_classification() {
        let skip = SummaryError::IncompleteRecord { missing: vec!["rank", "prize"] };
        assert!(skip.is_recoverable());
        assert_eq!(skip.to_string(), "Incomplete record: missing rank, prize");
        assert!(SummaryError::UnknownCurrency { line: 2, symbol: '€' }.is_recoverable());
    }

    #[test]
    fn test_summary_serialization_roundtrip() {
        let t = TournamentSummary::sample(7, 5.0, 0.5, 12.0, 2);
        let json = serde_json::to_string(&t).unwrap();
        let back: TournamentSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
