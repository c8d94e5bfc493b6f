//! Money tokens and USD normalisation.
//!
//! A money token is a currency symbol immediately followed by a number
//! with `,` thousands separators and an optional fraction (`$1,234.50`).
//! Rates come from a `CurrencyTable`: the static defaults, optionally
//! overridden by whatever a `RateProvider` hands over at startup.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::{Currency, SummaryError};

// ---------------------------------------------------------------------------
// Rate providers
// ---------------------------------------------------------------------------

/// Source of live exchange rates (units per USD).
///
/// Fetching happens outside the core; the parser only ever sees the
/// resulting read-only table.
#[cfg_attr(test, mockall::automock)]
pub trait RateProvider: Send + Sync {
    /// Rates this provider knows about. Missing currencies keep defaults.
    fn rates(&self) -> Result<HashMap<Currency, f64>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Provider returning the built-in table.
pub struct StaticRates;

impl RateProvider for StaticRates {
    fn rates(&self) -> Result<HashMap<Currency, f64>> {
        Ok(Currency::ALL.iter().map(|c| (*c, c.default_rate())).collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Provider backed by a symbol → rate map, e.g. the `[currency.rates]`
/// section of the config file.
pub struct OverrideRates {
    by_symbol: HashMap<String, f64>,
}

impl OverrideRates {
    pub fn new(by_symbol: HashMap<String, f64>) -> Self {
        Self { by_symbol }
    }
}

impl RateProvider for OverrideRates {
    /// Unknown symbols are skipped with a warning; the rest still apply.
    fn rates(&self) -> Result<HashMap<Currency, f64>> {
        let mut out = HashMap::new();
        for (symbol, rate) in &self.by_symbol {
            let mut chars = symbol.chars();
            let currency = match (chars.next(), chars.next()) {
                (Some(c), None) => Currency::from_symbol(c),
                _ => None,
            };
            match currency {
                Some(currency) => {
                    out.insert(currency, *rate);
                }
                None => warn!(symbol = %symbol, "Unknown currency symbol in rate override, skipping"),
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "override"
    }
}

// ---------------------------------------------------------------------------
// Currency table
// ---------------------------------------------------------------------------

/// Immutable currency → units-per-USD table.
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    rates: HashMap<Currency, f64>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self {
            rates: Currency::ALL.iter().map(|c| (*c, c.default_rate())).collect(),
        }
    }
}

impl CurrencyTable {
    /// Defaults with individual rates replaced. Non-positive or non-finite
    /// overrides are ignored.
    pub fn with_overrides(overrides: &HashMap<Currency, f64>) -> Self {
        let mut table = Self::default();
        for (currency, rate) in overrides {
            if rate.is_finite() && *rate > 0.0 {
                table.rates.insert(*currency, *rate);
            } else {
                warn!(currency = %currency, rate, "Ignoring invalid rate override");
            }
        }
        table
    }

    /// Build from a provider, falling back to defaults when it fails.
    pub fn from_provider(provider: &dyn RateProvider) -> Self {
        match provider.rates() {
            Ok(rates) => {
                debug!(provider = provider.name(), count = rates.len(), "Rates loaded");
                Self::with_overrides(&rates)
            }
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    error = %e,
                    "Rate provider failed, using default rates"
                );
                Self::default()
            }
        }
    }

    pub fn rate(&self, currency: Currency) -> f64 {
        self.rates
            .get(&currency)
            .copied()
            .unwrap_or_else(|| currency.default_rate())
    }

    /// Convert an amount in `currency` into USD.
    pub fn to_usd(&self, currency: Currency, amount: f64) -> f64 {
        amount / self.rate(currency)
    }
}

// ---------------------------------------------------------------------------
// Token scanning
// ---------------------------------------------------------------------------

/// A money token found on a line, amount still in its own currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoneyToken {
    pub currency: Currency,
    pub amount: f64,
}

/// Compiled money-token grammar.
#[derive(Debug, Clone)]
pub struct MoneyScanner {
    pattern: Regex,
}

impl MoneyScanner {
    pub fn new() -> Result<Self> {
        // Any currency symbol is captured so unknown ones can be reported
        // instead of silently skipped.
        let pattern = Regex::new(r"(\p{Sc})(\d(?:\d|,\d)*(?:\.[\d,]+)?)")
            .context("Failed to compile money pattern")?;
        Ok(Self { pattern })
    }

    /// All money tokens on `text`, in order of appearance.
    pub fn scan(&self, text: &str, line: usize) -> Result<Vec<MoneyToken>, SummaryError> {
        self.pattern
            .captures_iter(text)
            .map(|caps| -> Result<MoneyToken, SummaryError> {
                let symbol = caps[1].chars().next().unwrap_or_default();
                let currency = Currency::from_symbol(symbol)
                    .ok_or(SummaryError::UnknownCurrency { line, symbol })?;
                let digits = caps[2].replace(',', "");
                let amount = digits
                    .parse::<f64>()
                    .ok()
                    .filter(|a| a.is_finite())
                    .ok_or_else(|| SummaryError::MalformedField {
                        field: "money",
                        line,
                        content: caps[0].to_string(),
                    })?;
                Ok(MoneyToken { currency, amount })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
