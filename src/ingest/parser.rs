//! Tournament summary parser.
//!
//! One export file holds one tournament. The parser walks the file line by
//! line, classifies each line against an ordered rule table and folds the
//! extracted values into a `SummaryBuilder`. Lines matching no rule are
//! ignored; the record is only returned once every required field is set.
//!
//! Example export (fields may come in any order, older exports split the
//! rank and prize over two lines):
//!
//! ```text
//! Tournament #158238418, Bounty Hunters $10.80, Hold'em No Limit
//! Buy-in: $5+$0.8+$5
//! 173 Players
//! Total Prize Pool: $1,730
//! Tournament started 2024/03/02 19:00:00
//! 12th : Hero, $21.40 + $15.00
//! You made 1 re-entry and received a total of $36.40.
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use tracing::debug;

use super::money::{CurrencyTable, MoneyScanner, MoneyToken};
use crate::types::{Currency, SummaryError, TournamentId, TournamentSummary};

const START_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Line rules
// ---------------------------------------------------------------------------

/// Recognized line kinds, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    BuyIn,
    Entrants,
    PrizePool,
    StartTime,
    HeroRankPrize,
    FinishedRank,
    ReEntry,
    ReceivedPrize,
}

struct LineRule {
    kind: LineKind,
    pattern: Regex,
}

const RULES: &[(LineKind, &str)] = &[
    (LineKind::Header, r"^Tournament #(\d+), (.+), ([^,]+)$"),
    (LineKind::BuyIn, r"^Buy-in: "),
    (LineKind::Entrants, r"^\d[\d,]* Players"),
    (LineKind::PrizePool, r"^Total Prize Pool: "),
    (LineKind::StartTime, r"^Tournament started "),
    (LineKind::HeroRankPrize, r"^\d+(?:st|nd|rd|th) : Hero\b"),
    (LineKind::FinishedRank, r"^You finished the tournament in \d+(?:st|nd|rd|th)"),
    (LineKind::ReEntry, r"^You made \d+ re-entr(?:y|ies)"),
    (LineKind::ReceivedPrize, r"^You received a total of "),
];

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Per-file parse state. Monetary fields are already in USD.
#[derive(Debug, Default)]
struct SummaryBuilder {
    id: Option<TournamentId>,
    name: Option<String>,
    buy_in: Option<(f64, f64)>,
    total_prize_pool: Option<f64>,
    start_time: Option<NaiveDateTime>,
    my_rank: Option<u32>,
    total_players: Option<u32>,
    my_prize: Option<f64>,
    reentries: u32,
    /// Fixed by the first money token outside the header.
    currency: Option<Currency>,
}

impl SummaryBuilder {
    fn lock_currency(&mut self, tokens: &[MoneyToken], line: usize) -> Result<(), SummaryError> {
        for token in tokens {
            match self.currency {
                None => self.currency = Some(token.currency),
                Some(expected) if expected != token.currency => {
                    return Err(SummaryError::CurrencyMismatch {
                        line,
                        expected,
                        found: token.currency,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<TournamentSummary, SummaryError> {
        let mut missing = Vec::new();
        if self.id.is_none() || self.name.is_none() {
            missing.push("header");
        }
        if self.buy_in.is_none() {
            missing.push("buy-in");
        }
        if self.total_players.is_none() {
            missing.push("entrants");
        }
        if self.total_prize_pool.is_none() {
            missing.push("prize pool");
        }
        if self.start_time.is_none() {
            missing.push("start time");
        }
        if self.my_rank.is_none() {
            missing.push("rank");
        }
        if self.my_prize.is_none() {
            missing.push("prize");
        }

        match (
            self.id,
            self.name,
            self.buy_in,
            self.total_prize_pool,
            self.start_time,
            self.my_rank,
            self.total_players,
            self.my_prize,
        ) {
            (
                Some(id),
                Some(name),
                Some((buy_in_pure, rake)),
                Some(total_prize_pool),
                Some(start_time),
                Some(my_rank),
                Some(total_players),
                Some(my_prize),
            ) => Ok(TournamentSummary {
                id,
                name,
                buy_in_pure,
                rake,
                total_prize_pool,
                start_time,
                my_rank,
                total_players,
                my_prize,
                my_entries: self.reentries.saturating_add(1),
            }),
            _ => Err(SummaryError::IncompleteRecord { missing }),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parses export text into `TournamentSummary` values.
///
/// Built once at startup and shared by reference across worker threads;
/// it holds no per-file state.
pub struct SummaryParser {
    rules: Vec<LineRule>,
    money: MoneyScanner,
    int_pattern: Regex,
    time_pattern: Regex,
    rates: CurrencyTable,
}

impl SummaryParser {
    pub fn new(rates: CurrencyTable) -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern)
                    .map(|pattern| LineRule { kind: *kind, pattern })
                    .with_context(|| format!("Failed to compile {kind:?} pattern"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            money: MoneyScanner::new()?,
            int_pattern: Regex::new(r"\d+(?:,\d{3})*").context("Failed to compile int pattern")?,
            time_pattern: Regex::new(r"\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}")
                .context("Failed to compile start time pattern")?,
            rates,
        })
    }

    /// The currency table amounts are normalised with.
    pub fn rates(&self) -> &CurrencyTable {
        &self.rates
    }

    /// Which rule, if any, claims this line.
    pub fn classify(&self, line: &str) -> Option<LineKind> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(line))
            .map(|rule| rule.kind)
    }

    /// Read and parse one export file.
    pub fn parse_file(&self, path: &Path) -> Result<TournamentSummary, SummaryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SummaryError::UnreadableFile(format!("{}: {e}", path.display())))?;
        self.parse(&text)
    }

    /// Parse the full text of one export.
    pub fn parse(&self, text: &str) -> Result<TournamentSummary, SummaryError> {
        let text = text.trim_start_matches('\u{feff}');
        let mut builder = SummaryBuilder::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(kind) = self.classify(line) {
                self.extract(kind, line, idx + 1, &mut builder)?;
            }
        }

        let summary = builder.finish()?;
        summary.validate()?;
        debug!(id = %summary.id, name = %summary.name, "Summary parsed");
        Ok(summary)
    }

    fn extract(
        &self,
        kind: LineKind,
        line: &str,
        line_no: usize,
        builder: &mut SummaryBuilder,
    ) -> Result<(), SummaryError> {
        let amounts = self.amounts(kind, line, line_no, builder)?;

        match kind {
            LineKind::Header => self.extract_header(line, line_no, builder)?,
            LineKind::BuyIn => {
                let mut sorted = amounts;
                sorted.sort_by(f64::total_cmp);
                let (rake, rest) = sorted
                    .split_first()
                    .ok_or_else(|| malformed("buy-in", line, line_no))?;
                builder.buy_in = Some((rest.iter().sum(), *rake));
            }
            LineKind::Entrants => {
                builder.total_players = Some(self.positive_int(line, line_no, "entrants")?);
            }
            LineKind::PrizePool => {
                let pool = amounts
                    .first()
                    .ok_or_else(|| malformed("prize pool", line, line_no))?;
                builder.total_prize_pool = Some(*pool);
            }
            LineKind::StartTime => {
                let stamp = self
                    .time_pattern
                    .find(line)
                    .ok_or_else(|| malformed("start time", line, line_no))?;
                let parsed = NaiveDateTime::parse_from_str(stamp.as_str(), START_TIME_FORMAT)
                    .map_err(|_| malformed("start time", line, line_no))?;
                builder.start_time = Some(parsed);
            }
            LineKind::HeroRankPrize => {
                builder.my_rank = Some(self.positive_int(line, line_no, "rank")?);
                builder.my_prize = Some(amounts.iter().sum());
            }
            LineKind::FinishedRank => {
                builder.my_rank = Some(self.positive_int(line, line_no, "rank")?);
            }
            LineKind::ReEntry => {
                let count = self.first_int(line, line_no, "re-entries")?;
                // reentries + 1 must still fit the entry count
                builder.reentries = builder
                    .reentries
                    .checked_add(count)
                    .filter(|n| n.checked_add(1).is_some())
                    .ok_or_else(|| malformed("re-entries", line, line_no))?;
                if !amounts.is_empty() {
                    builder.my_prize = Some(amounts.iter().sum());
                }
            }
            LineKind::ReceivedPrize => {
                if amounts.is_empty() {
                    return Err(malformed("prize", line, line_no));
                }
                builder.my_prize = Some(amounts.iter().sum());
            }
        }
        Ok(())
    }

    /// Money on a non-header line, in USD, after locking the file currency.
    /// The header is free text and never scanned.
    fn amounts(
        &self,
        kind: LineKind,
        line: &str,
        line_no: usize,
        builder: &mut SummaryBuilder,
    ) -> Result<Vec<f64>, SummaryError> {
        if kind == LineKind::Header {
            return Ok(Vec::new());
        }
        let tokens = self.money.scan(line, line_no)?;
        builder.lock_currency(&tokens, line_no)?;
        Ok(tokens
            .iter()
            .map(|t| self.rates.to_usd(t.currency, t.amount))
            .collect())
    }

    fn extract_header(
        &self,
        line: &str,
        line_no: usize,
        builder: &mut SummaryBuilder,
    ) -> Result<(), SummaryError> {
        let caps = self.rules[0]
            .pattern
            .captures(line)
            .ok_or_else(|| malformed("header", line, line_no))?;
        let id = caps[1]
            .parse::<u64>()
            .map_err(|_| malformed("tournament id", line, line_no))?;
        builder.id = Some(TournamentId(id));
        builder.name = Some(caps[2].trim().to_string());
        Ok(())
    }

    /// Counts and ranks read from the file; zero is a malformed value there.
    fn positive_int(&self, line: &str, line_no: usize, field: &'static str) -> Result<u32, SummaryError> {
        match self.first_int(line, line_no, field)? {
            0 => Err(malformed(field, line, line_no)),
            n => Ok(n),
        }
    }

    fn first_int(&self, line: &str, line_no: usize, field: &'static str) -> Result<u32, SummaryError> {
        self.int_pattern
            .find(line)
            .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
            .ok_or_else(|| malformed(field, line, line_no))
    }
}

fn malformed(field: &'static str, line: &str, line_no: usize) -> SummaryError {
    SummaryError::MalformedField {
        field,
        line: line_no,
        content: line.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
