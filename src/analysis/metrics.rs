//! Historical performance metrics.
//!
//! Computes, for every tournament in canonical order, the cumulative net
//! profit and rake plus windowed aggregates (profitable ratio and average
//! buy-in) over the last `w` tournaments. Window `0` is the expanding
//! "since the beginning" aggregate.
//!
//! Everything is done in one pass: running sums for the expanding window
//! and a bounded queue per fixed window.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::types::{AnalysisError, TournamentId, TournamentSummary};

/// Default trailing window sizes.
pub const DEFAULT_WINDOW_SIZES: &[usize] = &[50, 100, 200, 400, 800];

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Aggregates at one position of the ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricPoint {
    /// 1-based tournament count.
    pub count: usize,
    pub id: TournamentId,
    pub name: String,
    pub start_time: NaiveDateTime,
    pub profit: f64,
    pub rake_paid: f64,
    pub buy_in: f64,
    pub net_profit: f64,
    pub net_rake: f64,
    /// What net profit would have been without rake.
    pub ideal_profit: f64,
    /// Aligned with `MetricsSeries::windows`; `None` until the window fills.
    pub profitable_ratio: Vec<Option<f64>>,
    /// Aligned with `MetricsSeries::windows`; `None` until the window fills.
    pub avg_buy_in: Vec<Option<f64>>,
}

/// Full per-tournament series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSeries {
    /// Window sizes, ascending, always starting with `0`.
    pub windows: Vec<usize>,
    pub points: Vec<MetricPoint>,
}

impl MetricsSeries {
    fn window_slot(&self, window: usize) -> Option<usize> {
        self.windows.iter().position(|w| *w == window)
    }

    /// Profitable ratio at `index` for `window`, if defined there.
    pub fn profitable_ratio(&self, index: usize, window: usize) -> Option<f64> {
        let slot = self.window_slot(window)?;
        self.points.get(index)?.profitable_ratio[slot]
    }

    /// Average buy-in at `index` for `window`, if defined there.
    pub fn avg_buy_in(&self, index: usize, window: usize) -> Option<f64> {
        let slot = self.window_slot(window)?;
        self.points.get(index)?.avg_buy_in[slot]
    }

    pub fn last(&self) -> Option<&MetricPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every `ceil(len / max_points)`-th point, for charting long histories.
    pub fn downsample(&self, max_points: usize) -> Vec<&MetricPoint> {
        let stride = if max_points == 0 {
            1
        } else {
            self.points.len().div_ceil(max_points).max(1)
        };
        self.points.iter().step_by(stride).collect()
    }
}

/// Totals over the whole history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerTotals {
    pub tournaments: usize,
    pub profitable: usize,
    pub total_profit: f64,
    pub total_rake: f64,
    /// Money spent on entries.
    pub total_spent: f64,
    /// `total_profit / total_spent`; `None` when nothing was spent.
    pub roi: Option<f64>,
}

/// One point of the relative-prize scatter (non-freerolls only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub id: TournamentId,
    pub name: String,
    pub buy_in: f64,
    /// Prize divided by a single buy-in.
    pub relative_prize: f64,
    /// Share of the prize pool won; `None` for an empty pool.
    pub prize_ratio: Option<f64>,
    pub total_players: u32,
    pub profitable: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Running state for one fixed trailing window.
struct TrailingWindow {
    size: usize,
    recent: VecDeque<(bool, f64)>,
    profitable: usize,
    buy_in_sum: f64,
}

impl TrailingWindow {
    fn new(size: usize) -> Self {
        Self {
            size,
            recent: VecDeque::with_capacity(size + 1),
            profitable: 0,
            buy_in_sum: 0.0,
        }
    }

    fn push(&mut self, profitable: bool, buy_in: f64) {
        self.recent.push_back((profitable, buy_in));
        self.profitable += profitable as usize;
        self.buy_in_sum += buy_in;
        if self.recent.len() > self.size {
            if let Some((old_profitable, old_buy_in)) = self.recent.pop_front() {
                self.profitable -= old_profitable as usize;
                self.buy_in_sum -= old_buy_in;
            }
        }
    }

    fn profitable_ratio(&self) -> Option<f64> {
        (self.recent.len() == self.size).then(|| self.profitable as f64 / self.size as f64)
    }

    fn avg_buy_in(&self) -> Option<f64> {
        (self.recent.len() == self.size).then(|| self.buy_in_sum / self.size as f64)
    }
}

pub struct MetricsEngine {
    windows: Vec<usize>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZES)
    }
}

impl MetricsEngine {
    /// Window sizes are sorted and deduplicated; `0` is always included.
    pub fn new(window_sizes: &[usize]) -> Self {
        let mut windows: Vec<usize> = window_sizes.to_vec();
        windows.push(0);
        windows.sort_unstable();
        windows.dedup();
        Self { windows }
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Compute the series over summaries in canonical order.
    ///
    /// Fails on empty input or on input that is not strictly ordered by
    /// `(start_time, id)`; both mean ingestion went wrong upstream.
    pub fn compute(&self, summaries: &[TournamentSummary]) -> Result<MetricsSeries, AnalysisError> {
        if summaries.is_empty() {
            return Err(AnalysisError::EmptyInput("no tournaments for metrics".into()));
        }
        if let Some(i) = summaries
            .windows(2)
            .position(|pair| pair[0].sorting_key() >= pair[1].sorting_key())
        {
            return Err(AnalysisError::UnorderedInput(i + 1));
        }

        let mut trailing: Vec<TrailingWindow> = self
            .windows
            .iter()
            .filter(|w| **w > 0)
            .map(|w| TrailingWindow::new(*w))
            .collect();

        let mut net_profit = 0.0;
        let mut net_rake = 0.0;
        let mut profitable_total = 0usize;
        let mut buy_in_total = 0.0;
        let mut points = Vec::with_capacity(summaries.len());

        for (i, t) in summaries.iter().enumerate() {
            let count = i + 1;
            let profit = t.profit();
            let rake_paid = t.rake_paid();
            let buy_in = t.buy_in();
            let profitable = profit > 0.0;

            net_profit += profit;
            net_rake += rake_paid;
            profitable_total += profitable as usize;
            buy_in_total += buy_in;

            let mut profitable_ratio = Vec::with_capacity(self.windows.len());
            let mut avg_buy_in = Vec::with_capacity(self.windows.len());
            profitable_ratio.push(Some(profitable_total as f64 / count as f64));
            avg_buy_in.push(Some(buy_in_total / count as f64));
            for window in trailing.iter_mut() {
                window.push(profitable, buy_in);
                profitable_ratio.push(window.profitable_ratio());
                avg_buy_in.push(window.avg_buy_in());
            }

            points.push(MetricPoint {
                count,
                id: t.id,
                name: t.name.clone(),
                start_time: t.start_time,
                profit,
                rake_paid,
                buy_in,
                net_profit,
                net_rake,
                ideal_profit: net_profit + net_rake,
                profitable_ratio,
                avg_buy_in,
            });
        }

        debug!(points = points.len(), windows = ?self.windows, "Metrics computed");
        Ok(MetricsSeries {
            windows: self.windows.clone(),
            points,
        })
    }
}

/// Whole-history totals.
pub fn career_totals(summaries: &[TournamentSummary]) -> CareerTotals {
    let mut totals = CareerTotals {
        tournaments: summaries.len(),
        ..CareerTotals::default()
    };
    for t in summaries {
        let profit = t.profit();
        totals.profitable += (profit > 0.0) as usize;
        totals.total_profit += profit;
        totals.total_rake += t.rake_paid();
        totals.total_spent += t.buy_in() * t.my_entries as f64;
    }
    totals.roi = (totals.total_spent > 0.0).then(|| totals.total_profit / totals.total_spent);
    totals
}

/// Relative-prize scatter points for non-freeroll tournaments.
pub fn return_points(summaries: &[TournamentSummary]) -> Vec<ReturnPoint> {
    summaries
        .iter()
        .filter(|t| !t.is_freeroll())
        .map(|t| ReturnPoint {
            id: t.id,
            name: t.name.clone(),
            buy_in: t.buy_in(),
            relative_prize: t.my_prize / t.buy_in(),
            prize_ratio: (t.total_prize_pool > 0.0).then(|| t.my_prize / t.total_prize_pool),
            total_players: t.total_players,
            profitable: t.profit() > 0.0,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
