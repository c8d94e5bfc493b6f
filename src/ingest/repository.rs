//! Summary repository.
//!
//! Collects parsed summaries from many (possibly overlapping) export files,
//! keeps one record per `TournamentId` and hands them back in canonical
//! `(start_time, id)` order.
//!
//! Conflict policy: first seen wins. Callers feed summaries in a
//! deterministic order (sorted file paths), so the kept record is stable
//! across runs. A later duplicate whose fields differ is counted and logged.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::{TournamentId, TournamentSummary};

#[derive(Debug, Default)]
pub struct SummaryRepository {
    by_id: HashMap<TournamentId, TournamentSummary>,
    duplicates: usize,
    conflicts: usize,
}

impl SummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a summary. Returns false if its id was already present.
    pub fn insert(&mut self, summary: TournamentSummary) -> bool {
        match self.by_id.entry(summary.key()) {
            Entry::Vacant(slot) => {
                slot.insert(summary);
                true
            }
            Entry::Occupied(kept) => {
                self.duplicates += 1;
                if kept.get() != &summary {
                    self.conflicts += 1;
                    warn!(
                        id = %summary.id,
                        kept = %kept.get(),
                        dropped = %summary,
                        "Conflicting duplicate summary, keeping first seen"
                    );
                } else {
                    debug!(id = %summary.id, "Duplicate summary dropped");
                }
                false
            }
        }
    }

    pub fn get(&self, id: TournamentId) -> Option<&TournamentSummary> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of dropped duplicates (identical or not).
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of dropped duplicates whose fields differed from the kept one.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Unique summaries in canonical order.
    pub fn into_sorted(self) -> Vec<TournamentSummary> {
        let mut summaries: Vec<_> = self.by_id.into_values().collect();
        summaries.sort_by(|a, b| a.sorting_key().cmp(&b.sorting_key()));
        summaries
    }
}

impl Extend<TournamentSummary> for SummaryRepository {
    fn extend<I: IntoIterator<Item = TournamentSummary>>(&mut self, iter: I) {
        for summary in iter {
            self.insert(summary);
        }
    }
}

impl FromIterator<TournamentSummary> for SummaryRepository {
    fn from_iter<I: IntoIterator<Item = TournamentSummary>>(iter: I) -> Self {
        let mut repo = Self::new();
        repo.extend(iter);
        repo
    }
}

/// Drop zero buy-in tournaments.
pub fn without_freerolls(summaries: Vec<TournamentSummary>) -> Vec<TournamentSummary> {
    summaries.into_iter().filter(|s| !s.is_freeroll()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
