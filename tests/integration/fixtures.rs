//! Export fixtures written into temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pokercraft::ingest::money::CurrencyTable;
use pokercraft::ingest::parser::SummaryParser;
use pokercraft::types::{TournamentId, TournamentSummary};

/// One exported tournament, in USD.
#[derive(Debug, Clone)]
pub struct Export {
    pub id: u64,
    pub name: String,
    pub buy_in: f64,
    pub rake: f64,
    pub players: u32,
    pub rank: u32,
    pub prize: f64,
    /// Minutes after 2024-01-01 00:00.
    pub minute: u32,
}

impl Export {
    pub fn new(id: u64, minute: u32) -> Self {
        Self {
            id,
            name: format!("Daily Hyper {id}"),
            buy_in: 9.0,
            rake: 1.0,
            players: 50,
            rank: 20,
            prize: 0.0,
            minute,
        }
    }

    pub fn prize(mut self, prize: f64) -> Self {
        self.prize = prize;
        self
    }

    pub fn players(mut self, players: u32) -> Self {
        self.players = players;
        self
    }

    pub fn freeroll(mut self) -> Self {
        self.buy_in = 0.0;
        self.rake = 0.0;
        self
    }

    pub fn render(&self) -> String {
        let buy_in_line = if self.buy_in == 0.0 && self.rake == 0.0 {
            "Buy-in: $0".to_string()
        } else {
            format!("Buy-in: ${}+${}", self.buy_in, self.rake)
        };
        format!(
            "Tournament #{id}, {name}, Hold'em No Limit\n\
             {buy_in_line}\n\
             {players} Players\n\
             Total Prize Pool: ${pool}\n\
             Tournament started {start}\n\
             You finished the tournament in {rank}th place.\n\
             You received a total of ${prize:.2}.\n",
            id = self.id,
            name = self.name,
            players = self.players,
            pool = (self.buy_in * self.players as f64).round(),
            start = self.start_time().format("%Y/%m/%d %H:%M:%S"),
            rank = self.rank,
            prize = self.prize,
        )
    }

    pub fn start_time(&self) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t + chrono::Duration::minutes(self.minute as i64))
            .unwrap()
    }
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn write_export(dir: &Path, name: &str, export: &Export) -> PathBuf {
    write_file(dir, name, &export.render())
}

pub fn parser() -> SummaryParser {
    SummaryParser::new(CurrencyTable::default()).unwrap()
}

/// In-memory summary for simulator tests.
pub fn summary(id: u64, buy_in: f64, prize: f64, entries: u32) -> TournamentSummary {
    let export = Export::new(id, id as u32);
    TournamentSummary {
        id: TournamentId(id),
        name: export.name.clone(),
        buy_in_pure: buy_in * 0.9,
        rake: buy_in * 0.1,
        total_prize_pool: buy_in * 100.0,
        start_time: export.start_time(),
        my_rank: 10,
        total_players: 100,
        my_prize: prize,
        my_entries: entries,
    }
}
