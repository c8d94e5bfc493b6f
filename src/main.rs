//! POKERCRAFT: tournament history analyzer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! ingests every export under the configured data directories, computes
//! the performance series and the bankroll survival table, and writes the
//! report to disk.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use pokercraft::analysis::bankroll::BankrollSimulator;
use pokercraft::analysis::metrics::{career_totals, return_points, MetricsEngine};
use pokercraft::config;
use pokercraft::ingest::money::{CurrencyTable, OverrideRates};
use pokercraft::ingest::parser::SummaryParser;
use pokercraft::ingest::{crawl_files, ingest};
use pokercraft::storage::{self, AnalysisReport};
use pokercraft::types::AnalysisError;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("POKERCRAFT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        data_dirs = cfg.ingest.data_dirs.len(),
        candidates = cfg.bankroll.candidates.len(),
        "POKERCRAFT starting up"
    );

    // -- Ingest ----------------------------------------------------------

    let provider = OverrideRates::new(cfg.currency.rates.clone());
    let rates = CurrencyTable::from_provider(&provider);
    let parser = SummaryParser::new(rates)?;

    let files = crawl_files(&cfg.ingest.data_dirs, &cfg.ingest.crawl_options());
    let batch = ingest(&files, &parser, cfg.ingest.include_freerolls)
        .context("Ingestion aborted")?;

    if batch.is_empty() {
        info!(files = batch.files_seen, skipped = batch.skipped.len(), "Nothing to analyze");
        return Ok(());
    }

    // -- Metrics ---------------------------------------------------------

    let engine = MetricsEngine::new(&cfg.metrics.window_sizes);
    let series = engine.compute(&batch.summaries)?;
    let totals = career_totals(&batch.summaries);
    let returns = return_points(&batch.summaries);

    info!(
        tournaments = totals.tournaments,
        profitable = totals.profitable,
        profit = format!("${:.2}", totals.total_profit),
        rake = format!("${:.2}", totals.total_rake),
        roi = ?totals.roi,
        series_points = series.len(),
        return_points = returns.len(),
        "Performance computed"
    );

    // -- Bankroll simulation --------------------------------------------

    let simulator = BankrollSimulator::new(cfg.bankroll.simulation());
    let survival = match simulator.simulate(&batch.summaries, &cfg.bankroll.candidates) {
        Ok(table) => {
            for entry in &table.entries {
                info!(
                    bankroll = entry.bankroll,
                    survival = format!("{:.2}%", entry.survival_rate * 100.0),
                    profitable = format!("{:.2}%", entry.profitable_rate * 100.0),
                    "Bankroll survival"
                );
            }
            Some(table)
        }
        Err(AnalysisError::EmptyReturnPopulation) => {
            warn!("Only freerolls in history, skipping bankroll simulation");
            None
        }
        Err(e) => {
            error!(error = %e, "Bankroll simulation failed");
            return Err(e.into());
        }
    };

    // -- Report ----------------------------------------------------------

    let mut report = AnalysisReport::new(totals);
    report.set_series(&series, cfg.metrics.max_data_points);
    report.return_points = returns;
    report.survival = survival;
    report.skipped = batch.skipped;

    storage::save_report(&report, &cfg.output.report_path)?;
    info!(
        run_id = %report.run_id,
        path = %cfg.output.report_path.display(),
        "POKERCRAFT finished"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pokercraft=info"));

    let json_logging = std::env::var("POKERCRAFT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
