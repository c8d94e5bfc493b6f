//! Integration tests: export files on disk through ingestion, metrics and
//! the bankroll simulator.

mod fixtures;
mod ingest_pipeline;
mod simulation;
