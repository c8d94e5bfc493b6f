//! Crawling, parsing and deduplication against real files.

use pokercraft::ingest::{crawl_files, ingest, CrawlOptions};
use pokercraft::types::TournamentId;
use tempfile::TempDir;

use crate::fixtures::{parser, write_export, write_file, Export};

#[test]
fn test_crawl_filters_and_recurses() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG20240101 - a.txt", &Export::new(1, 0));
    write_export(dir.path(), "2024/03/GG20240301 - b.txt", &Export::new(2, 10));
    write_export(dir.path(), "notes.txt", &Export::new(3, 20));
    write_export(dir.path(), "GG20240101.csv", &Export::new(4, 30));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("GG"))));
}

#[test]
fn test_duplicates_across_files_are_merged() {
    let dir = TempDir::new().unwrap();
    let export = Export::new(42, 0).prize(30.0);
    write_export(dir.path(), "GG-a.txt", &export);
    write_export(dir.path(), "GG-b.txt", &export);
    write_export(dir.path(), "nested/GG-c.txt", &Export::new(43, 5));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let report = ingest(&files, &parser(), true).unwrap();

    assert_eq!(report.files_seen, 3);
    assert_eq!(report.summaries.len(), 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.conflicts, 0);
}

#[test]
fn test_conflicting_duplicate_keeps_first_path() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG-1.txt", &Export::new(7, 0).prize(10.0));
    write_export(dir.path(), "GG-2.txt", &Export::new(7, 0).prize(99.0));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let report = ingest(&files, &parser(), true).unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.conflicts, 1);
    assert_eq!(report.summaries[0].my_prize, 10.0);
}

#[test]
fn test_bad_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG-good.txt", &Export::new(1, 0));
    let truncated: String = Export::new(2, 1)
        .render()
        .lines()
        .take(3)
        .map(|l| format!("{l}\n"))
        .collect();
    write_file(dir.path(), "GG-truncated.txt", &truncated);
    write_file(dir.path(), "GG-garbage.txt", "not an export at all\n");

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let report = ingest(&files, &parser(), true).unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].id, TournamentId(1));
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().any(|s| s.path.ends_with("GG-truncated.txt")));
}

#[test]
fn test_corrupt_counts_skip_only_that_file() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG-good.txt", &Export::new(1, 0));
    write_export(dir.path(), "GG-broken.txt", &Export::new(2, 1).players(0));
    let overflow = Export::new(3, 2).render().replace(
        "You received a total of",
        "You made 4294967295 re-entries.\nYou received a total of",
    );
    write_file(dir.path(), "GG-overflow.txt", &overflow);

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let report = ingest(&files, &parser(), true).unwrap();
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().all(|s| s.reason.starts_with("Malformed")));
}

#[test]
fn test_output_is_in_start_time_order() {
    let dir = TempDir::new().unwrap();
    // File names sort opposite to start times.
    write_export(dir.path(), "GG-a.txt", &Export::new(30, 300));
    write_export(dir.path(), "GG-b.txt", &Export::new(20, 200));
    write_export(dir.path(), "GG-c.txt", &Export::new(10, 100));
    // Same start time, ordered by id.
    write_export(dir.path(), "GG-d.txt", &Export::new(5, 200));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let summaries = pokercraft::ingest(&files, &parser()).unwrap();
    let ids: Vec<u64> = summaries.iter().map(|s| s.id.0).collect();
    assert_eq!(ids, vec![10, 5, 20, 30]);
}

#[test]
fn test_freerolls_dropped_on_request() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG-paid.txt", &Export::new(1, 0));
    write_export(dir.path(), "GG-free.txt", &Export::new(2, 1).freeroll().prize(2.0));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());

    let kept = ingest(&files, &parser(), true).unwrap();
    assert_eq!(kept.summaries.len(), 2);
    assert!(kept.summaries.iter().any(|s| s.is_freeroll()));

    let dropped = ingest(&files, &parser(), false).unwrap();
    assert_eq!(dropped.summaries.len(), 1);
    assert_eq!(dropped.freerolls_dropped, 1);
}

#[test]
fn test_empty_directory_is_nothing_to_analyze() {
    let dir = TempDir::new().unwrap();
    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let report = ingest(&files, &parser(), true).unwrap();
    assert!(report.is_empty());
    assert_eq!(report.files_seen, 0);
}

#[test]
fn test_metrics_over_ingested_files() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "GG-1.txt", &Export::new(1, 0).prize(30.0));
    write_export(dir.path(), "GG-2.txt", &Export::new(2, 1));
    write_export(dir.path(), "GG-3.txt", &Export::new(3, 2).prize(15.0));

    let files = crawl_files(&[dir.path().to_path_buf()], &CrawlOptions::default());
    let summaries = pokercraft::ingest(&files, &parser()).unwrap();
    let series = pokercraft::compute_metrics(&summaries, &[2]).unwrap();

    assert_eq!(series.windows, vec![0, 2]);
    let last = series.last().unwrap();
    assert_eq!(last.count, 3);
    assert!((last.profit - 5.0).abs() < 1e-9);
    assert!((last.net_profit - 15.0).abs() < 1e-9);
    assert!((last.net_rake - 3.0).abs() < 1e-9);
    assert_eq!(series.profitable_ratio(2, 0), Some(2.0 / 3.0));
    assert_eq!(series.profitable_ratio(2, 2), Some(0.5));
    assert_eq!(series.profitable_ratio(0, 2), None);
}
