//! Export ingestion.
//!
//! Finds export files on disk, parses them in parallel and funnels the
//! results through the `SummaryRepository`. This is the only place where
//! data-quality errors are turned into "skip the file"; invariant
//! violations abort the whole batch.

pub mod money;
pub mod parser;
pub mod repository;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::types::{SummaryError, TournamentSummary};
use parser::SummaryParser;
use repository::{without_freerolls, SummaryRepository};

// ---------------------------------------------------------------------------
// Crawling
// ---------------------------------------------------------------------------

/// Which files count as tournament exports.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub follow_symlinks: bool,
    /// Required file name prefix (e.g. "GG").
    pub file_prefix: String,
    /// Required extension, compared case-insensitively.
    pub file_extension: String,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            file_prefix: "GG".to_string(),
            file_extension: "txt".to_string(),
        }
    }
}

impl CrawlOptions {
    pub fn is_eligible(&self, path: &Path) -> bool {
        let name_ok = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&self.file_prefix))
            .unwrap_or(false);
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.file_extension))
            .unwrap_or(false);
        name_ok && ext_ok
    }
}

/// Collect eligible export files under `dirs`, in a deterministic order.
pub fn crawl_files(dirs: &[PathBuf], options: &CrawlOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            warn!(path = %dir.display(), "Data directory not found, skipping");
            continue;
        }
        let walker = WalkDir::new(dir)
            .follow_links(options.follow_symlinks)
            .sort_by_file_name();
        for entry in walker.into_iter() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && options.is_eligible(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    info!(count = files.len(), "Export files found");
    files
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// A file that was skipped because of a data error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of ingesting a batch of files.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Unique summaries in canonical order.
    pub summaries: Vec<TournamentSummary>,
    pub files_seen: usize,
    pub skipped: Vec<SkippedFile>,
    pub duplicates: usize,
    pub conflicts: usize,
    pub freerolls_dropped: usize,
}

impl IngestReport {
    /// True when no valid record survived ("nothing to analyze").
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

enum FileOutcome {
    Parsed(TournamentSummary),
    Skipped(SkippedFile),
}

/// Parse `paths` in parallel and build the deduplicated, sorted sequence.
///
/// Recoverable errors skip the file with a warning. The first invariant
/// violation aborts the batch and is returned.
pub fn ingest(
    paths: &[PathBuf],
    parser: &SummaryParser,
    include_freerolls: bool,
) -> Result<IngestReport, SummaryError> {
    let mut ordered: Vec<&PathBuf> = paths.iter().collect();
    ordered.sort();
    ordered.dedup();

    let outcomes = ordered
        .par_iter()
        .map(|path| match parser.parse_file(path) {
            Ok(summary) => Ok(FileOutcome::Parsed(summary)),
            Err(e) if e.is_recoverable() => {
                warn!(path = %path.display(), error = %e, "Skipping export file");
                Ok(FileOutcome::Skipped(SkippedFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }))
            }
            Err(e) => Err(e),
        })
        .collect::<Result<Vec<_>, SummaryError>>()?;

    let mut repo = SummaryRepository::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Parsed(summary) => {
                repo.insert(summary);
            }
            FileOutcome::Skipped(file) => skipped.push(file),
        }
    }

    let duplicates = repo.duplicates();
    let conflicts = repo.conflicts();
    let mut summaries = repo.into_sorted();
    let mut freerolls_dropped = 0;
    if !include_freerolls {
        let before = summaries.len();
        summaries = without_freerolls(summaries);
        freerolls_dropped = before - summaries.len();
    }

    info!(
        files = ordered.len(),
        summaries = summaries.len(),
        skipped = skipped.len(),
        duplicates,
        conflicts,
        freerolls_dropped,
        "Ingestion complete"
    );

    Ok(IngestReport {
        summaries,
        files_seen: ordered.len(),
        skipped,
        duplicates,
        conflicts,
        freerolls_dropped,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_by_prefix_and_extension() {
        let opts = CrawlOptions::default();
        assert!(opts.is_eligible(Path::new("/data/GG20240302 - Tournament #1.txt")));
        assert!(opts.is_eligible(Path::new("GG1.TXT")));
        assert!(!opts.is_eligible(Path::new("notes.txt")));
        assert!(!opts.is_eligible(Path::new("GG20240302.csv")));
    }

    #[test]
    fn test_crawl_missing_directory_is_empty() {
        let files = crawl_files(
            &[PathBuf::from("/nonexistent/pokercraft_dir_xyz")],
            &CrawlOptions::default(),
        );
        assert!(files.is_empty());
    }
}
