//! Walks a statement directory, extracts every PDF, and attaches a state to
//! every entry.
//!
//! Per-file problems (unreadable PDF, unknown format, fallback failure) are
//! logged and contribute zero entries; they never stop the run. Only setup
//! problems such as a missing directory are returned as errors.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::carriers::ExtractOptions;
use crate::corrections::CorrectionStore;
use crate::error::ExtractError;
use crate::fallback::{self, FallbackExtractor, DEFAULT_MAX_CHARS};
use crate::matcher::StateMatcher;
use crate::model::{CommissionEntry, Extraction, ReviewItem};
use crate::money::format_cents;
use crate::pdf::PdfTextReader;
use crate::router::{self, Route};

/// Number of alternative roster matches offered per review item.
pub const REVIEW_ALTERNATIVES: usize = 3;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What happened to one statement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Carrier name, or empty when the file could not be read.
    pub carrier: String,
    pub entries: usize,
    pub failed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    pub entries: Vec<CommissionEntry>,
    /// Entries whose match score fell in the review band. Each is also
    /// present in `entries`.
    pub review: Vec<ReviewItem>,
    pub files: Vec<FileOutcome>,
}

impl ExtractionRun {
    pub fn review_keys(&self) -> HashSet<(String, String, i64)> {
        self.review
            .iter()
            .map(|item| {
                let (carrier, group, cents) = item.entry.review_key();
                (carrier.to_string(), group.to_string(), cents)
            })
            .collect()
    }

    pub fn total_cents(&self) -> i64 {
        self.entries.iter().map(|e| e.commission_cents).sum()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    reader: &'a dyn PdfTextReader,
    matcher: &'a StateMatcher,
    corrections: &'a CorrectionStore,
    fallback: Option<&'a dyn FallbackExtractor>,
    options: ExtractOptions,
    fallback_max_chars: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        reader: &'a dyn PdfTextReader,
        matcher: &'a StateMatcher,
        corrections: &'a CorrectionStore,
    ) -> Self {
        Self {
            reader,
            matcher,
            corrections,
            fallback: None,
            options: ExtractOptions::default(),
            fallback_max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_fallback(mut self, fallback: &'a dyn FallbackExtractor) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fallback_max_chars(mut self, max_chars: usize) -> Self {
        self.fallback_max_chars = max_chars;
        self
    }

    /// Extract and match every PDF under `root`.
    pub fn run(&self, root: &Path) -> Result<ExtractionRun, ExtractError> {
        let files = find_pdfs(root)?;
        tracing::info!(files = files.len(), dir = %root.display(), "scanning statements");

        let mut run = ExtractionRun::default();
        for path in files {
            tracing::info!(file = %display_name(&path), "processing");
            let outcome = match self.extract_file(&path) {
                Some(extraction) => {
                    let count = extraction.entries.len();
                    let carrier = extraction.carrier.clone();
                    self.match_into(extraction, &mut run);
                    FileOutcome {
                        path,
                        carrier,
                        entries: count,
                        failed: false,
                    }
                }
                None => FileOutcome {
                    path,
                    carrier: String::new(),
                    entries: 0,
                    failed: true,
                },
            };
            run.files.push(outcome);
        }

        tracing::info!(
            entries = run.entries.len(),
            needs_review = run.review.len(),
            total = %format_cents(run.total_cents()),
            "extraction complete"
        );
        Ok(run)
    }

    /// Route and extract one file. `None` when the file could not be read.
    pub fn extract_file(&self, path: &Path) -> Option<Extraction> {
        let pages = match self.reader.pages(path) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!(file = %display_name(path), error = %e, "cannot read statement");
                return None;
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let first_page = pages.first().map(String::as_str).unwrap_or("");

        let extraction = match router::route(&stem, first_page) {
            Route::Carrier(carrier) => Extraction {
                carrier: carrier.display_name().to_string(),
                entries: carrier.extract(&pages, &self.options),
            },
            Route::Fallback => {
                tracing::warn!(file = %display_name(path), "unknown carrier format, using fallback extractor");
                self.extract_fallback(path, &pages)
            }
        };

        if extraction.entries.is_empty() {
            tracing::warn!(
                file = %display_name(path),
                carrier = %extraction.carrier,
                "no commission entries extracted"
            );
        }
        Some(extraction)
    }

    fn extract_fallback(&self, path: &Path, pages: &[String]) -> Extraction {
        let empty = Extraction {
            carrier: fallback::UNKNOWN_CARRIER.to_string(),
            entries: Vec::new(),
        };
        let Some(service) = self.fallback else {
            tracing::error!(file = %display_name(path), "fallback extractor not configured, skipping");
            return empty;
        };
        match fallback::extract_with(service, pages, self.fallback_max_chars) {
            Ok(extraction) => {
                tracing::info!(
                    file = %display_name(path),
                    carrier = %extraction.carrier,
                    entries = extraction.entries.len(),
                    "fallback extraction"
                );
                extraction
            }
            Err(e) => {
                tracing::error!(file = %display_name(path), error = %e, "fallback extraction failed");
                empty
            }
        }
    }

    /// Attach state and confidence to each extracted entry.
    fn match_into(&self, extraction: Extraction, run: &mut ExtractionRun) {
        for raw in extraction.entries {
            let mut entry = CommissionEntry {
                carrier: extraction.carrier.clone(),
                group_name: raw.group_name,
                commission_cents: raw.commission_cents,
                state: String::new(),
                match_confidence: 0,
                user_verified: false,
            };

            if let Some(state) = self.remembered(&entry.group_name) {
                entry.state = state.to_string();
                entry.match_confidence = 100;
                run.entries.push(entry);
                continue;
            }

            let outcome = self.matcher.match_name(&entry.group_name);
            entry.state = outcome.state;
            entry.match_confidence = outcome.confidence;

            if outcome.needs_review {
                tracing::warn!(
                    group = %entry.group_name,
                    state = %entry.state,
                    confidence = entry.match_confidence,
                    "low confidence match"
                );
                run.review.push(ReviewItem {
                    id: entry.review_id(),
                    entry_index: run.entries.len(),
                    entry: entry.clone(),
                    matched_name: outcome.matched_name,
                    alternatives: self
                        .matcher
                        .alternatives(&entry.group_name, REVIEW_ALTERNATIVES),
                });
            }
            run.entries.push(entry);
        }
    }

    fn remembered(&self, group_name: &str) -> Option<&'a str> {
        if group_name.is_empty() {
            return None;
        }
        self.corrections.get(group_name)
    }
}

/// Every `.pdf` under `root`, any extension case, sorted.
pub fn find_pdfs(root: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    if !root.is_dir() {
        return Err(ExtractError::MissingDir(root.to_path_buf()));
    }
    let root_str = root
        .to_str()
        .ok_or_else(|| ExtractError::Pattern(format!("non-UTF-8 path: {}", root.display())))?;
    let pattern = format!("{}/**/*.pdf", glob::Pattern::escape(root_str));
    let options = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut files: Vec<PathBuf> = glob::glob_with(&pattern, options)
        .map_err(|e| ExtractError::Pattern(e.to_string()))?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
