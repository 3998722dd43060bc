//! Month-scoped directory layout.
//!
//! ```text
//! <data_dir>/<YYYY-MM>/commission_statements/**/*.pdf
//! <data_dir>/<YYYY-MM>/bank_statement/*.pdf
//! <output_dir>/<YYYY-MM>/{commission_output.csv, needs_review.csv, ...}
//! ```

use std::path::{Path, PathBuf};

use crate::settings::Settings;

pub const COMMISSION_CSV: &str = "commission_output.csv";
pub const NEEDS_REVIEW_CSV: &str = "needs_review.csv";
pub const ALL_DATA_JSON: &str = "all_commission_data.json";
pub const STATE_SUMMARY_CSV: &str = "state_summary.csv";
pub const RECONCILIATION_CSV: &str = "reconciliation.csv";
pub const REPORT_HTML: &str = "report.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPaths {
    pub month: String,
    pub statements_dir: PathBuf,
    pub bank_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl MonthPaths {
    /// `month` is a `YYYY-MM` label; it is used verbatim as a directory name.
    pub fn new(settings: &Settings, month: &str) -> Self {
        let data = settings.paths.data_dir.join(month);
        Self {
            month: month.to_string(),
            statements_dir: data.join("commission_statements"),
            bank_dir: data.join("bank_statement"),
            output_dir: settings.paths.output_dir.join(month),
        }
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn commission_csv(&self) -> PathBuf {
        self.output_file(COMMISSION_CSV)
    }

    pub fn needs_review_csv(&self) -> PathBuf {
        self.output_file(NEEDS_REVIEW_CSV)
    }

    pub fn all_data_json(&self) -> PathBuf {
        self.output_file(ALL_DATA_JSON)
    }

    pub fn state_summary_csv(&self) -> PathBuf {
        self.output_file(STATE_SUMMARY_CSV)
    }

    pub fn reconciliation_csv(&self) -> PathBuf {
        self.output_file(RECONCILIATION_CSV)
    }

    pub fn report_html(&self) -> PathBuf {
        self.output_file(REPORT_HTML)
    }

    /// The first PDF in the bank statement directory, by name.
    pub fn find_bank_statement(&self) -> Option<PathBuf> {
        first_pdf(&self.bank_dir)
    }
}

fn first_pdf(dir: &Path) -> Option<PathBuf> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    if pdfs.len() > 1 {
        tracing::warn!(
            dir = %dir.display(),
            count = pdfs.len(),
            "several bank statements found, using the first"
        );
    }
    pdfs.into_iter().next()
}
