//! Cal Choice: `<group no> <company> DD-Mon <product> <premium> <rate> <commission>`,
//! with continuation lines (`DD-Mon <product> ...`) belonging to the company
//! above them.

use std::sync::LazyLock;

use regex::Regex;

use super::{page_lines, GroupTotals};
use crate::model::RawEntry;
use crate::money::parse_amount;

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)\s+(.+?)\s+\d{2}-(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(Medical|Dental|Vision|Life)\s+[\d,.-]+\s+[\d.]+\s+([-\d,]+\.\d+)",
    )
    .unwrap()
});
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{2}-(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(Medical|Dental|Vision|Life)\s+[\d,.-]+\s+[\d.]+\s+([-\d,]+\.\d+)",
    )
    .unwrap()
});

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let mut totals = GroupTotals::default();
    let mut current: Option<String> = None;

    for page in pages {
        for line in page_lines(page) {
            if let Some(caps) = ROW_RE.captures(line) {
                let company = caps[2].trim().to_string();
                match parse_amount(&caps[5]) {
                    Ok(cents) => totals.add(&company, cents),
                    Err(e) => tracing::debug!(company = %company, error = %e, "cal choice: skipping row"),
                }
                current = Some(company);
            } else if let Some(caps) = CONTINUATION_RE.captures(line) {
                let Some(company) = &current else {
                    continue;
                };
                match parse_amount(&caps[3]) {
                    Ok(cents) => totals.add(company, cents),
                    Err(e) => tracing::debug!(company = %company, error = %e, "cal choice: skipping continuation"),
                }
            }
        }
    }

    totals.into_entries()
}
