//! American Heritage: itemized workplace cases plus a statement total.
//!
//! Group plans print a `Case <id> <GROUP NAME> ... <commission>` line.
//! Individual plans carry no group name, so whatever the statement total
//! exceeds the itemized cases by is reported as one blank-group entry.

use std::sync::LazyLock;

use regex::Regex;

use super::{page_lines, GroupTotals, RemainderPolicy};
use crate::model::RawEntry;
use crate::money::{format_cents, parse_amount};

static CASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Case\s+([A-Z0-9]+)\s+(.+?)\s+([\d,]+\.\d+)").unwrap());
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*\.\d+|\.\d+)").unwrap());
static DUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Commissions Due\s+([\d,]*\.?\d+)").unwrap());
static EARNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total Commissions Earned\s+([\d,]+\.\d+)CR").unwrap());

pub(super) fn extract(pages: &[String], policy: RemainderPolicy) -> Vec<RawEntry> {
    let mut totals = GroupTotals::default();

    for page in pages {
        for line in page_lines(page) {
            let Some(caps) = CASE_RE.captures(line) else {
                continue;
            };
            let mut group = caps[2].trim();
            if matches!(group.to_lowercase().as_str(), "name" | "case name") {
                continue;
            }
            if let Some(stripped) = group.strip_suffix(',') {
                group = stripped.trim();
            }
            // Commission is the last number on the line.
            let Some(last) = NUMBER_RE.find_iter(line).last() else {
                continue;
            };
            match parse_amount(last.as_str()) {
                Ok(cents) => {
                    tracing::debug!(group, commission = %format_cents(cents), "american heritage: case");
                    totals.add(group, cents);
                }
                Err(e) => tracing::debug!(group, error = %e, "american heritage: skipping case"),
            }
        }
    }

    let Some(statement_total) = pages.last().and_then(|p| statement_total(p)) else {
        tracing::warn!("american heritage: no statement total on last page");
        return totals.into_entries();
    };

    let remainder = statement_total - totals.total();
    match policy {
        RemainderPolicy::Drop if remainder > 1 => totals.add("", remainder),
        RemainderPolicy::Drop if remainder < 0 => tracing::warn!(
            remainder = %format_cents(remainder),
            "american heritage: itemized cases exceed statement total; remainder dropped"
        ),
        RemainderPolicy::Drop => {}
        RemainderPolicy::Signed if remainder != 0 => totals.add("", remainder),
        RemainderPolicy::Signed => {}
    }
    if remainder != 0 && totals.contains("") {
        tracing::info!(
            remainder = %format_cents(remainder),
            "american heritage: individual plans without group name"
        );
    }

    totals.into_entries()
}

/// `Commissions Due`, or when that is zero or absent,
/// `Total Commissions Earned <n>CR`.
fn statement_total(last_page: &str) -> Option<i64> {
    let due = DUE_RE
        .captures(last_page)
        .and_then(|c| parse_amount(&c[1]).ok())
        .filter(|cents| *cents != 0);
    due.or_else(|| {
        EARNED_RE
            .captures(last_page)
            .and_then(|c| parse_amount(&c[1]).ok())
    })
}
