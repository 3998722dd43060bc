//! Allied: one row per group on a single line.
//!
//! `A10234  Acme Widgets Inc  01/01/2025  12/31/2025  $1,200.00  $1,180.00  10.00%  12  $118.00`

use std::sync::LazyLock;

use regex::Regex;

use super::GroupTotals;
use crate::model::RawEntry;
use crate::money::parse_amount;

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Z]\d+)\s+(.+?)\s+\d+/\d+/\d+\s+\d+/\d+/\d+\s+\$[\d,]+\.\d+\s+\$[\d,]+\.\d+\s+[\d.]+%.*?\s+\d+\s+\$([0-9,]+\.\d+)",
    )
    .unwrap()
});

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let mut totals = GroupTotals::default();

    for page in pages {
        for caps in ROW_RE.captures_iter(page) {
            let group = caps[2].trim();
            match parse_amount(&caps[3]) {
                Ok(cents) => totals.add(group, cents),
                Err(e) => tracing::debug!(group, error = %e, "allied: skipping row"),
            }
        }
    }

    totals.into_entries()
}
