//! Beam: wrapped rows.
//!
//! Two layouts appear on the same statement:
//!
//! ```text
//! Acme Corp SmartPremium Dental            <- company + product
//! BD12345 $45.10 08/01/2025                <- policy code + commission
//!
//! Runvalet Inc Select Plus                 <- company + product
//! Seattle, WA $12.00 08/01/2025            <- location + commission
//! BD54321                                  <- policy code alone
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::{page_lines, GroupTotals};
use crate::model::RawEntry;
use crate::money::parse_amount;

const SKIP_MARKERS: &[&str] = &[
    "Company name",
    "Commission statement",
    "BEAM SUPPORT",
    "Commission summary",
    "You get",
    "Group business",
];

static POLICY_LEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2}\d{5})\s").unwrap());
static POLICY_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{5}$").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$([0-9,]+\.\d+)").unwrap());
static TWO_LINE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(SmartPremium|VSP Choice Plan).*$").unwrap());
static THREE_LINE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(SmartPremium|VSP Choice Plan|25k Shelf-Rated|MAC|OON|Select|Plus|Choice).*$")
        .unwrap()
});

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let mut totals = GroupTotals::default();

    for page in pages {
        let lines = page_lines(page);
        // The last line can never start a row; a two-line row may end the page.
        for i in 0..lines.len().saturating_sub(1) {
            let line = lines[i];
            let next = lines[i + 1];
            let third = lines.get(i + 2).copied();

            if SKIP_MARKERS.iter().any(|m| line.contains(m)) {
                continue;
            }

            let suffix_re = if POLICY_LEAD_RE.is_match(next) {
                &*TWO_LINE_SUFFIX_RE
            } else if third.is_some_and(|t| POLICY_ONLY_RE.is_match(t)) {
                &*THREE_LINE_SUFFIX_RE
            } else {
                continue;
            };

            let Some(amount) = AMOUNT_RE.captures(next) else {
                continue;
            };
            let company = suffix_re.replace(line, "");
            let company = company.trim();
            if company.is_empty() {
                continue;
            }
            match parse_amount(&amount[1]) {
                Ok(cents) => totals.add(company, cents),
                Err(e) => tracing::debug!(company, error = %e, "beam: skipping row"),
            }
        }
    }

    totals.into_entries()
}
