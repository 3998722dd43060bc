//! Choice Builder: policy blocks that can span pages.
//!
//! `Policy Number: B14838` opens a block. The company name is either printed
//! ahead of the first product line or on a line of its own. Product lines
//! carry `Mon YYYY <Product> $amount`, with chargebacks as `($amount)`.

use std::sync::LazyLock;

use regex::Regex;

use super::{page_lines, GroupTotals};
use crate::model::RawEntry;
use crate::money::parse_amount;

static POLICY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Policy Number:\s+[A-Z]\d+").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{4}\s+(Dental|Vision|Life|Chiropractic|Medical)\s+\$([0-9,]+\.\d+)",
    )
    .unwrap()
});
static CHARGEBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{4}\s+(Dental|Vision|Life|Chiropractic|Medical)\s+\(\$([0-9,]+\.\d+)\)",
    )
    .unwrap()
});
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(CompanyName|PaidMonth|Product|Comm Amount|ADJCD|Page \d)").unwrap());

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let mut totals = GroupTotals::default();
    let mut current: Option<String> = None;
    let mut looking_for_company = false;

    for page in pages {
        for line in page_lines(page) {
            if POLICY_RE.is_match(line) {
                looking_for_company = true;
                current = None;
                continue;
            }

            if let Some((start, cents)) = product_line(line) {
                if looking_for_company {
                    let prefix = line[..start].trim();
                    if !prefix.is_empty() {
                        current = Some(prefix.to_string());
                        looking_for_company = false;
                    }
                }
                match &current {
                    Some(company) => totals.add(company, cents),
                    None => tracing::debug!(line, "choice builder: product line outside a policy block"),
                }
            } else if looking_for_company && !HEADER_RE.is_match(line) {
                current = Some(line.to_string());
                looking_for_company = false;
            }
        }
    }

    totals.into_entries()
}

/// Byte offset where the product columns begin, and the signed amount.
fn product_line(line: &str) -> Option<(usize, i64)> {
    if let Some(caps) = AMOUNT_RE.captures(line) {
        let cents = parse_amount(&caps[3]).ok()?;
        return Some((caps.get(0)?.start(), cents));
    }
    let caps = CHARGEBACK_RE.captures(line)?;
    let cents = parse_amount(&caps[3]).ok()?;
    Some((caps.get(0)?.start(), -cents))
}
