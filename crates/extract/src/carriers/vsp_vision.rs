//! VSP Vision: lump sum reported under a fixed group name.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::RawEntry;
use crate::money::parse_amount;

pub(crate) const GROUP_NAME: &str = "VSP Vision Total";

static SUM_TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Sum total\s+([\d,]+\.\d+)").unwrap());
static NET_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Net Amount[^\d]*([\d,]+\.\d+)").unwrap());

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let Some(first) = pages.first() else {
        return Vec::new();
    };

    let amount = SUM_TOTAL_RE
        .captures(first)
        .or_else(|| NET_AMOUNT_RE.captures(first))
        .and_then(|c| parse_amount(&c[1]).ok());

    match amount {
        Some(cents) => vec![RawEntry::new(GROUP_NAME, cents)],
        None => {
            tracing::warn!("vsp vision: no 'Sum total' or 'Net Amount' on first page");
            Vec::new()
        }
    }
}
