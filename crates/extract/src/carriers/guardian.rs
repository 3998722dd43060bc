//! Guardian: lump sum only. The statement total on the first page becomes a
//! single entry with no group name.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::RawEntry;
use crate::money::parse_amount;

static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Guardian Life Total\s+\$[\d,]+\.\d+\s+\$[\d,]+\.\d+\s+\$([0-9,]+\.\d+)").unwrap()
});

pub(super) fn extract(pages: &[String]) -> Vec<RawEntry> {
    let Some(first) = pages.first() else {
        return Vec::new();
    };

    match TOTAL_RE.captures(first).map(|c| parse_amount(&c[1])) {
        Some(Ok(cents)) => vec![RawEntry::new("", cents)],
        Some(Err(e)) => {
            tracing::warn!(error = %e, "guardian: unreadable total");
            Vec::new()
        }
        None => {
            tracing::warn!("guardian: could not find 'Guardian Life Total'");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_total_from_first_page() {
        let pages = vec![
            "\
                 The Guardian Life Insurance Company of America
   Producer Commission Statement                         Period Ending 08/31/2025

   Company                      Premium          Adjustments       Commission
   Guardian Life Total          $6,250.00        $0.00             $500.00
"
            .to_string(),
            "Guardian Life Total $1.00 $1.00 $9,999.99".to_string(),
        ];
        assert_eq!(extract(&pages), vec![RawEntry::new("", 50000)]);
    }

    #[test]
    fn missing_total_yields_nothing() {
        assert!(extract(&["Guardian statement, no totals".to_string()]).is_empty());
        assert!(extract(&[]).is_empty());
    }
}
