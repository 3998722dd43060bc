use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::CommissionEntry;

/// Label for entries that carry no state.
pub const NO_STATE: &str = "NO STATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTotal {
    pub state: String,
    pub total_cents: i64,
    /// Share of the grand total in hundredths of a percent.
    pub basis_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    /// Descending by total; ties by state code.
    pub rows: Vec<StateTotal>,
    pub grand_total_cents: i64,
}

/// Group entries by state and compute each state's share of the total.
/// A grand total of zero or less gives every row 0%.
pub fn summarize_by_state(entries: &[CommissionEntry]) -> StateSummary {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for entry in entries {
        let state = entry.state.trim();
        let state = if state.is_empty() { NO_STATE } else { state };
        *totals.entry(state).or_insert(0) += entry.commission_cents;
    }

    let grand_total_cents: i64 = totals.values().sum();

    let mut rows: Vec<StateTotal> = totals
        .into_iter()
        .map(|(state, total_cents)| StateTotal {
            state: state.to_string(),
            total_cents,
            basis_points: share_basis_points(total_cents, grand_total_cents),
        })
        .collect();
    // BTreeMap order already breaks ties by state; the sort is stable.
    rows.sort_by(|a, b| b.total_cents.cmp(&a.total_cents));

    StateSummary {
        rows,
        grand_total_cents,
    }
}

/// `part / whole` in basis points, rounded half away from zero.
fn share_basis_points(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    let num = part as i128 * 10_000;
    let whole = whole as i128;
    let rounded = if num >= 0 {
        (num * 2 + whole) / (whole * 2)
    } else {
        -((-num * 2 + whole) / (whole * 2))
    };
    rounded as i64
}
