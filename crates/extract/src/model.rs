use serde::{Deserialize, Serialize};

use crate::money::format_cents;

// ---------------------------------------------------------------------------
// Extractor output
// ---------------------------------------------------------------------------

/// One (group, commission) pair as read off a statement, before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Empty for lump-sum statements and unattributed remainders.
    pub group_name: String,
    pub commission_cents: i64,
}

impl RawEntry {
    pub fn new(group_name: impl Into<String>, commission_cents: i64) -> Self {
        Self {
            group_name: group_name.into(),
            commission_cents,
        }
    }
}

/// Everything extracted from a single statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub carrier: String,
    pub entries: Vec<RawEntry>,
}

// ---------------------------------------------------------------------------
// Matched entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub carrier: String,
    pub group_name: String,
    /// Minor units (cents). Never float.
    pub commission_cents: i64,
    pub state: String,
    /// 0-100.
    pub match_confidence: u8,
    /// Set when a reviewer confirmed or changed the state.
    #[serde(default)]
    pub user_verified: bool,
}

impl CommissionEntry {
    /// Identity used to flag an entry as needing review.
    pub fn review_key(&self) -> (&str, &str, i64) {
        (&self.carrier, &self.group_name, self.commission_cents)
    }

    /// Stable string id: `{carrier}_{group_name}_{commission}`.
    pub fn review_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.carrier,
            self.group_name,
            format_cents(self.commission_cents)
        )
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A roster row scored against a group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub name: String,
    pub state: String,
    pub score: u8,
}

/// An entry whose match score fell in the review band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub id: String,
    /// Position of the entry in the run's entry list.
    pub entry_index: usize,
    /// Carries the best-match state and score.
    pub entry: CommissionEntry,
    pub matched_name: Option<String>,
    pub alternatives: Vec<MatchCandidate>,
}
