//! Carrier statement templates.
//!
//! Each template reads `pdftotext -layout` output, one string per page, and
//! returns (group, commission) pairs. Lines a template does not recognise are
//! skipped. Repeated group names within one statement are summed, keeping
//! the order in which each group first appeared.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::RawEntry;

mod allied;
mod american_heritage;
mod beam;
mod cal_choice;
mod choice_builder;
mod guardian;
mod vsp_vision;

// ---------------------------------------------------------------------------
// Carrier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Carrier {
    Allied,
    Beam,
    Guardian,
    AmericanHeritage,
    ChoiceBuilder,
    CalChoice,
    VspVision,
}

impl Carrier {
    pub const ALL: [Carrier; 7] = [
        Carrier::Allied,
        Carrier::Beam,
        Carrier::Guardian,
        Carrier::AmericanHeritage,
        Carrier::ChoiceBuilder,
        Carrier::CalChoice,
        Carrier::VspVision,
    ];

    /// Name written to outputs and used as the reconciliation key.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Allied => "Allied",
            Self::Beam => "Beam",
            Self::Guardian => "Guardian",
            Self::AmericanHeritage => "American Heritage Life Insurance Co",
            Self::ChoiceBuilder => "Choice Builder",
            Self::CalChoice => "Cal Choice",
            Self::VspVision => "VSP Vision",
        }
    }

    /// Run this carrier's template over a statement's pages.
    pub fn extract(&self, pages: &[String], options: &ExtractOptions) -> Vec<RawEntry> {
        let entries = match self {
            Self::Allied => allied::extract(pages),
            Self::Beam => beam::extract(pages),
            Self::Guardian => guardian::extract(pages),
            Self::AmericanHeritage => american_heritage::extract(pages, options.remainder_policy),
            Self::ChoiceBuilder => choice_builder::extract(pages),
            Self::CalChoice => cal_choice::extract(pages),
            Self::VspVision => vsp_vision::extract(pages),
        };
        tracing::info!(carrier = self.display_name(), entries = entries.len(), "extracted");
        entries
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do when a statement total is below the sum of its itemized lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Emit the unattributed remainder only when it exceeds one cent.
    /// A negative remainder is logged and dropped.
    #[default]
    Drop,
    /// Emit any non-zero remainder, negative included.
    Signed,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub remainder_policy: RemainderPolicy,
}

// ---------------------------------------------------------------------------
// Per-statement accumulation
// ---------------------------------------------------------------------------

/// Sums commissions per group name in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct GroupTotals {
    order: Vec<(String, i64)>,
    index: HashMap<String, usize>,
}

impl GroupTotals {
    pub(crate) fn add(&mut self, group: &str, cents: i64) {
        match self.index.get(group) {
            Some(&i) => self.order[i].1 = self.order[i].1.saturating_add(cents),
            None => {
                self.index.insert(group.to_string(), self.order.len());
                self.order.push((group.to_string(), cents));
            }
        }
    }

    pub(crate) fn contains(&self, group: &str) -> bool {
        self.index.contains_key(group)
    }

    pub(crate) fn total(&self) -> i64 {
        self.order.iter().fold(0i64, |acc, (_, c)| acc.saturating_add(*c))
    }

    pub(crate) fn into_entries(self) -> Vec<RawEntry> {
        self.order
            .into_iter()
            .map(|(name, cents)| RawEntry::new(name, cents))
            .collect()
    }
}

/// Non-blank lines of a page, trimmed. `-layout` output pads rows with blank
/// lines that templates relying on line adjacency must not see.
pub(crate) fn page_lines(page: &str) -> Vec<&str> {
    page.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}
