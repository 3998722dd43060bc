//! Interactive review as an explicit state machine.
//!
//! ```text
//! AwaitingExtraction --Extracted--> AwaitingReview(0) --Decision/TimedOut--> ... --> AwaitingReport
//!          |                              |
//!          +------------Cancel------------+--> Cancelled
//! ```
//!
//! Exactly one item is pending at a time. A timeout counts as a skip. The
//! session never talks to a terminal or socket itself; the caller feeds it
//! events and reads [`ReviewSession::current`].

use std::fmt;
use std::time::Duration;

use crate::corrections::CorrectionStore;
use crate::error::ReviewError;
use crate::model::{CommissionEntry, ReviewItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    AwaitingExtraction,
    /// Index of the pending item.
    AwaitingReview(usize),
    AwaitingReport,
    Cancelled,
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingExtraction => write!(f, "awaiting_extraction"),
            Self::AwaitingReview(i) => write!(f, "awaiting_review({i})"),
            Self::AwaitingReport => write!(f, "awaiting_report"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Accept the best match.
    Confirm,
    /// Use a different two-letter state.
    Change(String),
    /// Keep the best match without marking it verified.
    Skip,
    /// Keep the best match for this and every remaining item.
    ApproveAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    Extracted(Vec<ReviewItem>),
    Decision {
        decision: ReviewDecision,
        /// Store the resulting state for future runs.
        remember: bool,
    },
    TimedOut,
    Cancel,
}

impl ReviewEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Extracted(_) => "extracted",
            Self::Decision { .. } => "decision",
            Self::TimedOut => "timed_out",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug)]
pub struct ReviewSession {
    state: ReviewState,
    items: Vec<ReviewItem>,
    resolved: Vec<(usize, CommissionEntry)>,
    timeout: Option<Duration>,
}

impl ReviewSession {
    /// `timeout` bounds how long the caller waits for each decision.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            state: ReviewState::AwaitingExtraction,
            items: Vec::new(),
            resolved: Vec::new(),
            timeout,
        }
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The pending item, if the session is waiting on a decision.
    pub fn current(&self) -> Option<&ReviewItem> {
        match self.state {
            ReviewState::AwaitingReview(i) => self.items.get(i),
            _ => None,
        }
    }

    /// (1-based position of the pending item, total items).
    pub fn progress(&self) -> (usize, usize) {
        match self.state {
            ReviewState::AwaitingReview(i) => (i + 1, self.items.len()),
            _ => (self.resolved.len(), self.items.len()),
        }
    }

    /// Apply one event. Events that do not fit the current state are
    /// rejected and leave the session unchanged.
    pub fn handle(
        &mut self,
        event: ReviewEvent,
        corrections: &mut CorrectionStore,
    ) -> Result<&ReviewState, ReviewError> {
        let next = match (self.state.clone(), event) {
            (ReviewState::AwaitingExtraction, ReviewEvent::Extracted(items)) => {
                self.items = items;
                self.next_from(0)
            }
            (ReviewState::AwaitingExtraction | ReviewState::AwaitingReview(_), ReviewEvent::Cancel) => {
                tracing::warn!(resolved = self.resolved.len(), total = self.items.len(), "review cancelled");
                ReviewState::Cancelled
            }
            (ReviewState::AwaitingReview(i), ReviewEvent::TimedOut) => {
                tracing::info!(item = %self.items[i].id, "review timed out, keeping best match");
                self.keep_best(i);
                self.next_from(i + 1)
            }
            (ReviewState::AwaitingReview(i), ReviewEvent::Decision { decision, remember }) => {
                self.decide(i, decision, remember, corrections)?
            }
            (state, event) => {
                return Err(ReviewError::InvalidTransition {
                    state: state.to_string(),
                    event: event.name().to_string(),
                })
            }
        };
        self.state = next;
        Ok(&self.state)
    }

    fn decide(
        &mut self,
        i: usize,
        decision: ReviewDecision,
        remember: bool,
        corrections: &mut CorrectionStore,
    ) -> Result<ReviewState, ReviewError> {
        let state = match decision {
            ReviewDecision::Confirm => self.items[i].entry.state.clone(),
            ReviewDecision::Change(code) => normalize_state(&code)?,
            ReviewDecision::Skip => {
                self.keep_best(i);
                return Ok(self.next_from(i + 1));
            }
            ReviewDecision::ApproveAll => {
                for j in i..self.items.len() {
                    self.keep_best(j);
                }
                return Ok(ReviewState::AwaitingReport);
            }
        };

        let item = &self.items[i];
        let mut entry = item.entry.clone();
        entry.state = state;
        entry.match_confidence = 100;
        entry.user_verified = true;
        if remember {
            corrections.remember(&entry.group_name, &entry.state);
        }
        tracing::debug!(group = %entry.group_name, state = %entry.state, "review resolved");
        self.resolved.push((item.entry_index, entry));
        Ok(self.next_from(i + 1))
    }

    fn keep_best(&mut self, i: usize) {
        let item = &self.items[i];
        self.resolved.push((item.entry_index, item.entry.clone()));
    }

    fn next_from(&self, i: usize) -> ReviewState {
        if i < self.items.len() {
            ReviewState::AwaitingReview(i)
        } else {
            ReviewState::AwaitingReport
        }
    }

    /// Reviewed entries keyed by their position in the run. Only available
    /// once every item has been resolved.
    pub fn resolved(&self) -> Result<&[(usize, CommissionEntry)], ReviewError> {
        match self.state {
            ReviewState::AwaitingReport => Ok(&self.resolved),
            ref state => Err(ReviewError::InvalidTransition {
                state: state.to_string(),
                event: "finish".to_string(),
            }),
        }
    }

    /// Write reviewed entries back into the run's entry list.
    pub fn apply_to(&self, entries: &mut [CommissionEntry]) -> Result<usize, ReviewError> {
        let resolved = self.resolved()?;
        let mut applied = 0;
        for (index, entry) in resolved {
            if let Some(slot) = entries.get_mut(*index) {
                *slot = entry.clone();
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// Upper-case a two-letter state code.
fn normalize_state(code: &str) -> Result<String, ReviewError> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ReviewError::InvalidState(code.to_string()))
    }
}
