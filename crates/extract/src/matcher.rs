//! Fuzzy group-name → state matching against the master contact roster.
//!
//! Scores are token-sort ratios: both names are lowercased, punctuation
//! becomes whitespace, tokens are sorted, and the indel similarity of the
//! results is scaled to 0-100. Word order and punctuation therefore never
//! matter ("Corp, Acme" == "ACME CORP").

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::model::MatchCandidate;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Scores at or above this are accepted without review.
    pub auto_accept: u8,
    /// Scores in `[review_floor, auto_accept)` are accepted but flagged.
    /// Below it the match is discarded in favour of `fallback_state`.
    pub review_floor: u8,
    pub fallback_state: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            auto_accept: 80,
            review_floor: 60,
            fallback_state: "WA".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Master contacts: company name → state, in file order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    rows: Vec<(String, String)>,
}

impl Roster {
    /// Build from (name, state) pairs. Blank names are skipped; a repeated
    /// name keeps its first position and takes the later state.
    pub fn from_pairs<I, N, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut rows: Vec<(String, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (name, state) in pairs {
            let name = name.into().trim().to_string();
            let state = state.into().trim().to_string();
            if name.is_empty() {
                continue;
            }
            match index.get(&name) {
                Some(&i) => rows[i].1 = state,
                None => {
                    index.insert(name.clone(), rows.len());
                    rows.push((name, state));
                }
            }
        }
        Self { rows }
    }

    /// Load a roster CSV, reading `name_column` and `state_column`.
    pub fn load_csv(path: &Path, name_column: &str, state_column: &str) -> Result<Self, ExtractError> {
        let read_err = |message: String| ExtractError::RosterRead {
            path: path.to_path_buf(),
            message,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| read_err(e.to_string()))?;

        let headers = reader.headers().map_err(|e| read_err(e.to_string()))?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == wanted)
                .ok_or_else(|| ExtractError::RosterColumn {
                    path: path.to_path_buf(),
                    column: wanted.to_string(),
                })
        };
        let name_idx = column(name_column)?;
        let state_idx = column(state_column)?;

        let mut pairs = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| read_err(e.to_string()))?;
            let name = record.get(name_idx).unwrap_or("");
            let state = record.get(state_idx).unwrap_or("");
            pairs.push((name.to_string(), state.to_string()));
        }

        let roster = Self::from_pairs(pairs);
        tracing::info!(contacts = roster.len(), path = %path.display(), "loaded roster");
        Ok(roster)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

fn sort_tokens(s: &str) -> String {
    let cleaned = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let similarity = rapidfuzz::distance::indel::normalized_similarity(a.chars(), b.chars());
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Token-sort similarity of two names, 0-100. Empty input scores 0.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Result of matching one group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub state: String,
    pub confidence: u8,
    /// Roster name the state came from, when a roster row was used.
    pub matched_name: Option<String>,
    pub needs_review: bool,
}

pub struct StateMatcher {
    roster: Roster,
    /// Token-sorted roster names, parallel to `roster.rows`.
    keys: Vec<String>,
    config: MatchConfig,
}

impl StateMatcher {
    pub fn new(roster: Roster, config: MatchConfig) -> Self {
        let keys = roster.rows.iter().map(|(name, _)| sort_tokens(name)).collect();
        Self { roster, keys, config }
    }

    fn fallback(&self) -> MatchOutcome {
        MatchOutcome {
            state: self.config.fallback_state.clone(),
            confidence: 100,
            matched_name: None,
            needs_review: false,
        }
    }

    /// Every roster row with its score, in roster order.
    fn scored(&self, group_name: &str) -> Vec<(usize, u8)> {
        let query = sort_tokens(group_name);
        self.keys
            .iter()
            .enumerate()
            .map(|(i, key)| (i, ratio(&query, key)))
            .collect()
    }

    pub fn match_name(&self, group_name: &str) -> MatchOutcome {
        if group_name.trim().is_empty() {
            return self.fallback();
        }

        // First best in roster order wins ties.
        let best = self
            .scored(group_name)
            .into_iter()
            .fold(None::<(usize, u8)>, |best, (i, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((i, score)),
            });

        let Some((idx, score)) = best else {
            tracing::debug!(group_name, "empty roster, using fallback state");
            return self.fallback();
        };
        if score < self.config.review_floor {
            tracing::debug!(group_name, score, "no usable roster match, using fallback state");
            return self.fallback();
        }

        let (name, state) = &self.roster.rows[idx];
        let state = if state.is_empty() {
            tracing::debug!(group_name, matched = %name, "roster row has no state, using fallback state");
            self.config.fallback_state.clone()
        } else {
            state.clone()
        };
        tracing::debug!(group_name, matched = %name, score, state = %state, "matched");

        MatchOutcome {
            state,
            confidence: score,
            matched_name: Some(name.clone()),
            needs_review: score < self.config.auto_accept,
        }
    }

    /// Top `n` roster candidates for a group name, best first.
    pub fn alternatives(&self, group_name: &str, n: usize) -> Vec<MatchCandidate> {
        if group_name.trim().is_empty() {
            return Vec::new();
        }
        let mut scored = self.scored(group_name);
        // Stable: equal scores stay in roster order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
            .into_iter()
            .take(n)
            .map(|(i, score)| {
                let (name, state) = &self.roster.rows[i];
                MatchCandidate {
                    name: name.clone(),
                    state: state.clone(),
                    score,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn matcher(pairs: &[(&str, &str)]) -> StateMatcher {
        StateMatcher::new(Roster::from_pairs(pairs.iter().copied()), MatchConfig::default())
    }

    #[test]
    fn token_sort_ignores_order_and_punctuation() {
        assert_eq!(token_sort_ratio("Corp, Acme", "ACME CORP"), 100);
        assert_eq!(token_sort_ratio("Acme Corp", "Acme Corporation"), 72);
        assert_eq!(token_sort_ratio("", "Acme"), 0);
        assert_eq!(token_sort_ratio("!!!", "Acme"), 0);
    }

    #[test]
    fn exact_name_is_full_confidence() {
        let m = matcher(&[("Blue Harbor Dental LLC", "OR"), ("Acme Corp", "CA")]);
        let out = m.match_name("Acme Corp");
        assert_eq!(out.state, "CA");
        assert_eq!(out.confidence, 100);
        assert!(!out.needs_review);
        assert_eq!(out.matched_name.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn partial_name_lands_in_review_band() {
        let m = matcher(&[("Acme Corp", "CA")]);
        let out = m.match_name("Acme Corporation");
        assert_eq!(out.state, "CA");
        assert_eq!(out.confidence, 72);
        assert!(out.needs_review);
    }

    #[test]
    fn empty_name_and_weak_match_fall_back() {
        let m = matcher(&[("Acme Corp", "CA")]);
        for name in ["", "   ", "Zebra Logistics International"] {
            let out = m.match_name(name);
            assert_eq!(out.state, "WA", "{name:?}");
            assert_eq!(out.confidence, 100);
            assert!(!out.needs_review);
        }
    }

    #[test]
    fn empty_roster_falls_back() {
        let m = matcher(&[]);
        assert_eq!(m.match_name("Acme").state, "WA");
    }

    #[test]
    fn blank_roster_state_uses_fallback_but_keeps_score() {
        let m = matcher(&[("Acme Corp", "")]);
        let out = m.match_name("Acme Corp");
        assert_eq!(out.state, "WA");
        assert_eq!(out.confidence, 100);
    }

    #[test]
    fn ties_go_to_first_roster_row() {
        let m = matcher(&[("Acme Corp", "CA"), ("Corp Acme", "NV")]);
        assert_eq!(m.match_name("acme corp").state, "CA");
    }

    #[test]
    fn custom_thresholds() {
        let config = MatchConfig {
            auto_accept: 70,
            review_floor: 50,
            fallback_state: "OR".to_string(),
        };
        let m = StateMatcher::new(Roster::from_pairs([("Acme Corp", "CA")]), config);
        let out = m.match_name("Acme Corporation");
        assert!(!out.needs_review);
        assert_eq!(m.match_name("").state, "OR");
    }

    #[test]
    fn alternatives_best_first() {
        let m = matcher(&[
            ("Zebra Logistics", "TX"),
            ("Acme Corporation", "CA"),
            ("Acme Corp", "NV"),
            ("Acme", "WA"),
        ]);
        let alts = m.alternatives("Acme Corp", 3);
        assert_eq!(alts.len(), 3);
        assert_eq!(alts[0].name, "Acme Corp");
        assert_eq!(alts[0].score, 100);
        assert!(alts[1].score >= alts[2].score);
        assert!(alts.iter().all(|c| c.name != "Zebra Logistics"));
    }

    #[test]
    fn roster_dedupes_names() {
        let roster = Roster::from_pairs([("Acme", "CA"), (" ", "OR"), ("Acme", "NV")]);
        assert_eq!(roster.len(), 1);
        let outcome = StateMatcher::new(roster, MatchConfig::default()).match_name("Acme");
        assert_eq!((outcome.state.as_str(), outcome.confidence), ("NV", 100));
    }

    #[test]
    fn load_csv_with_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Card Name,Phone,State").unwrap();
        writeln!(file, "Acme Corp,555-0100,CA").unwrap();
        writeln!(file, "\"Harbor, Blue\",,OR").unwrap();
        file.flush().unwrap();

        let roster = Roster::load_csv(file.path(), "Card Name", "State").unwrap();
        assert_eq!(roster.len(), 2);
        let outcome = StateMatcher::new(roster, MatchConfig::default()).match_name("Harbor, Blue");
        assert_eq!(outcome.state, "OR");

        let err = Roster::load_csv(file.path(), "Company", "State").unwrap_err();
        assert!(matches!(err, ExtractError::RosterColumn { .. }));
    }

    #[test]
    fn load_csv_missing_file() {
        let err = Roster::load_csv(Path::new("/nonexistent/roster.csv"), "Card Name", "State")
            .unwrap_err();
        assert!(matches!(err, ExtractError::RosterRead { .. }));
    }
}
