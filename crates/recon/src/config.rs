use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;

pub const DEFAULT_DEPOSIT_MARKER: &str = "Electronic Deposit From";

/// Bank payer names (as truncated by the bank) → carrier names.
const DEFAULT_PAYER_MAP: &[(&str, &str)] = &[
    ("Guardian Life In", "Guardian"),
    ("AMERICAN HERITAG", "American Heritage Life Insurance Co"),
    ("AHL INS CO", "American Heritage Life Insurance Co"),
    ("BeamInsAdmin", "Beam"),
    ("Beam Dental", "Beam"),
    ("CHOICE ADMINISTR", "Cal Choice"),
    ("Ameritas Life In", "Choice Builder"),
];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Phrase that starts every deposit line on the bank statement.
    pub deposit_marker: String,
    /// A carrier is MATCHED when |variance| is strictly below this.
    pub match_below_cents: i64,
    /// Exact payer name → carrier name. Unmapped payers pass through.
    pub payer_map: BTreeMap<String, String>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            deposit_marker: DEFAULT_DEPOSIT_MARKER.to_string(),
            match_below_cents: 1,
            payer_map: DEFAULT_PAYER_MAP
                .iter()
                .map(|(payer, carrier)| (payer.to_string(), carrier.to_string()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.deposit_marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "deposit_marker must not be empty".into(),
            ));
        }
        if self.match_below_cents < 1 {
            return Err(ReconError::ConfigValidation(format!(
                "match_below_cents must be at least 1, got {}",
                self.match_below_cents
            )));
        }
        Ok(())
    }

    /// Carrier name for a bank payer. Unmapped payers keep their own name.
    pub fn carrier_for<'a>(&'a self, payer: &'a str) -> &'a str {
        self.payer_map.get(payer).map(String::as_str).unwrap_or(payer)
    }

    pub fn is_mapped(&self, payer: &str) -> bool {
        self.payer_map.contains_key(payer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
