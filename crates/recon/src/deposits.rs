//! Deposit lines from bank statement text.
//!
//! `08/15  Electronic Deposit From Guardian Life In        500.00`

use commission_extract::money::parse_amount;
use regex::Regex;

use crate::error::ReconError;
use crate::model::BankDeposit;

/// Every deposit line under `marker` in `text`, in statement order.
pub fn parse_deposits(text: &str, marker: &str) -> Result<Vec<BankDeposit>, ReconError> {
    let pattern = format!(r"{}\s+(.+?)\s+([\d,]+\.\d+)", regex::escape(marker.trim()));
    let re = Regex::new(&pattern).map_err(|e| ReconError::Marker {
        marker: marker.to_string(),
        message: e.to_string(),
    })?;

    let mut deposits = Vec::new();
    for line in text.lines().filter(|l| l.contains(marker.trim())) {
        let Some(caps) = re.captures(line) else {
            tracing::debug!(line = line.trim(), "deposit marker without amount");
            continue;
        };
        let payer = caps[1].trim();
        match parse_amount(&caps[2]) {
            Ok(cents) => deposits.push(BankDeposit {
                payer_name: payer.to_string(),
                amount_cents: cents,
            }),
            Err(e) => tracing::warn!(payer, error = %e, "unreadable deposit amount"),
        }
    }

    tracing::info!(deposits = deposits.len(), "parsed bank deposits");
    Ok(deposits)
}
