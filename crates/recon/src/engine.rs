use std::collections::BTreeSet;

use commission_extract::money::format_cents;

use crate::aggregate::{aggregate_by_carrier, aggregate_deposits};
use crate::classify::classify_carriers;
use crate::config::ReconConfig;
use crate::deposits::parse_deposits;
use crate::error::ReconError;
use crate::summary::compute_summary;
use crate::model::{ReconInput, ReconMeta, ReconResult, ReconStatus};

/// Run reconciliation per config. Returns one record per carrier + summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let commission = aggregate_by_carrier(
        input
            .commissions
            .iter()
            .map(|(carrier, cents)| (carrier.as_str(), *cents)),
    );
    let bank = aggregate_deposits(&input.deposits, config);

    let unmapped: BTreeSet<&str> = input
        .deposits
        .iter()
        .filter(|d| !config.is_mapped(&d.payer_name))
        .map(|d| d.payer_name.as_str())
        .collect();
    for payer in &unmapped {
        tracing::debug!(payer, "payer not in payer map, using name as carrier");
    }

    let records = classify_carriers(&commission, &bank, config.match_below_cents);
    for r in &records {
        if r.status != ReconStatus::Matched {
            tracing::warn!(
                carrier = %r.carrier,
                commission = %format_cents(r.commission_cents),
                bank = %format_cents(r.bank_cents),
                variance = %format_cents(r.variance_cents),
                status = %r.status,
                "reconciliation difference"
            );
        }
    }

    let summary = compute_summary(
        &records,
        unmapped.into_iter().map(str::to_string).collect(),
    );
    tracing::info!(
        carriers = summary.total_carriers,
        matched = summary.matched,
        variance = summary.variance,
        bank_only = summary.bank_only,
        commission_only = summary.commission_only,
        "reconciliation complete"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        records,
    })
}

/// Parse bank statement text and reconcile it against commission lines.
pub fn run_with_statement<I, S>(
    config: &ReconConfig,
    commissions: I,
    bank_text: &str,
) -> Result<ReconResult, ReconError>
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let deposits = parse_deposits(bank_text, &config.deposit_marker)?;
    run(config, &ReconInput::new(commissions, deposits))
}
