use crate::model::{ReconRecord, ReconStatus, ReconSummary};

/// Counts per status and side totals.
pub fn compute_summary(records: &[ReconRecord], unmapped_payers: Vec<String>) -> ReconSummary {
    let mut summary = ReconSummary {
        total_carriers: records.len(),
        unmapped_payers,
        ..ReconSummary::default()
    };

    for r in records {
        summary.commission_total_cents += r.commission_cents;
        summary.bank_total_cents += r.bank_cents;
        match r.status {
            ReconStatus::Matched => summary.matched += 1,
            ReconStatus::Variance => summary.variance += 1,
            ReconStatus::BankOnly => summary.bank_only += 1,
            ReconStatus::CommissionOnly => summary.commission_only += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(carrier: &str, commission: i64, bank: i64, status: ReconStatus) -> ReconRecord {
        ReconRecord {
            carrier: carrier.into(),
            commission_cents: commission,
            bank_cents: bank,
            variance_cents: bank - commission,
            status,
        }
    }

    #[test]
    fn counts_and_totals() {
        let summary = compute_summary(
            &[
                record("Allied", 11800, 0, ReconStatus::CommissionOnly),
                record("Beam", 10000, 10001, ReconStatus::Variance),
                record("Guardian", 50000, 50000, ReconStatus::Matched),
            ],
            vec!["Delta Dental Ins".into()],
        );
        assert_eq!(summary.total_carriers, 3);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.variance, 1);
        assert_eq!(summary.commission_only, 1);
        assert_eq!(summary.bank_only, 0);
        assert_eq!(summary.commission_total_cents, 71800);
        assert_eq!(summary.bank_total_cents, 60001);
        assert_eq!(summary.variance_cents(), -11799);
        assert_eq!(summary.count(ReconStatus::Variance), 1);
        assert_eq!(summary.unmapped_payers, vec!["Delta Dental Ins".to_string()]);
    }

    #[test]
    fn empty() {
        let summary = compute_summary(&[], Vec::new());
        assert_eq!(summary, ReconSummary::default());
    }
}
