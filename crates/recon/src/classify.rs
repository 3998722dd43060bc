use std::collections::BTreeMap;

use crate::model::{Aggregate, ReconRecord, ReconStatus};

/// Status for one carrier. MATCHED depends only on |variance|; the *_ONLY
/// buckets apply to carriers seen on a single side with a real difference.
pub fn classify(
    commission: Option<&Aggregate>,
    bank: Option<&Aggregate>,
    match_below_cents: i64,
) -> ReconStatus {
    let commission_cents = commission.map_or(0, |a| a.total_cents);
    let bank_cents = bank.map_or(0, |a| a.total_cents);
    let variance = bank_cents - commission_cents;

    if variance.abs() < match_below_cents {
        ReconStatus::Matched
    } else if bank.is_none() {
        ReconStatus::CommissionOnly
    } else if commission.is_none() {
        ReconStatus::BankOnly
    } else {
        ReconStatus::Variance
    }
}

/// Full outer join of both sides by carrier, one record per carrier.
pub fn classify_carriers(
    commission: &[Aggregate],
    bank: &[Aggregate],
    match_below_cents: i64,
) -> Vec<ReconRecord> {
    let mut sides: BTreeMap<&str, (Option<&Aggregate>, Option<&Aggregate>)> = BTreeMap::new();
    for agg in commission {
        sides.entry(agg.carrier.as_str()).or_default().0 = Some(agg);
    }
    for agg in bank {
        sides.entry(agg.carrier.as_str()).or_default().1 = Some(agg);
    }

    sides
        .into_iter()
        .map(|(carrier, (c, b))| {
            let commission_cents = c.map_or(0, |a| a.total_cents);
            let bank_cents = b.map_or(0, |a| a.total_cents);
            ReconRecord {
                carrier: carrier.to_string(),
                commission_cents,
                bank_cents,
                variance_cents: bank_cents - commission_cents,
                status: classify(c, b, match_below_cents),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(carrier: &str, cents: i64) -> Aggregate {
        Aggregate {
            carrier: carrier.into(),
            total_cents: cents,
            record_count: 1,
        }
    }

    #[test]
    fn equal_totals_match() {
        let c = agg("Guardian", 50000);
        let b = agg("Guardian", 50000);
        assert_eq!(classify(Some(&c), Some(&b), 1), ReconStatus::Matched);
    }

    #[test]
    fn one_cent_is_variance_either_sign() {
        let c = agg("Beam", 10000);
        assert_eq!(classify(Some(&c), Some(&agg("Beam", 10001)), 1), ReconStatus::Variance);
        assert_eq!(classify(Some(&c), Some(&agg("Beam", 9999)), 1), ReconStatus::Variance);
    }

    #[test]
    fn one_sided_carriers() {
        let c = agg("Allied", 11800);
        assert_eq!(classify(Some(&c), None, 1), ReconStatus::CommissionOnly);
        assert_eq!(classify(None, Some(&c), 1), ReconStatus::BankOnly);
    }

    #[test]
    fn zero_on_one_side_still_matches() {
        // A carrier whose statements net to zero and never paid is not a problem.
        let c = agg("VSP Vision", 0);
        assert_eq!(classify(Some(&c), None, 1), ReconStatus::Matched);
    }

    #[test]
    fn wider_tolerance() {
        let c = agg("Beam", 10000);
        assert_eq!(classify(Some(&c), Some(&agg("Beam", 10004)), 5), ReconStatus::Matched);
        assert_eq!(classify(Some(&c), Some(&agg("Beam", 10005)), 5), ReconStatus::Variance);
    }

    #[test]
    fn outer_join_sorted_by_carrier() {
        let records = classify_carriers(
            &[agg("Guardian", 50000), agg("Allied", 11800)],
            &[agg("Guardian", 50000), agg("Beam", 154802)],
            1,
        );
        let got: Vec<_> = records
            .iter()
            .map(|r| (r.carrier.as_str(), r.commission_cents, r.bank_cents, r.variance_cents, r.status))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Allied", 11800, 0, -11800, ReconStatus::CommissionOnly),
                ("Beam", 0, 154802, 154802, ReconStatus::BankOnly),
                ("Guardian", 50000, 50000, 0, ReconStatus::Matched),
            ]
        );
    }
}
