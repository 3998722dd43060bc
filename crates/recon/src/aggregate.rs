use std::collections::BTreeMap;

use crate::config::ReconConfig;
use crate::model::{Aggregate, BankDeposit};

/// Group (carrier, cents) lines by carrier and sum them. Sorted by carrier.
pub fn aggregate_by_carrier<'a, I>(lines: I) -> Vec<Aggregate>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut groups: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for (carrier, cents) in lines {
        let entry = groups.entry(carrier).or_insert((0, 0));
        entry.0 += cents;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(carrier, (total_cents, record_count))| Aggregate {
            carrier: carrier.to_string(),
            total_cents,
            record_count,
        })
        .collect()
}

/// Map each deposit's payer to a carrier, then aggregate.
pub fn aggregate_deposits(deposits: &[BankDeposit], config: &ReconConfig) -> Vec<Aggregate> {
    aggregate_by_carrier(
        deposits
            .iter()
            .map(|d| (config.carrier_for(&d.payer_name), d.amount_cents)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(payer: &str, cents: i64) -> BankDeposit {
        BankDeposit {
            payer_name: payer.into(),
            amount_cents: cents,
        }
    }

    #[test]
    fn basic_aggregation() {
        let aggs = aggregate_by_carrier([("Beam", 1000), ("Allied", 250), ("Beam", -290)]);
        assert_eq!(aggs.len(), 2);
        // BTreeMap ordering: Allied before Beam
        assert_eq!(aggs[0].carrier, "Allied");
        assert_eq!(aggs[0].total_cents, 250);
        assert_eq!(aggs[1].carrier, "Beam");
        assert_eq!(aggs[1].total_cents, 710);
        assert_eq!(aggs[1].record_count, 2);
    }

    #[test]
    fn payers_collapse_onto_carriers() {
        let config = ReconConfig::default();
        let aggs = aggregate_deposits(
            &[
                deposit("BeamInsAdmin", 100000),
                deposit("Beam Dental", 2500),
                deposit("AHL INS CO", 700),
                deposit("AMERICAN HERITAG", 300),
            ],
            &config,
        );
        let got: Vec<_> = aggs.iter().map(|a| (a.carrier.as_str(), a.total_cents)).collect();
        assert_eq!(
            got,
            vec![("American Heritage Life Insurance Co", 1000), ("Beam", 102500)]
        );
    }

    #[test]
    fn unmapped_payer_passes_through() {
        let config = ReconConfig::default();
        let aggs = aggregate_deposits(&[deposit("Delta Dental Ins", 4200)], &config);
        assert_eq!(aggs[0].carrier, "Delta Dental Ins");
    }
}
