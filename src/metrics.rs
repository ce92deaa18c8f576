// Metric identifiers and the per-record ratio calculator.
use log::warn;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::types::{DerivedRecord, Record};

/// The six metrics a view can chart, rank or compute growth for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MetricId {
    Claimants,
    Volumes,
    Cost,
    CostPerClaimant,
    CostPerVolume,
    ClaimsPerClaimant,
}

impl MetricId {
    pub const ALL: [MetricId; 6] = [
        MetricId::Claimants,
        MetricId::Volumes,
        MetricId::Cost,
        MetricId::CostPerClaimant,
        MetricId::CostPerVolume,
        MetricId::ClaimsPerClaimant,
    ];

    /// Extract this metric from a derived record.
    pub fn value(&self, r: &DerivedRecord) -> f64 {
        match self {
            MetricId::Claimants => r.claimants,
            MetricId::Volumes => r.volumes,
            MetricId::Cost => r.cost,
            MetricId::CostPerClaimant => r.cost_per_claimant,
            MetricId::CostPerVolume => r.cost_per_volume,
            MetricId::ClaimsPerClaimant => r.claims_per_claimant,
        }
    }

    /// Column name as it appears in the source files and exports.
    pub fn column(&self) -> &'static str {
        match self {
            MetricId::Claimants => "Claimants",
            MetricId::Volumes => "Volumes",
            MetricId::Cost => "Cost",
            MetricId::CostPerClaimant => "Cost_Per_Claimant",
            MetricId::CostPerVolume => "Cost_Per_Volume",
            MetricId::ClaimsPerClaimant => "Claims_Per_Claimant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricId::Claimants => "Claimants",
            MetricId::Volumes => "Volumes",
            MetricId::Cost => "Cost",
            MetricId::CostPerClaimant => "Cost Per Claimant",
            MetricId::CostPerVolume => "Cost Per Volume",
            MetricId::ClaimsPerClaimant => "Claims Per Claimant",
        }
    }

    /// Directly measured, as opposed to a ratio of measured values.
    pub fn is_base(&self) -> bool {
        matches!(self, MetricId::Claimants | MetricId::Volumes | MetricId::Cost)
    }

    /// Per-unit dollar amounts, shown with two decimals and a `$`.
    pub fn is_currency(&self) -> bool {
        matches!(self, MetricId::CostPerClaimant | MetricId::CostPerVolume)
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "claimants" => Ok(MetricId::Claimants),
            "volumes" => Ok(MetricId::Volumes),
            "cost" => Ok(MetricId::Cost),
            "costperclaimant" => Ok(MetricId::CostPerClaimant),
            "costpervolume" => Ok(MetricId::CostPerVolume),
            "claimsperclaimant" => Ok(MetricId::ClaimsPerClaimant),
            _ => Err(DashboardError::UnknownMetric(s.to_string())),
        }
    }
}

pub fn derive_record(r: &Record) -> DerivedRecord {
    DerivedRecord {
        group: r.group.clone(),
        entity_key: r.entity_key.clone(),
        period: r.period,
        claimants: r.claimants,
        volumes: r.volumes,
        cost: r.cost,
        cost_per_claimant: r.cost / r.claimants,
        cost_per_volume: r.cost / r.volumes,
        claims_per_claimant: r.volumes / r.claimants,
    }
}

/// Compute ratio metrics for every record, one-to-one and in input order.
///
/// A zero denominator is not an error: the resulting `inf`/`NaN` is kept so
/// consumers can render it as missing.
pub fn derive_metrics(records: &[Record]) -> Vec<DerivedRecord> {
    let derived: Vec<DerivedRecord> = records.iter().map(derive_record).collect();
    let non_finite = derived
        .iter()
        .filter(|d| {
            !(d.cost_per_claimant.is_finite()
                && d.cost_per_volume.is_finite()
                && d.claims_per_claimant.is_finite())
        })
        .count();
    if non_finite > 0 {
        warn!(
            "{} of {} records have an undefined ratio metric (zero claimants or volumes)",
            non_finite,
            derived.len()
        );
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(key: &str, period: i32, claimants: f64, volumes: f64, cost: f64) -> Record {
        Record {
            group: "BOB".to_string(),
            entity_key: key.to_string(),
            period,
            claimants,
            volumes,
            cost,
        }
    }

    #[test]
    fn derives_ratios_in_order() {
        let input = vec![rec("A", 2020, 10.0, 20.0, 100.0), rec("A", 2021, 10.0, 30.0, 150.0)];
        let out = derive_metrics(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].cost_per_claimant, 10.0);
        assert_eq!(out[1].cost_per_claimant, 15.0);
        assert_eq!(out[0].cost_per_volume, 5.0);
        assert_eq!(out[1].claims_per_claimant, 3.0);
        assert_eq!(out[1].period, 2021);
    }

    #[test]
    fn derivation_is_idempotent() {
        let input = vec![rec("A", 2020, 3.0, 7.0, 11.0), rec("B", 2020, 9.0, 13.0, 17.0)];
        let first = derive_metrics(&input);
        let second = derive_metrics(&input);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.cost_per_claimant.to_bits(), b.cost_per_claimant.to_bits());
            assert_eq!(a.cost_per_volume.to_bits(), b.cost_per_volume.to_bits());
            assert_eq!(a.claims_per_claimant.to_bits(), b.claims_per_claimant.to_bits());
        }
    }

    #[test]
    fn zero_denominator_propagates_non_finite() {
        let out = derive_metrics(&[rec("A", 2020, 0.0, 0.0, 50.0)]);
        assert!(out[0].cost_per_claimant.is_infinite());
        assert!(out[0].cost_per_volume.is_infinite());
        assert!(out[0].claims_per_claimant.is_nan());
    }

    #[test]
    fn parses_metric_names() {
        assert_eq!("Cost_Per_Claimant".parse::<MetricId>().unwrap(), MetricId::CostPerClaimant);
        assert_eq!("cost per volume".parse::<MetricId>().unwrap(), MetricId::CostPerVolume);
        assert_eq!("COST".parse::<MetricId>().unwrap(), MetricId::Cost);
        assert!("margin".parse::<MetricId>().is_err());
        for m in MetricId::ALL {
            assert_eq!(m.column().parse::<MetricId>().unwrap(), m);
        }
    }
}
