// Rank movement between consecutive periods and the animated ranking frame.
use serde::Serialize;
use std::collections::HashMap;

use crate::metrics::MetricId;
use crate::ranking::rank_by_metric;
use crate::types::{DerivedRecord, Period, RankedEntity, RankingFrameRow};
use crate::util::format_metric;

/// How many entities the animated ranking view shows.
pub const RANKING_DEPTH: usize = 15;

/// `previous rank - current rank` for every entity of `current` that also
/// appears in `previous`. Positive means the entity moved up. Entities new to
/// the ranking get no entry.
///
/// `previous` should be the full ranked slice of the prior period so that a
/// prior rank below the display cap is still found.
pub fn rank_delta(current: &[RankedEntity], previous: &[RankedEntity]) -> HashMap<String, i32> {
    let prev_ranks: HashMap<&str, usize> = previous
        .iter()
        .map(|e| (e.entity_key.as_str(), e.rank))
        .collect();
    current
        .iter()
        .filter_map(|e| {
            prev_ranks
                .get(e.entity_key.as_str())
                .map(|prev| (e.entity_key.clone(), *prev as i32 - e.rank as i32))
        })
        .collect()
}

/// One frame of the ranking animation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingFrame {
    pub period: Period,
    pub previous_period: Option<Period>,
    pub metric: MetricId,
    /// Top entities by `metric`, highest first.
    pub entries: Vec<RankedEntity>,
    pub deltas: HashMap<String, i32>,
}

impl RankingFrame {
    pub fn label(entry: &RankedEntity) -> String {
        format!("{}. {}", entry.rank, entry.entity_key)
    }

    pub fn delta(&self, entity_key: &str) -> Option<i32> {
        self.deltas.get(entity_key).copied()
    }

    /// Arrow annotation for an entity; empty when unchanged or new.
    pub fn annotation(&self, entity_key: &str) -> String {
        match self.delta(entity_key) {
            Some(d) if d > 0 => format!("▲ {}", d),
            Some(d) if d < 0 => format!("▼ {}", d.abs()),
            _ => String::new(),
        }
    }

    pub fn rows(&self) -> Vec<RankingFrameRow> {
        self.entries
            .iter()
            .map(|e| RankingFrameRow {
                label: Self::label(e),
                value: format_metric(self.metric, e.metric_value),
                change: self.annotation(&e.entity_key),
            })
            .collect()
    }
}

/// Rank `period` by `metric` for a group, keep the top `depth`, and compute
/// deltas against `previous` when one is given.
pub fn ranking_frame(
    records: &[DerivedRecord],
    group: &str,
    metric: MetricId,
    period: Period,
    previous: Option<Period>,
    depth: usize,
) -> RankingFrame {
    let mut entries = rank_by_metric(records, group, period, metric);
    entries.truncate(depth);
    let deltas = match previous {
        Some(prev) => rank_delta(&entries, &rank_by_metric(records, group, prev, metric)),
        None => HashMap::new(),
    };
    RankingFrame {
        period,
        previous_period: previous,
        metric,
        entries,
        deltas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive_metrics;
    use crate::types::Record;

    fn entity(key: &str, rank: usize) -> RankedEntity {
        RankedEntity {
            entity_key: key.to_string(),
            period: 2024,
            metric_value: 0.0,
            share_of_total_pct: 0.0,
            rank,
            cost_rank: rank,
        }
    }

    fn rec(key: &str, period: i32, cost: f64) -> Record {
        Record {
            group: "BOB".to_string(),
            entity_key: key.to_string(),
            period,
            claimants: 1.0,
            volumes: 1.0,
            cost,
        }
    }

    #[test]
    fn positive_delta_means_moved_up() {
        let current = vec![entity("X", 3)];
        let previous = vec![entity("Y", 1), entity("X", 5)];
        let d = rank_delta(&current, &previous);
        assert_eq!(d.get("X"), Some(&2));
    }

    #[test]
    fn new_entities_have_no_delta() {
        let current = vec![entity("X", 1), entity("New", 2)];
        let previous = vec![entity("X", 2)];
        let d = rank_delta(&current, &previous);
        assert_eq!(d.get("X"), Some(&1));
        assert!(!d.contains_key("New"));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn unchanged_rank_is_zero_delta() {
        let d = rank_delta(&[entity("X", 4)], &[entity("X", 4)]);
        assert_eq!(d.get("X"), Some(&0));
    }

    #[test]
    fn prior_rank_can_exceed_depth() {
        let mut records = Vec::new();
        for (i, key) in ["A", "B", "C", "D"].iter().enumerate() {
            records.push(rec(key, 2023, 100.0 - i as f64));
        }
        // D jumps from 4th to 1st.
        records.push(rec("D", 2024, 500.0));
        records.push(rec("A", 2024, 90.0));
        records.push(rec("B", 2024, 80.0));
        let data = derive_metrics(&records);
        let frame = ranking_frame(&data, "BOB", MetricId::Cost, 2024, Some(2023), 2);
        assert_eq!(frame.entries.len(), 2);
        assert_eq!(frame.delta("D"), Some(3));
        assert_eq!(frame.delta("A"), Some(-1));
        assert_eq!(frame.delta("B"), None);
        assert_eq!(frame.annotation("D"), "▲ 3");
        assert_eq!(frame.annotation("A"), "▼ 1");
    }

    #[test]
    fn frame_without_previous_has_no_deltas() {
        let data = derive_metrics(&[rec("A", 2018, 10.0), rec("B", 2018, 20.0)]);
        let frame = ranking_frame(&data, "BOB", MetricId::Cost, 2018, None, RANKING_DEPTH);
        assert!(frame.deltas.is_empty());
        let labels: Vec<String> = frame.rows().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["1. B", "2. A"]);
    }
}
