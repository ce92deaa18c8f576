// Top-N selection by cost, share of total cost and cross-period alignment.
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::metrics::MetricId;
use crate::types::{DerivedRecord, Period, RankedEntity};

/// Size of the top list in the generic and therapy views.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub group: String,
    pub period: Period,
    /// Metric the caller charts. Selection is always by cost.
    pub metric: MetricId,
    pub n: usize,
    pub compare_periods: Vec<Period>,
}

impl RankQuery {
    pub fn new(group: impl Into<String>, period: Period, metric: MetricId) -> Self {
        RankQuery {
            group: group.into(),
            period,
            metric,
            n: TOP_N,
            compare_periods: Vec::new(),
        }
    }

    pub fn top(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    pub fn compare_with(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.compare_periods = periods.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopN {
    /// Selected entities at the base period, ascending by the charted metric.
    pub primary: Vec<RankedEntity>,
    /// Same entities at each comparison period, in `primary` order. Entities
    /// missing from a period are left out.
    pub comparisons: BTreeMap<Period, Vec<RankedEntity>>,
}

impl TopN {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn entity_keys(&self) -> Vec<&str> {
        self.primary.iter().map(|e| e.entity_key.as_str()).collect()
    }
}

/// Descending order with non-finite values after every finite one.
pub(crate) fn cmp_desc(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Ascending order with non-finite values after every finite one.
pub(crate) fn cmp_asc(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

pub(crate) fn slice<'a>(
    records: &'a [DerivedRecord],
    group: &str,
    period: Period,
) -> Vec<&'a DerivedRecord> {
    records
        .iter()
        .filter(|r| r.group == group && r.period == period)
        .collect()
}

/// Summed cost of a slice, skipping non-finite entries.
pub(crate) fn total_cost(slice: &[&DerivedRecord]) -> f64 {
    slice.iter().map(|r| r.cost).filter(|c| c.is_finite()).sum()
}

pub(crate) fn share_pct(cost: f64, total: f64) -> f64 {
    cost / total * 100.0
}

/// Stable sort by cost, highest first.
fn sorted_by_cost<'a>(slice: &[&'a DerivedRecord]) -> Vec<&'a DerivedRecord> {
    let mut sorted = slice.to_vec();
    sorted.sort_by(|a, b| cmp_desc(a.cost, b.cost));
    sorted
}

fn ranked(
    r: &DerivedRecord,
    metric: MetricId,
    total: f64,
    rank: usize,
    cost_rank: usize,
) -> RankedEntity {
    RankedEntity {
        entity_key: r.entity_key.clone(),
        period: r.period,
        metric_value: metric.value(r),
        share_of_total_pct: share_pct(r.cost, total),
        rank,
        cost_rank,
    }
}

/// Cost position of every entity in a slice; a repeated key keeps its first.
fn cost_ranks<'a>(
    slice: &[&'a DerivedRecord],
) -> HashMap<&'a str, (usize, &'a DerivedRecord)> {
    let mut ranks = HashMap::new();
    for (i, r) in sorted_by_cost(slice).into_iter().enumerate() {
        ranks.entry(r.entity_key.as_str()).or_insert((i + 1, r));
    }
    ranks
}

/// Number `rank` by `metric_value`, highest first, without reordering.
fn assign_metric_ranks(entries: &mut [RankedEntity]) {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| cmp_desc(entries[a].metric_value, entries[b].metric_value));
    for (pos, idx) in order.into_iter().enumerate() {
        entries[idx].rank = pos + 1;
    }
}

/// Pick the top `n` entities by cost for the query's group and period, then
/// line up the same entities at each comparison period.
///
/// Within each period's list `rank` follows the charted metric, highest
/// first. `cost_rank` is the cost position inside that period's full slice,
/// and `share_of_total_pct` is cost over the slice's total cost.
///
/// A comparison period equal to the base period is ignored. An empty base
/// slice yields an empty result.
pub fn rank_top_n(records: &[DerivedRecord], query: &RankQuery) -> TopN {
    let base = slice(records, &query.group, query.period);
    if base.is_empty() {
        debug!("no records for group {} in {}", query.group, query.period);
        return TopN::default();
    }
    let total = total_cost(&base);

    let mut primary: Vec<RankedEntity> = sorted_by_cost(&base)
        .into_iter()
        .take(query.n)
        .enumerate()
        .map(|(i, r)| ranked(r, query.metric, total, 0, i + 1))
        .collect();
    primary.sort_by(|a, b| cmp_asc(a.metric_value, b.metric_value));
    assign_metric_ranks(&mut primary);
    debug!(
        "top {} of {} entities for group {} in {}",
        primary.len(),
        base.len(),
        query.group,
        query.period
    );

    let mut comparisons: BTreeMap<Period, Vec<RankedEntity>> = BTreeMap::new();
    for &period in &query.compare_periods {
        if period == query.period || comparisons.contains_key(&period) {
            continue;
        }
        let other = slice(records, &query.group, period);
        let other_total = total_cost(&other);
        let by_key = cost_ranks(&other);
        let mut aligned: Vec<RankedEntity> = primary
            .iter()
            .filter_map(|e| by_key.get(e.entity_key.as_str()))
            .map(|(cost_rank, r)| ranked(r, query.metric, other_total, 0, *cost_rank))
            .collect();
        assign_metric_ranks(&mut aligned);
        comparisons.insert(period, aligned);
    }

    TopN {
        primary,
        comparisons,
    }
}

/// Rank a whole group/period slice by `metric`, highest first.
///
/// Used for the animated ranking view and as the "previous" side of a rank
/// delta, where an entity's prior rank may exceed any display cap.
pub fn rank_by_metric(
    records: &[DerivedRecord],
    group: &str,
    period: Period,
    metric: MetricId,
) -> Vec<RankedEntity> {
    let mut rows = slice(records, group, period);
    let total = total_cost(&rows);
    let by_cost = cost_ranks(&rows);
    rows.sort_by(|a, b| cmp_desc(metric.value(a), metric.value(b)));
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| {
            let cost_rank = by_cost.get(r.entity_key.as_str()).map_or(i + 1, |(c, _)| *c);
            ranked(r, metric, total, i + 1, cost_rank)
        })
        .collect()
}
