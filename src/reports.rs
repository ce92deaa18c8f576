// Trend views built on top of the core calculators, plus the tabular rows
// the console front-end prints and exports.
use chrono::Local;
use serde::Serialize;
use std::collections::HashMap;

use crate::growth::{compute_growth, compute_growth_by_entity};
use crate::loader::DataStore;
use crate::metrics::{derive_metrics, MetricId};
use crate::ranking::{rank_by_metric, slice, TopN};
use crate::types::{
    AnnualTrendRow, BreakdownRow, Dataset, DerivedRecord, DetailRow, GrowthRecord, Period, Record,
    SummaryStats, TopEntityRow,
};
use crate::util::{finite, format_growth, format_metric, format_pct};

/// One line of a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub name: String,
    pub points: Vec<(Period, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTrend {
    pub entity: TrendSeries,
    pub benchmark: TrendSeries,
    /// Growth of the entity series; the first point has none.
    pub growth: Vec<(Period, Option<f64>)>,
}

fn series_of<'a>(
    records: &'a [DerivedRecord],
    group: &str,
    entity_key: &str,
) -> Vec<&'a DerivedRecord> {
    let mut series: Vec<&DerivedRecord> = records
        .iter()
        .filter(|r| r.group == group && r.entity_key == entity_key)
        .collect();
    series.sort_by_key(|r| r.period);
    series
}

fn trend(name: &str, series: &[&DerivedRecord], metric: MetricId) -> TrendSeries {
    TrendSeries {
        name: name.to_string(),
        points: series.iter().map(|r| (r.period, metric.value(r))).collect(),
    }
}

/// Most recent annual record of a group together with its growth.
pub fn latest_summary<'a>(growth: &'a [GrowthRecord], group: &str) -> Option<&'a GrowthRecord> {
    growth
        .iter()
        .filter(|g| g.record.group == group)
        .max_by_key(|g| g.record.period)
}

/// Base metrics divided by their first-period value so several can share an
/// axis; ratio metrics are returned as they are.
pub fn normalized_trend(
    records: &[DerivedRecord],
    group: &str,
    entity_key: &str,
    metrics: &[MetricId],
) -> Vec<TrendSeries> {
    let series = series_of(records, group, entity_key);
    let Some(first) = series.first() else {
        return Vec::new();
    };
    metrics
        .iter()
        .map(|m| {
            let base = m.value(first);
            let points = series
                .iter()
                .map(|r| {
                    let v = m.value(r);
                    (r.period, if m.is_base() { v / base } else { v })
                })
                .collect();
            TrendSeries {
                name: m.label().to_string(),
                points,
            }
        })
        .collect()
}

/// The `k` highest entities by `metric` in the group's latest period, each
/// with its full series of that metric.
pub fn top_k_trend(
    records: &[DerivedRecord],
    group: &str,
    metric: MetricId,
    k: usize,
) -> Vec<TrendSeries> {
    let Some(latest) = records.iter().filter(|r| r.group == group).map(|r| r.period).max() else {
        return Vec::new();
    };
    rank_by_metric(records, group, latest, metric)
        .into_iter()
        .take(k)
        .map(|e| trend(&e.entity_key, &series_of(records, group, &e.entity_key), metric))
        .collect()
}

/// Top `n` entities by cost at `period`, in cost order, each with its series
/// of `metric` across every period.
pub fn movement_series(
    records: &[DerivedRecord],
    group: &str,
    period: Period,
    metric: MetricId,
    n: usize,
) -> Vec<TrendSeries> {
    rank_by_metric(records, group, period, MetricId::Cost)
        .into_iter()
        .take(n)
        .map(|e| trend(&e.entity_key, &series_of(records, group, &e.entity_key), metric))
        .collect()
}

/// One entity's series against the group's annual series of the same metric.
pub fn entity_trend(
    records: &[DerivedRecord],
    annual: &[DerivedRecord],
    group: &str,
    entity_key: &str,
    metric: MetricId,
) -> Option<EntityTrend> {
    let series = series_of(records, group, entity_key);
    if series.is_empty() {
        return None;
    }
    let owned: Vec<DerivedRecord> = series.iter().map(|r| (*r).clone()).collect();
    let growth = compute_growth(&owned, |_| ())
        .into_iter()
        .map(|g| (g.record.period, g.growth.get(metric)))
        .collect();
    Some(EntityTrend {
        entity: trend(entity_key, &series, metric),
        benchmark: trend("Overall Average", &series_of(annual, group, group), metric),
        growth,
    })
}

pub fn annual_trend_rows(growth: &[GrowthRecord], group: &str) -> Vec<AnnualTrendRow> {
    let mut rows: Vec<&GrowthRecord> = growth.iter().filter(|g| g.record.group == group).collect();
    rows.sort_by_key(|g| g.record.period);
    rows.into_iter()
        .map(|g| {
            let r = &g.record;
            AnnualTrendRow {
                year: r.period,
                claimants: format_metric(MetricId::Claimants, r.claimants),
                volumes: format_metric(MetricId::Volumes, r.volumes),
                cost: format_metric(MetricId::Cost, r.cost),
                cost_per_claimant: format_metric(MetricId::CostPerClaimant, r.cost_per_claimant),
                cost_per_volume: format_metric(MetricId::CostPerVolume, r.cost_per_volume),
                claims_per_claimant: format_metric(
                    MetricId::ClaimsPerClaimant,
                    r.claims_per_claimant,
                ),
                claimants_growth: format_growth(g.growth.claimants),
                volumes_growth: format_growth(g.growth.volumes),
                cost_growth: format_growth(g.growth.cost),
                cost_per_claimant_growth: format_growth(g.growth.cost_per_claimant),
                cost_per_volume_growth: format_growth(g.growth.cost_per_volume),
                claims_per_claimant_growth: format_growth(g.growth.claims_per_claimant),
            }
        })
        .collect()
}

/// Every entity of the group's period slice, highest `metric` first.
pub fn period_breakdown_rows(
    records: &[DerivedRecord],
    group: &str,
    period: Period,
    metric: MetricId,
) -> Vec<BreakdownRow> {
    rank_by_metric(records, group, period, metric)
        .into_iter()
        .map(|e| BreakdownRow {
            rank: e.rank,
            value: format_metric(metric, e.metric_value),
            pct_of_total_cost: format_pct(e.share_of_total_pct),
            entity: e.entity_key,
        })
        .collect()
}

/// The group's records for one period as loaded, with every metric.
pub fn period_detail_rows(
    records: &[DerivedRecord],
    group: &str,
    period: Period,
) -> Vec<DetailRow> {
    slice(records, group, period)
        .into_iter()
        .map(|r| DetailRow {
            insurer: r.group.clone(),
            year: r.period,
            entity: r.entity_key.clone(),
            claimants: format_metric(MetricId::Claimants, r.claimants),
            volumes: format_metric(MetricId::Volumes, r.volumes),
            cost: format_metric(MetricId::Cost, r.cost),
            cost_per_claimant: format_metric(MetricId::CostPerClaimant, r.cost_per_claimant),
            cost_per_volume: format_metric(MetricId::CostPerVolume, r.cost_per_volume),
            claims_per_claimant: format_metric(
                MetricId::ClaimsPerClaimant,
                r.claims_per_claimant,
            ),
        })
        .collect()
}

/// Rows for a top-N view: primary entities in presentation order, with the
/// comparison periods' values on each row.
pub fn top_entity_rows(top: &TopN, metric: MetricId) -> Vec<TopEntityRow> {
    let mut by_entity: HashMap<&str, Vec<String>> = HashMap::new();
    for (period, entities) in &top.comparisons {
        for e in entities {
            by_entity
                .entry(e.entity_key.as_str())
                .or_default()
                .push(format!("{}: {}", period, format_metric(metric, e.metric_value)));
        }
    }
    top.primary
        .iter()
        .map(|e| TopEntityRow {
            cost_rank: e.cost_rank,
            entity: e.entity_key.clone(),
            value: format_metric(metric, e.metric_value),
            pct_of_total_cost: format_pct(e.share_of_total_pct),
            comparisons: by_entity
                .get(e.entity_key.as_str())
                .map(|v| v.join("; "))
                .unwrap_or_default(),
        })
        .collect()
}

pub fn generate_summary(store: &DataStore, group: &str) -> SummaryStats {
    let annual = derive_metrics(store.get(Dataset::Annual));
    let growth = compute_growth_by_entity(&annual);
    let latest = latest_summary(&growth, group);
    let latest_period = latest.map(|g| g.record.period);
    let entities_at_latest = |records: &[Record]| {
        records
            .iter()
            .filter(|r| r.group == group && Some(r.period) == latest_period)
            .count()
    };
    SummaryStats {
        generated_at: Local::now(),
        group: group.to_string(),
        latest_period,
        total_claimants: latest.and_then(|g| finite(g.record.claimants)),
        total_volumes: latest.and_then(|g| finite(g.record.volumes)),
        total_cost: latest.and_then(|g| finite(g.record.cost)),
        cost_growth_pct: latest.and_then(|g| g.growth.cost).and_then(finite),
        total_provinces: entities_at_latest(&store.province),
        total_generics: entities_at_latest(&store.generic),
        total_therapy_classes: entities_at_latest(&store.therapy),
    }
}
