// Period-over-period growth within each entity's own series.
use log::{debug, warn};
use std::collections::HashMap;
use std::hash::Hash;

use crate::metrics::MetricId;
use crate::types::{DerivedRecord, Growth, GrowthRecord};

/// Percent change from `prev` to `curr`. A zero `prev` gives a non-finite
/// result rather than an error.
pub fn pct_change(prev: f64, curr: f64) -> f64 {
    (curr - prev) / prev * 100.0
}

/// Group records by `key_fn`, sort each group by period and annotate every
/// record with the growth of all six metrics against its predecessor.
///
/// Output is grouped in order of each key's first appearance, ascending by
/// period inside a group. The first record of every group has absent growth.
/// Records sharing a period inside a group cannot be ordered, so they and the
/// record following them get absent growth too.
pub fn compute_growth<K, F>(records: &[DerivedRecord], key_fn: F) -> Vec<GrowthRecord>
where
    K: Hash + Eq,
    F: Fn(&DerivedRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&DerivedRecord>> = Vec::new();
    for r in records {
        let slot = *index.entry(key_fn(r)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(r);
    }
    debug!("computing growth over {} series", groups.len());

    let mut out = Vec::with_capacity(records.len());
    for mut series in groups {
        series.sort_by_key(|r| r.period);
        let n = series.len();
        let dup: Vec<bool> = (0..n)
            .map(|i| {
                (i > 0 && series[i].period == series[i - 1].period)
                    || (i + 1 < n && series[i + 1].period == series[i].period)
            })
            .collect();
        if dup.iter().any(|d| *d) {
            warn!(
                "duplicate periods in series {:?}/{:?}; growth left undefined around them",
                series[0].group, series[0].entity_key
            );
        }

        for i in 0..n {
            let mut growth = Growth::default();
            if i > 0 && !dup[i] && !dup[i - 1] {
                for m in MetricId::ALL {
                    growth.set(m, Some(pct_change(m.value(series[i - 1]), m.value(series[i]))));
                }
            }
            out.push(GrowthRecord {
                record: series[i].clone(),
                growth,
            });
        }
    }
    out
}

/// Growth keyed on `(group, entity_key)`, the usual series identity.
pub fn compute_growth_by_entity(records: &[DerivedRecord]) -> Vec<GrowthRecord> {
    compute_growth(records, |r| (r.group.clone(), r.entity_key.clone()))
}
