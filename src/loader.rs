use csv::ReaderBuilder;
use log::{info, warn};
use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::Path;

use crate::error::{DashboardError, Result};
use crate::types::{Dataset, Period, RawRow, Record, BOB_KEY};
use crate::util::{parse_f64_safe, parse_i32_safe};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub duplicates: usize,
}

/// In-memory record sets, one per dataset.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    pub annual: Vec<Record>,
    pub province: Vec<Record>,
    pub generic: Vec<Record>,
    pub therapy: Vec<Record>,
}

impl DataStore {
    pub fn get(&self, dataset: Dataset) -> &[Record] {
        match dataset {
            Dataset::Annual => &self.annual,
            Dataset::Province => &self.province,
            Dataset::Generic => &self.generic,
            Dataset::Therapy => &self.therapy,
        }
    }

    fn slot(&mut self, dataset: Dataset) -> &mut Vec<Record> {
        match dataset {
            Dataset::Annual => &mut self.annual,
            Dataset::Province => &mut self.province,
            Dataset::Generic => &mut self.generic,
            Dataset::Therapy => &mut self.therapy,
        }
    }

    /// Load every dataset file from `dir`.
    pub fn load_dir(dir: &Path) -> Result<(DataStore, Vec<(Dataset, LoadReport)>)> {
        let mut store = DataStore::default();
        let mut reports = Vec::new();
        for dataset in Dataset::ALL {
            let path = dir.join(dataset.file_name());
            let (records, report) = load_dataset(&path, dataset)?;
            validate_unique(&records)?;
            info!(
                "{}: {} of {} rows loaded",
                path.display(),
                report.loaded_rows,
                report.total_rows
            );
            *store.slot(dataset) = records;
            reports.push((dataset, report));
        }
        Ok((store, reports))
    }
}

pub fn load_dataset(path: &Path, dataset: Dataset) -> Result<(Vec<Record>, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    read_records(rdr, dataset)
}

pub fn load_from_reader<R: io::Read>(
    reader: R,
    dataset: Dataset,
) -> Result<(Vec<Record>, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    read_records(rdr, dataset)
}

fn read_records<R: io::Read>(
    mut rdr: csv::Reader<R>,
    dataset: Dataset,
) -> Result<(Vec<Record>, LoadReport)> {
    let mut report = LoadReport::default();
    let mut seen: HashSet<(String, String, Period)> = HashSet::new();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };

        let group = match row.insurer.as_deref().map(str::trim) {
            Some(g) if !g.is_empty() => g.to_string(),
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };
        let entity = match dataset {
            Dataset::Annual => Some(group.clone()),
            Dataset::Province => row.province,
            Dataset::Generic => row.generic_name,
            Dataset::Therapy => row.therapy_class,
        };
        let entity_key = match entity.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };
        let period = match parse_i32_safe(row.year.as_deref()) {
            Some(y) => y,
            None => {
                report.parse_errors += 1;
                continue;
            }
        };
        let (claimants, volumes, cost) = match (
            parse_f64_safe(row.claimants.as_deref()),
            parse_f64_safe(row.volumes.as_deref()),
            parse_f64_safe(row.cost.as_deref()),
        ) {
            (Some(c), Some(v), Some(k)) => (c, v, k),
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };

        // A series may hold one record per period; later repeats are rejected.
        if !seen.insert((group.clone(), entity_key.clone(), period)) {
            warn!(
                "{}: duplicate {} {:?} for {} in {}, row skipped",
                dataset.file_name(),
                dataset.entity_label(),
                entity_key,
                group,
                period
            );
            report.duplicates += 1;
            continue;
        }

        records.push(Record {
            group,
            entity_key,
            period,
            claimants,
            volumes,
            cost,
        });
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}

/// Reject record sets holding the same `(group, entity_key, period)` twice.
pub fn validate_unique(records: &[Record]) -> Result<()> {
    let mut seen: HashSet<(&str, &str, Period)> = HashSet::new();
    for r in records {
        if !seen.insert((r.group.as_str(), r.entity_key.as_str(), r.period)) {
            return Err(DashboardError::DuplicatePeriod {
                group: r.group.clone(),
                entity_key: r.entity_key.clone(),
                period: r.period,
            });
        }
    }
    Ok(())
}

/// Insurer ids present in a record set, sorted, without the BOB aggregate.
pub fn insurers(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.group.as_str())
        .filter(|g| *g != BOB_KEY)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct periods in a record set, ascending.
pub fn periods(records: &[Record]) -> Vec<Period> {
    records
        .iter()
        .map(|r| r.period)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const THERAPY: &str = "\
Insurer,Year,Therapy_Class,Claimants,Volumes,Cost
BOB,2023,Statins,100,300,\"12,000\"
BOB,2024,Statins,110,320,13000
2,2024,Statins,10,30,1500
BOB,2024,Statins,1,1,1
BOB,2024,,5,5,5
BOB,twenty,Insulin,5,5,5
BOB,2024,Insulin,50,90,abc
";

    #[test]
    fn loads_and_counts_rejections() {
        let (records, report) = load_from_reader(THERAPY.as_bytes(), Dataset::Therapy).unwrap();
        assert_eq!(report.total_rows, 7);
        assert_eq!(report.loaded_rows, 3);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.parse_errors, 3);
        assert_eq!(records[0].cost, 12_000.0);
        assert_eq!(records[0].entity_key, "Statins");
        assert_eq!(records[2].group, "2");
        assert!(validate_unique(&records).is_ok());
    }

    #[test]
    fn annual_entity_is_the_insurer() {
        let csv = "Insurer,Year,Claimants,Volumes,Cost\nBOB,2024,1,2,3\n7,2024,1,2,3\n";
        let (records, _) = load_from_reader(csv.as_bytes(), Dataset::Annual).unwrap();
        assert_eq!(records[1].entity_key, "7");
        assert_eq!(insurers(&records), vec!["7".to_string()]);
        assert_eq!(periods(&records), vec![2024]);
    }

    #[test]
    fn validate_unique_rejects_repeats() {
        let r = Record {
            group: "BOB".to_string(),
            entity_key: "X".to_string(),
            period: 2020,
            claimants: 1.0,
            volumes: 1.0,
            cost: 1.0,
        };
        let err = validate_unique(&[r.clone(), r]).unwrap_err();
        assert!(matches!(err, DashboardError::DuplicatePeriod { period: 2020, .. }));
    }
}
