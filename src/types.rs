use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::DashboardError;
use crate::metrics::MetricId;

/// A period is a calendar year in this domain.
pub type Period = i32;

/// Group key of the book-of-business aggregate across all insurers.
pub const BOB_KEY: &str = "BOB";

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Insurer")]
    pub insurer: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Province", default)]
    pub province: Option<String>,
    #[serde(rename = "Generic_Name", default)]
    pub generic_name: Option<String>,
    #[serde(rename = "Therapy_Class", default)]
    pub therapy_class: Option<String>,
    #[serde(rename = "Claimants")]
    pub claimants: Option<String>,
    #[serde(rename = "Volumes")]
    pub volumes: Option<String>,
    #[serde(rename = "Cost")]
    pub cost: Option<String>,
}

/// One measured observation for an entity in a period.
///
/// `group` is the insurer (or [`BOB_KEY`]) the observation belongs to and
/// `entity_key` is the dataset's grouping dimension: the insurer itself for
/// the annual dataset, otherwise a province, generic name or therapy class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub group: String,
    pub entity_key: String,
    pub period: Period,
    pub claimants: f64,
    pub volumes: f64,
    pub cost: f64,
}

/// A [`Record`] plus its ratio metrics. Ratios over a zero denominator are
/// kept as the non-finite value the division produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub group: String,
    pub entity_key: String,
    pub period: Period,
    pub claimants: f64,
    pub volumes: f64,
    pub cost: f64,
    pub cost_per_claimant: f64,
    pub cost_per_volume: f64,
    pub claims_per_claimant: f64,
}

/// Percent change per tracked metric against the prior period of the same
/// series. `None` means there is no prior period to compare with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Growth {
    pub claimants: Option<f64>,
    pub volumes: Option<f64>,
    pub cost: Option<f64>,
    pub cost_per_claimant: Option<f64>,
    pub cost_per_volume: Option<f64>,
    pub claims_per_claimant: Option<f64>,
}

impl Growth {
    pub fn get(&self, metric: MetricId) -> Option<f64> {
        match metric {
            MetricId::Claimants => self.claimants,
            MetricId::Volumes => self.volumes,
            MetricId::Cost => self.cost,
            MetricId::CostPerClaimant => self.cost_per_claimant,
            MetricId::CostPerVolume => self.cost_per_volume,
            MetricId::ClaimsPerClaimant => self.claims_per_claimant,
        }
    }

    pub fn set(&mut self, metric: MetricId, value: Option<f64>) {
        let slot = match metric {
            MetricId::Claimants => &mut self.claimants,
            MetricId::Volumes => &mut self.volumes,
            MetricId::Cost => &mut self.cost,
            MetricId::CostPerClaimant => &mut self.cost_per_claimant,
            MetricId::CostPerVolume => &mut self.cost_per_volume,
            MetricId::ClaimsPerClaimant => &mut self.claims_per_claimant,
        };
        *slot = value;
    }

    pub fn is_absent(&self) -> bool {
        MetricId::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRecord {
    pub record: DerivedRecord,
    pub growth: Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntity {
    pub entity_key: String,
    pub period: Period,
    pub metric_value: f64,
    pub share_of_total_pct: f64,
    /// 1-based position by `metric_value`, highest first, among the entities
    /// ranked together.
    pub rank: usize,
    /// 1-based position by cost within the entity's whole period slice.
    pub cost_rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Annual,
    Province,
    Generic,
    Therapy,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Annual,
        Dataset::Province,
        Dataset::Generic,
        Dataset::Therapy,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Annual => "annual.csv",
            Dataset::Province => "province.csv",
            Dataset::Generic => "generic.csv",
            Dataset::Therapy => "therapy.csv",
        }
    }

    pub fn entity_label(&self) -> &'static str {
        match self {
            Dataset::Annual => "Insurer",
            Dataset::Province => "Province",
            Dataset::Generic => "Generic Name",
            Dataset::Therapy => "Therapy Class",
        }
    }
}

impl FromStr for Dataset {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" | "yearly" => Ok(Dataset::Annual),
            "province" => Ok(Dataset::Province),
            "generic" => Ok(Dataset::Generic),
            "therapy" => Ok(Dataset::Therapy),
            other => Err(DashboardError::UnknownDataset(other.to_string())),
        }
    }
}

/// Which slice of the data a view is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSelector {
    BookOfBusiness,
    Insurer(String),
}

impl GroupSelector {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(BOB_KEY) {
            GroupSelector::BookOfBusiness
        } else {
            GroupSelector::Insurer(s.to_string())
        }
    }

    pub fn key(&self) -> &str {
        match self {
            GroupSelector::BookOfBusiness => BOB_KEY,
            GroupSelector::Insurer(id) => id,
        }
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSelector::BookOfBusiness => write!(f, "{}", BOB_KEY),
            GroupSelector::Insurer(id) => write!(f, "Insurer {}", id),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AnnualTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: Period,
    #[serde(rename = "Claimants")]
    #[tabled(rename = "Claimants")]
    pub claimants: String,
    #[serde(rename = "Volumes")]
    #[tabled(rename = "Volumes")]
    pub volumes: String,
    #[serde(rename = "Cost")]
    #[tabled(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "CostPerClaimant")]
    #[tabled(rename = "CostPerClaimant")]
    pub cost_per_claimant: String,
    #[serde(rename = "CostPerVolume")]
    #[tabled(rename = "CostPerVolume")]
    pub cost_per_volume: String,
    #[serde(rename = "ClaimsPerClaimant")]
    #[tabled(rename = "ClaimsPerClaimant")]
    pub claims_per_claimant: String,
    #[serde(rename = "ClaimantsGrowth")]
    #[tabled(rename = "ClaimantsGrowth")]
    pub claimants_growth: String,
    #[serde(rename = "VolumesGrowth")]
    #[tabled(rename = "VolumesGrowth")]
    pub volumes_growth: String,
    #[serde(rename = "CostGrowth")]
    #[tabled(rename = "CostGrowth")]
    pub cost_growth: String,
    #[serde(rename = "CostPerClaimantGrowth")]
    #[tabled(rename = "CostPerClaimantGrowth")]
    pub cost_per_claimant_growth: String,
    #[serde(rename = "CostPerVolumeGrowth")]
    #[tabled(rename = "CostPerVolumeGrowth")]
    pub cost_per_volume_growth: String,
    #[serde(rename = "ClaimsPerClaimantGrowth")]
    #[tabled(rename = "ClaimsPerClaimantGrowth")]
    pub claims_per_claimant_growth: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TopEntityRow {
    #[serde(rename = "CostRank")]
    #[tabled(rename = "CostRank")]
    pub cost_rank: usize,
    #[serde(rename = "Entity")]
    #[tabled(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "PctOfTotalCost")]
    #[tabled(rename = "PctOfTotalCost")]
    pub pct_of_total_cost: String,
    #[serde(rename = "Comparisons")]
    #[tabled(rename = "Comparisons")]
    pub comparisons: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BreakdownRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Entity")]
    #[tabled(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "PctOfTotalCost")]
    #[tabled(rename = "PctOfTotalCost")]
    pub pct_of_total_cost: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DetailRow {
    #[serde(rename = "Insurer")]
    #[tabled(rename = "Insurer")]
    pub insurer: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: Period,
    #[serde(rename = "Entity")]
    #[tabled(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Claimants")]
    #[tabled(rename = "Claimants")]
    pub claimants: String,
    #[serde(rename = "Volumes")]
    #[tabled(rename = "Volumes")]
    pub volumes: String,
    #[serde(rename = "Cost")]
    #[tabled(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "CostPerClaimant")]
    #[tabled(rename = "CostPerClaimant")]
    pub cost_per_claimant: String,
    #[serde(rename = "CostPerVolume")]
    #[tabled(rename = "CostPerVolume")]
    pub cost_per_volume: String,
    #[serde(rename = "ClaimsPerClaimant")]
    #[tabled(rename = "ClaimsPerClaimant")]
    pub claims_per_claimant: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingFrameRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: DateTime<Local>,
    pub group: String,
    pub latest_period: Option<Period>,
    pub total_claimants: Option<f64>,
    pub total_volumes: Option<f64>,
    pub total_cost: Option<f64>,
    pub cost_growth_pct: Option<f64>,
    pub total_provinces: usize,
    pub total_generics: usize,
    pub total_therapy_classes: usize,
}
