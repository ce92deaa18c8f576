use crate::types::Period;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    Config { key: String, value: String },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("duplicate period {period} for {entity_key:?} in group {group:?}")]
    DuplicatePeriod {
        group: String,
        entity_key: String,
        period: Period,
    },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
