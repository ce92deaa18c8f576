// Claims analytics core: derived metrics, growth rates, top-N rankings with
// cross-period comparison, rank deltas and the ranking playback state.
//
// The CSV loader, exporters and config live alongside the core so the
// console front-end in `main.rs` can feed it and show its results.
pub mod config;
pub mod delta;
pub mod error;
pub mod growth;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod playback;
pub mod ranking;
pub mod reports;
pub mod types;
pub mod util;

pub use delta::{rank_delta, ranking_frame, RankingFrame};
pub use error::DashboardError;
pub use growth::compute_growth;
pub use metrics::{derive_metrics, MetricId};
pub use playback::{Animation, AnimationState, PlaybackStatus};
pub use ranking::{rank_by_metric, rank_top_n, RankQuery, TopN};
pub use types::{DerivedRecord, GrowthRecord, Period, RankedEntity, Record};
