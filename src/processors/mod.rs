pub mod metadata_joiner;
pub mod normalize;
pub mod pipeline;
pub mod site_ranker;
pub mod timeseries_aggregator;

pub use metadata_joiner::{CoordinateSource, JoinOutcome, MetadataJoiner};
pub use pipeline::{run_aggregate, run_join, run_rank, AggregateOutcome, RankOutcome};
pub use site_ranker::{RankingOutcome, RankingSummary, SiteRanker};
pub use timeseries_aggregator::{merge_onto, TimeseriesAggregator};
