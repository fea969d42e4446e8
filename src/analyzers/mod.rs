pub mod ranking_analyzer;

pub use ranking_analyzer::{format_ranked_table, RankingAnalyzer, RankingStatistics, ValueRange};
