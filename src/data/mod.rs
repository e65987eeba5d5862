pub mod feeds;

pub use feeds::{FearGreedSnapshot, HistoricalSummary, HistoricalTrade};
