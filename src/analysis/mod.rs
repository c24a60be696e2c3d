//! Ranking and aggregation engine shared by all three report types.

pub mod aggregator;
pub mod normalize;
pub mod ranking;

pub use aggregator::{aggregate_entity, aggregate_state};
pub use normalize::{normalize_records, round2};
pub use ranking::rank;
