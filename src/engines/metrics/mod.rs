pub mod profitability;
pub mod summary;
pub mod vote;

pub use profitability::{DatasetStats, ProfitabilityMetrics, VoteRecord};
pub use summary::PopulationSummary;
pub use vote::VoteTally;
