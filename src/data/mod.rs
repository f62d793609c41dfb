pub mod connectors;
pub mod dataset;
pub mod feed;
pub mod store;
pub mod timeline;

pub use connectors::{CsvConnector, DatasetMetadata};
pub use dataset::Dataset;
pub use feed::{MarketFeed, MarketWindow};
pub use store::MarketData;
pub use timeline::{IndexedTimeline, Timeline, TimelineIndexer};
