use super::dataset::Dataset;
use super::feed::{MarketFeed, MarketWindow};
use super::timeline::{Timeline, TimelineIndexer};
use crate::config::PopulationConfig;
use crate::error::{Result, TickbreedError};
use crate::types::{Bar, DatasetName};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

struct IndexedDataset {
    dataset: Dataset,
    rows: Vec<Option<usize>>,
}

/// In-memory market data indexed against a master timeline
pub struct MarketData {
    sets: BTreeMap<DatasetName, IndexedDataset>,
    timeline: Timeline,
    ignore_columns: usize,
    maximum_data_offset: usize,
    column_count: usize,
}

impl MarketData {
    pub fn new(datasets: Vec<Dataset>, config: &PopulationConfig) -> Result<Self> {
        let indexer = TimelineIndexer::with_available_parallelism()?;
        Self::with_indexer(datasets, config, &indexer)
    }

    pub fn with_indexer(
        datasets: Vec<Dataset>,
        config: &PopulationConfig,
        indexer: &TimelineIndexer,
    ) -> Result<Self> {
        if datasets.is_empty() {
            return Err(TickbreedError::DataLoading("No datasets loaded".to_string()));
        }
        let mut column_count = usize::MAX;
        for dataset in &datasets {
            let usable = dataset.columns().len().saturating_sub(config.ignore_columns);
            if usable == 0 {
                return Err(TickbreedError::DataLoading(format!(
                    "Dataset {} has {} columns, all ignored (ignore_columns = {})",
                    dataset.name(),
                    dataset.columns().len(),
                    config.ignore_columns
                )));
            }
            column_count = column_count.min(usable);
        }

        let indexed = indexer.index(&datasets);
        let mut sets = BTreeMap::new();
        for (dataset, rows) in datasets.into_iter().zip(indexed.rows) {
            if sets.contains_key(dataset.name()) {
                return Err(TickbreedError::DataLoading(format!(
                    "Duplicate dataset name: {}",
                    dataset.name()
                )));
            }
            sets.insert(dataset.name().clone(), IndexedDataset { dataset, rows });
        }

        log::info!(
            "Loaded {} datasets over {} bars ({} usable columns)",
            sets.len(),
            indexed.timeline.len(),
            column_count
        );

        Ok(Self {
            sets,
            timeline: indexed.timeline,
            ignore_columns: config.ignore_columns,
            maximum_data_offset: config.maximum_data_offset,
            column_count,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn dataset(&self, name: &DatasetName) -> Option<&Dataset> {
        self.sets.get(name).map(|s| &s.dataset)
    }

    fn row(&self, name: &DatasetName, bar: Bar) -> Option<(&IndexedDataset, usize)> {
        let set = self.sets.get(name)?;
        let row = (*set.rows.get(bar)?)?;
        Some((set, row))
    }
}

impl MarketFeed for MarketData {
    fn dataset_names(&self) -> Vec<DatasetName> {
        self.sets.keys().cloned().collect()
    }

    fn bar_count(&self) -> usize {
        self.timeline.len()
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn market_window(&self, name: &DatasetName, bar: Bar) -> Option<MarketWindow<'_>> {
        let (set, row) = self.row(name, bar)?;
        let columns = &set.dataset.columns()[self.ignore_columns..];
        Some(MarketWindow::new(
            &columns[..self.column_count],
            row,
            self.maximum_data_offset,
            set.dataset.change_at(row),
        ))
    }

    fn realized_change(&self, name: &DatasetName, bar: Bar) -> Option<f64> {
        let (set, row) = self.row(name, bar)?;
        set.dataset.change_at(row)
    }

    fn bar_range(&self, start: Option<i64>, end: Option<i64>) -> Option<RangeInclusive<Bar>> {
        self.timeline.clamp(start, end)
    }
}
