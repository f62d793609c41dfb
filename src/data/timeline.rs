use super::dataset::Dataset;
use crate::error::{Result, TickbreedError};
use crate::types::Bar;
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// Master timeline: the sorted union of every dataset's time points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    points: Vec<i64>,
}

impl Timeline {
    pub fn new(mut points: Vec<i64>) -> Self {
        points.sort_unstable();
        points.dedup();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[i64] {
        &self.points
    }

    pub fn get(&self, bar: Bar) -> Option<i64> {
        self.points.get(bar).copied()
    }

    pub fn first(&self) -> Option<i64> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.points.last().copied()
    }

    pub fn index_of(&self, time: i64) -> Option<Bar> {
        self.points.binary_search(&time).ok()
    }

    /// First bar at or after `time`, or the last bar when `time` is past the end
    pub fn nearest_index(&self, time: i64) -> Option<Bar> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|&p| p < time);
        Some(idx.min(self.points.len() - 1))
    }

    /// Bars covered by `[start, end]`, with both ends clamped to the loaded data
    pub fn clamp(&self, start: Option<i64>, end: Option<i64>) -> Option<RangeInclusive<Bar>> {
        let first = self.first()?;
        let last = self.last()?;
        let start = start.map_or(first, |s| s.max(first));
        let end = end.map_or(last, |e| e.min(last));
        if start > end {
            return None;
        }
        let start_bar = self.points.partition_point(|&p| p < start);
        let end_bar = self.points.partition_point(|&p| p <= end).checked_sub(1)?;
        (start_bar <= end_bar).then_some(start_bar..=end_bar)
    }
}

/// Timeline plus, per dataset (in input order), the row backing each bar
#[derive(Debug, Clone)]
pub struct IndexedTimeline {
    pub timeline: Timeline,
    pub rows: Vec<Vec<Option<usize>>>,
}

/// Merges dataset time points on a dedicated, bounded worker pool.
///
/// `index` returns only after every dataset has been merged and mapped, so
/// callers can read bars as soon as it returns.
pub struct TimelineIndexer {
    pool: rayon::ThreadPool,
}

impl TimelineIndexer {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("timeline-indexer-{}", i))
            .build()
            .map_err(|e| TickbreedError::DataLoading(format!("Failed to start indexer: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn with_available_parallelism() -> Result<Self> {
        let threads = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        Self::new(threads)
    }

    pub fn index(&self, datasets: &[Dataset]) -> IndexedTimeline {
        self.pool.install(|| {
            let mut points: Vec<i64> = datasets
                .par_iter()
                .flat_map_iter(|d| d.times().iter().copied())
                .collect();
            points.par_sort_unstable();
            points.dedup();
            let timeline = Timeline { points };

            let rows = datasets
                .par_iter()
                .map(|d| {
                    let mut rows = vec![None; timeline.len()];
                    for (row, &time) in d.times().iter().enumerate() {
                        if let Some(bar) = timeline.index_of(time) {
                            rows[bar] = Some(row);
                        }
                    }
                    rows
                })
                .collect();

            log::debug!(
                "Indexed {} datasets into {} time points",
                datasets.len(),
                timeline.len()
            );
            IndexedTimeline { timeline, rows }
        })
    }
}
