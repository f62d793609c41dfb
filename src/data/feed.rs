use crate::types::{Bar, DatasetName};
use std::ops::RangeInclusive;

/// What the robot engine needs from the market-data collaborator
pub trait MarketFeed: Sync {
    /// Datasets in a stable order
    fn dataset_names(&self) -> Vec<DatasetName>;

    fn bar_count(&self) -> usize;

    /// Columns every window exposes, after ignored columns are removed
    fn column_count(&self) -> usize;

    /// Read-only view of `name` at `bar`; `None` when the dataset has no row there
    fn market_window(&self, name: &DatasetName, bar: Bar) -> Option<MarketWindow<'_>>;

    /// Percent change realized at `bar`; `None` until known
    fn realized_change(&self, name: &DatasetName, bar: Bar) -> Option<f64>;

    /// Bars to process for the optional `[start, end]` time range
    fn bar_range(&self, _start: Option<i64>, _end: Option<i64>) -> Option<RangeInclusive<Bar>> {
        self.bar_count().checked_sub(1).map(|last| 0..=last)
    }
}

/// History of one dataset as seen from one bar.
///
/// Offset 0 is the row at the window's bar, offset 1 the row before it, and
/// so on up to `maximum_data_offset - 1`.
#[derive(Debug, Clone, Copy)]
pub struct MarketWindow<'a> {
    columns: &'a [Vec<f64>],
    row: usize,
    maximum_data_offset: usize,
    realized_change: Option<f64>,
}

impl<'a> MarketWindow<'a> {
    pub fn new(
        columns: &'a [Vec<f64>],
        row: usize,
        maximum_data_offset: usize,
        realized_change: Option<f64>,
    ) -> Self {
        Self {
            columns,
            row,
            maximum_data_offset,
            realized_change,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn maximum_data_offset(&self) -> usize {
        self.maximum_data_offset
    }

    /// Number of offsets that currently resolve to data
    pub fn available_offsets(&self) -> usize {
        (self.row + 1).min(self.maximum_data_offset)
    }

    pub fn value(&self, column: usize, offset: usize) -> Option<f64> {
        if offset >= self.available_offsets() {
            return None;
        }
        self.columns.get(column)?.get(self.row - offset).copied()
    }

    pub fn realized_change(&self) -> Option<f64> {
        self.realized_change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_count_backwards() {
        let columns = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let window = MarketWindow::new(&columns, 2, 8, None);
        assert_eq!(window.value(0, 0), Some(3.0));
        assert_eq!(window.value(0, 2), Some(1.0));
        assert_eq!(window.value(0, 3), None);
        assert_eq!(window.value(1, 0), None);
    }

    #[test]
    fn test_maximum_offset_limits_history() {
        let columns = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let window = MarketWindow::new(&columns, 3, 2, Some(1.5));
        assert_eq!(window.available_offsets(), 2);
        assert_eq!(window.value(0, 1), Some(3.0));
        assert_eq!(window.value(0, 2), None);
        assert_eq!(window.realized_change(), Some(1.5));
    }
}
