use crate::error::{Result, TickbreedError};
use crate::types::DatasetName;

/// One market time-series: ascending time points and their numeric columns
#[derive(Debug, Clone)]
pub struct Dataset {
    name: DatasetName,
    times: Vec<i64>,
    columns: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(name: DatasetName, times: Vec<i64>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(TickbreedError::DataLoading(format!(
                "Dataset {} has no data columns",
                name
            )));
        }
        if let Some(bad) = columns.iter().position(|c| c.len() != times.len()) {
            return Err(TickbreedError::DataLoading(format!(
                "Dataset {}: column {} has {} rows, expected {}",
                name,
                bad,
                columns[bad].len(),
                times.len()
            )));
        }
        if let Some(row) = times.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TickbreedError::DataLoading(format!(
                "Dataset {}: time points must be strictly ascending (row {})",
                name,
                row + 1
            )));
        }
        Ok(Self { name, times, columns })
    }

    pub fn name(&self) -> &DatasetName {
        &self.name
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Percent change of the first data column against the previous row
    pub fn change_at(&self, row: usize) -> Option<f64> {
        if row == 0 {
            return None;
        }
        let series = &self.columns[0];
        let previous = *series.get(row - 1)?;
        let current = *series.get(row)?;
        if previous == 0.0 {
            return None;
        }
        let change = (current - previous) / previous * 100.0;
        change.is_finite().then_some(change)
    }
}
