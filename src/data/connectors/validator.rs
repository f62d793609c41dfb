use crate::error::{Result, TickbreedError};
use polars::prelude::*;

pub struct DataValidator;

impl DataValidator {
    /// Every column must be numeric: a time column followed by data columns
    pub fn validate_numeric(df: &DataFrame) -> Result<()> {
        if df.width() < 2 {
            return Err(TickbreedError::DataLoading(format!(
                "Expected a time column and at least one data column, found {} columns",
                df.width()
            )));
        }
        for column in df.get_columns() {
            if !matches!(
                column.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::UInt64
                    | DataType::UInt32
            ) {
                return Err(TickbreedError::DataLoading(format!(
                    "Column '{}' must be numeric, found {:?}",
                    column.name(),
                    column.dtype()
                )));
            }
        }
        Ok(())
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(TickbreedError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Columns holding null values, with their counts
    pub fn check_nulls(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }
}
