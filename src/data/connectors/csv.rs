use super::{types::DatasetMetadata, validator::DataValidator};
use crate::data::Dataset;
use crate::error::{Result, TickbreedError};
use crate::types::DatasetName;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| TickbreedError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load, validate and convert one file; the dataset is named after the file stem
    pub fn load_dataset<P: AsRef<Path>>(path: P, min_rows: usize) -> Result<Dataset> {
        let path = path.as_ref();
        let df = Self::load(path)?;

        DataValidator::validate_numeric(&df)?;
        DataValidator::validate_minimum_rows(&df, min_rows)?;

        let null_report = DataValidator::check_nulls(&df);
        if !null_report.is_empty() {
            return Err(TickbreedError::DataLoading(format!(
                "Null values in {}: {:?}",
                path.display(),
                null_report
            )));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| {
                TickbreedError::DataLoading(format!("No file name in {}", path.display()))
            })?;

        Self::to_dataset(DatasetName::new(name), &df)
    }

    /// First column holds time points, the rest are data columns
    pub fn to_dataset(name: DatasetName, df: &DataFrame) -> Result<Dataset> {
        let columns = df.get_columns();
        let (time_column, data_columns) = columns.split_first().ok_or_else(|| {
            TickbreedError::DataLoading(format!("Dataset {} has no columns", name))
        })?;

        let times_cast = time_column.cast(&DataType::Int64)?;
        let times: Vec<i64> = times_cast.i64()?.into_iter().flatten().collect();

        let mut values = Vec::with_capacity(data_columns.len());
        for column in data_columns {
            let cast = column.cast(&DataType::Float64)?;
            let series: Vec<f64> = cast.f64()?.into_iter().flatten().collect();
            values.push(series);
        }

        Dataset::new(name, times, values)
    }

    /// Load every `*.csv` file in `dir`, in file name order
    pub fn load_directory<P: AsRef<Path>>(dir: P, min_rows: usize) -> Result<Vec<Dataset>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(TickbreedError::DataLoading(format!(
                "No CSV files in {}",
                dir.as_ref().display()
            )));
        }

        let mut datasets = Vec::with_capacity(paths.len());
        for path in &paths {
            let dataset = Self::load_dataset(path, min_rows)?;
            let metadata = Self::create_metadata(path, &dataset);
            log::info!(
                "Loaded {} from {} ({} rows, {} columns, time range {:?})",
                metadata.name,
                metadata.file_path,
                metadata.num_rows,
                metadata.num_columns,
                metadata.time_range
            );
            datasets.push(dataset);
        }
        Ok(datasets)
    }

    pub fn create_metadata<P: AsRef<Path>>(path: P, dataset: &Dataset) -> DatasetMetadata {
        let time_range = match (dataset.times().first(), dataset.times().last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        };
        DatasetMetadata {
            name: dataset.name().to_string(),
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: dataset.len(),
            num_columns: dataset.columns().len() + 1,
            time_range,
        }
    }
}
