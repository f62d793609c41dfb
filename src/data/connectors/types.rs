use serde::{Deserialize, Serialize};

/// Summary of one loaded dataset file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    pub file_path: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub time_range: Option<(i64, i64)>,
}
