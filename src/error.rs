use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    // The only recoverable error. Rendered as the warning page instead of failing the run.
    #[error("No data available: {0}")]
    DataUnavailable(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid date on row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid total on row {row}: {value:?}")]
    InvalidTotal { row: usize, value: String },

    #[error("Unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, ReportError::DataUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
