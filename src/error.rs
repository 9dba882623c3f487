use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanzasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// The input file or worksheet could not be read. Fatal for a run.
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("{operation}: missing column(s) {}", .columns.join(", "))]
    MissingColumns {
        operation: &'static str,
        columns: Vec<&'static str>,
    },

    #[error("No data: {0}")]
    NoData(String),

    #[error("Chart render error: {0}")]
    Render(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, FinanzasError>;
