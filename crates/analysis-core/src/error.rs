use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Need at least {required} scored tickers for comparison, got {available}")]
    InsufficientTickers { required: usize, available: usize },

    #[error("Sink error: {0}")]
    Sink(String),
}
