use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures at the configuration, dataset and tuner boundaries.
///
/// The scoring path itself never returns an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("parameter is not numeric: {0}")]
    NotNumeric(String),
    #[error("calibration dataset is empty")]
    EmptyDataset,
    #[error("parameter vector has {got} entries, space has {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub fn config(m: &str) -> Error {
    Error::Config(m.to_string())
}
