use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected at least 6 fields, found {fields}")]
    ShortRow { line: u64, fields: usize },
    #[error("line {line}, column {column}: could not parse duration from {value:?}")]
    ParseDuration {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("no valid timestamp found, nothing to plot")]
    NoTimestamps,
    #[error("png encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("plotting error: {0}")]
    Plot(String),
    #[error("invalid argument: {0}")]
    Cli(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for Error {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Error::Plot(e.to_string())
    }
}
