//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("No model available: {0}")]
    ModelUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job error: {0}")]
    Job(String),
}

pub type Result<T> = std::result::Result<T, Error>;
