//! Unified application error type.
//! Every layer (config, crawler, store, cli) returns AppError so that the
//! exit code is decided in one place.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / encoding
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Crawl errors
    // ---------------------------
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Calendar navigation error: {0}")]
    Navigation(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Crawl deadline of {0}s exceeded; nothing was merged")]
    DeadlineExceeded(u64),

    // ---------------------------
    // Store errors
    // ---------------------------
    #[error("Failed to persist workout log: {0}")]
    Persistence(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Authentication(_) | AppError::MissingCredential(_) => 2,
            _ => 1,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
