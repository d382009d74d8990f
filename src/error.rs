use thiserror::Error;

#[derive(Error, Debug)]
pub enum BsmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Output file already exists: {0}")]
    OutputExists(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BsmapError>;
