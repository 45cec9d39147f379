use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A single file could not be parsed. Recovered locally by the pipeline.
    #[error("Parse error in {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("Failed to load the Python grammar: {0}")]
    LanguageError(String),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Invalid line range: {0}")]
    InvalidRange(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
