//! Error types for the analysis core

/// Errors raised while building the analysis context or splitting text
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Invalid chunking parameters: {0}")]
    InvalidChunking(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
