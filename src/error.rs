use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorytimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    #[error("Response is not plain text (content type: {content_type})")]
    NotText { content_type: String },

    #[error("Page size must be greater than 0")]
    InvalidPageSize,

    #[error("Book not found: {id}")]
    BookNotFound { id: u64 },

    #[error("Book {id} has no readable format")]
    NoReadableFormat { id: u64 },

    #[error("Invalid catalog response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StorytimeError>;
