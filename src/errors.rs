use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgoError {
    #[error("Invalid input shape: {0}")]
    InvalidInputShape(String),

    #[error("Timestamp {millis} is in the future (now is {now})")]
    FutureTimestamp { millis: i64, now: i64 },

    #[error("Date parsing error: {0}")]
    DateParsing(String),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl AgoError {
    /// Whether the error is one the formatter absorbs into an empty one-shot stream.
    ///
    /// Unparseable strings count as a bad input shape.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            AgoError::InvalidInputShape(_)
                | AgoError::FutureTimestamp { .. }
                | AgoError::DateParsing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AgoError>;
