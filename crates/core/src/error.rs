//! Error types for the order-book feature system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the order-book feature system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (malformed raw snapshot).
    #[error("Data error: {0}")]
    Data(String),

    /// Book level index beyond the configured depth.
    #[error("Level {level} out of range for book depth {n_levels}")]
    LevelOutOfRange { level: usize, n_levels: usize },

    /// Snapshot received for a symbol that was never subscribed.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create an unknown symbol error.
    pub fn unknown_symbol(symbol: impl Into<String>) -> Self {
        Error::UnknownSymbol(symbol.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_out_of_range_message() {
        let err = Error::LevelOutOfRange { level: 12, n_levels: 10 };
        assert_eq!(err.to_string(), "Level 12 out of range for book depth 10");
    }

    #[test]
    fn test_json_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
