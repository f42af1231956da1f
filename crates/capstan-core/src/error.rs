//! Error types shared across capstan crates.

/// The result type used throughout capstan-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier failed validation.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the identifier invalid.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_display() {
        let err = Error::InvalidId {
            message: "empty application id".into(),
        };
        assert!(err.to_string().contains("invalid identifier"));
        assert!(err.to_string().contains("empty application id"));
    }
}
