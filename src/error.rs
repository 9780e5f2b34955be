//! Error types for Freelance Hub.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend cannot be reached at all. The session store degrades to
    /// in-memory operation when it sees this.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this failure means the backend is gone rather than a single
    /// bad value.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Session and onboarding errors surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with email {email} already exists")]
    EmailAlreadyRegistered { email: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Validation failed for field {field}")]
    ValidationFailed { field: String },
}

impl SessionError {
    pub fn validation(field: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
        }
    }

    /// Errors the user can fix inline. Storage loss is handled by degrading
    /// the session instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_counts_as_unavailable() {
        let err = StorageError::from(std::io::Error::other("disk gone"));
        assert!(err.is_unavailable());
        assert!(!StorageError::Serialization("bad json".into()).is_unavailable());
    }

    #[test]
    fn storage_loss_is_not_inline_recoverable() {
        assert!(SessionError::InvalidCredentials.is_recoverable());
        assert!(SessionError::validation("email").is_recoverable());
        assert!(!SessionError::StorageUnavailable("x".into()).is_recoverable());
    }

    #[test]
    fn validation_message_names_field() {
        let err = SessionError::validation("firstName");
        assert_eq!(err.to_string(), "Validation failed for field firstName");
    }
}
