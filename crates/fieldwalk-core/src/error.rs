//! Error types for the fieldwalk core library.

/// Errors that can occur while ingesting, reconciling, or updating field groups.
///
/// Row-level geocoding failures are not errors: they are carried as
/// [`ResolutionFailure`](crate::ResolutionFailure) values in the ingest report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No recognizable address column in an uploaded table. Fatal for the batch.
    #[error("Schema error: {message} (headers: {headers:?})")]
    Schema {
        /// What went wrong
        message: String,
        /// The headers that were actually present
        headers: Vec<String>,
    },

    /// Uploaded payload is not a supported tabular format
    #[error("Unsupported format: {name}")]
    UnsupportedFormat {
        /// File name or format hint that was rejected
        name: String,
    },

    /// No field group exists for the key
    #[error("Field group not found: {dataset}/{postal_code}")]
    NotFound {
        /// Dataset that was searched
        dataset: String,
        /// Postal code (or fallback key) that was searched
        postal_code: String,
    },

    /// A field group with the key already exists, or changed under a
    /// conditional write
    #[error("Field group conflict: {dataset}/{postal_code}")]
    Conflict {
        /// Dataset of the conflicting group
        dataset: String,
        /// Postal code of the conflicting group
        postal_code: String,
    },

    /// Store or provider unreachable, or it answered with a failure
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation error
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias for fieldwalk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether the failure is transient.
    ///
    /// Only used for reporting; nothing in fieldwalk retries automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Io(_) => true,
            Error::Schema { .. } => false,
            Error::UnsupportedFormat { .. } => false,
            Error::NotFound { .. } => false,
            Error::Conflict { .. } => false,
            Error::Validation { .. } => false,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
        }
    }

    /// Creates a schema error listing the headers that were seen.
    pub fn schema<S: Into<String>>(message: S, headers: Vec<String>) -> Self {
        Error::Schema {
            message: message.into(),
            headers,
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format<S: Into<String>>(name: S) -> Self {
        Error::UnsupportedFormat { name: name.into() }
    }

    /// Creates a not-found error for a group key.
    pub fn not_found<D, P>(dataset: D, postal_code: P) -> Self
    where
        D: Into<String>,
        P: Into<String>,
    {
        Error::NotFound {
            dataset: dataset.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Creates a conflict error for a group key.
    pub fn conflict<D, P>(dataset: D, postal_code: P) -> Self
    where
        D: Into<String>,
        P: Into<String>,
    {
        Error::Conflict {
            dataset: dataset.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Creates a new transport error with a message.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transport error with a message and source error.
    pub fn transport_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
