//! Error types for object store operations.

/// Result type for all object store operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for object store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The object does not exist.
    #[error("Object '{key}' not found")]
    NotFound { key: String },

    /// The destination object exists and overwriting was not requested.
    #[error("Object '{key}' already exists")]
    AlreadyExists { key: String },

    /// The store refused the request.
    #[error("Permission denied for '{key}': {reason}")]
    PermissionDenied { key: String, reason: String },

    /// A signed URL could not be produced.
    #[error("Failed to sign URL for '{key}': {reason}")]
    Signing { key: String, reason: String },

    /// The key is not a valid object path.
    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Any other failure reported by the backing store.
    #[error("Object store {operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: object_store::Error,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an already exists error.
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Create a signing error.
    pub fn signing(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Signing {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Translate an [`object_store::Error`] raised while operating on `key`.
    pub(crate) fn from_store(operation: &'static str, key: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::not_found(key),
            object_store::Error::AlreadyExists { .. } => Self::already_exists(key),
            object_store::Error::PermissionDenied { source, .. }
            | object_store::Error::Unauthenticated { source, .. } => Self::PermissionDenied {
                key: key.to_owned(),
                reason: source.to_string(),
            },
            object_store::Error::InvalidPath { source } => {
                Self::invalid_key(key, source.to_string())
            }
            source => Self::Backend { operation, source },
        }
    }

    /// Returns `true` for the not found class of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller should retry this operation.
    ///
    /// Retrying never helps when the object is missing, already exists,
    /// the request is unauthorized, or the input itself is invalid.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend { source, .. } => !matches!(
                source,
                object_store::Error::Precondition { .. }
                    | object_store::Error::NotSupported { .. }
                    | object_store::Error::NotImplemented
            ),
            Self::Signing { .. } => true,
            _ => false,
        }
    }
}
