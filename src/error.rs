use std::fmt;

/// Errors reported by a [`Collection`](crate::Collection) or by the repositories built on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A write-side operation (`mutate_in`, `remove`) targeted a document that does not exist.
    DocumentNotFound { key: String },
    /// `insert` targeted a key that already holds a document.
    DocumentExists { key: String },
    /// The request was rejected before reaching any document (over-long key, too many specs).
    InvalidArgument(String),
    Serde(String),
    /// Anything else the underlying store reports: timeouts, connectivity, overload.
    Backend(String),
    LockPoisoned(&'static str),
    /// A read through a prefixing collection failed after its retry.
    PrefixedGet {
        prefix: String,
        key: String,
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::DocumentNotFound { .. } => true,
            StoreError::PrefixedGet { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn is_document_exists(&self) -> bool {
        matches!(self, StoreError::DocumentExists { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DocumentNotFound { key } => write!(f, "document not found: {}", key),
            StoreError::DocumentExists { key } => write!(f, "document already exists: {}", key),
            StoreError::InvalidArgument(message) => write!(f, "invalid argument: {}", message),
            StoreError::Serde(message) => write!(f, "document serialization error: {}", message),
            StoreError::Backend(message) => write!(f, "store error: {}", message),
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::PrefixedGet {
                prefix,
                key,
                source,
            } => write!(
                f,
                "error getting prefixed key. Prefix: {}, key: {}: {}",
                prefix, key, source
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::PrefixedGet { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}
