//! Minimal error type for object-store operations.

use std::fmt;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend could not be configured or reached.
    Connection,
    /// A create-only write found an existing object.
    AlreadyExists,
    /// Any other failure reported by the backend.
    Runtime,
}

/// A lightweight error carrying a kind, a message, an optional source, and a
/// retryable flag.
pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<BoxedError>,
    retryable: bool,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl fmt::Display, label: &str, retryable: bool) -> Self {
        Self {
            kind,
            message: format!("[{label}] {msg}"),
            source: None,
            retryable,
        }
    }

    /// Create a runtime error formatted as `[{label}] {msg}`.
    pub fn runtime(msg: impl fmt::Display, label: &str, retryable: bool) -> Self {
        Self::new(ErrorKind::Runtime, msg, label, retryable)
    }

    /// Create a connection error formatted as `[{label}] {msg}`.
    pub fn connection(msg: impl fmt::Display, label: &str, retryable: bool) -> Self {
        Self::new(ErrorKind::Connection, msg, label, retryable)
    }

    /// Create an already-exists error formatted as `[{label}] {msg}`.
    pub fn already_exists(msg: impl fmt::Display, label: &str) -> Self {
        Self::new(ErrorKind::AlreadyExists, msg, label, false)
    }

    /// Attach a source error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error classification.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether a create-only write lost to an existing object.
    #[inline]
    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }

    /// Whether the caller should retry this operation.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("retryable", &self.retryable)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Convert an [`object_store::Error`] into a crate [`Error`].
pub(crate) fn from_object_store(err: object_store::Error) -> Error {
    if matches!(err, object_store::Error::AlreadyExists { .. }) {
        return Error::already_exists(err.to_string(), "object-store").with_source(err);
    }

    let retryable = !matches!(
        err,
        object_store::Error::NotFound { .. }
            | object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. }
            | object_store::Error::Precondition { .. }
    );
    Error::runtime(err.to_string(), "object-store", retryable).with_source(err)
}
