use std::io;

use thiserror::Error;

/// Errors reported by a [`Bucket`](crate::Bucket) backend.
#[derive(Debug, Error)]
pub enum BucketError {
    /// No object is stored under the requested key.
    #[error("object not found: {0}")]
    NotFound(String),
    /// An IO error occurred while talking to the store.
    #[error("IO error: {0}")]
    Io(io::Error),
    /// Any other backend failure (bad page token, poisoned lock, ...).
    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for BucketError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            BucketError::NotFound(err.to_string())
        } else {
            BucketError::Io(err)
        }
    }
}

/// Coarse classification of a [`BlobFsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path is malformed or uses a disallowed form.
    InvalidPath,
    /// Neither an exact object nor any object below the path exists.
    NotFound,
    /// A bad argument was passed (for example a seek to a negative offset).
    InvalidArgument,
    /// The bucket failed for a reason other than absence.
    Io,
}

/// Error returned by filesystem operations.
///
/// Every variant records the operation (`"open"`, `"stat"`, `"read"`, ...)
/// and the path it was applied to, so callers can render a uniform
/// "operation failed on path X because Y" message.
#[derive(Debug, Error)]
pub enum BlobFsError {
    #[error("{op} {path}: invalid path")]
    InvalidPath { op: &'static str, path: String },
    #[error("{op} {path}: file does not exist")]
    NotFound { op: &'static str, path: String },
    #[error("{op} {path}: invalid argument: {reason}")]
    InvalidArgument {
        op: &'static str,
        path: String,
        reason: String,
    },
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: BucketError,
    },
}

impl BlobFsError {
    pub(crate) fn invalid_path(op: &'static str, path: impl Into<String>) -> Self {
        BlobFsError::InvalidPath {
            op,
            path: path.into(),
        }
    }

    pub(crate) fn not_found(op: &'static str, path: impl Into<String>) -> Self {
        BlobFsError::NotFound {
            op,
            path: path.into(),
        }
    }

    pub(crate) fn invalid_argument(
        op: &'static str,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BlobFsError::InvalidArgument {
            op,
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<String>, source: BucketError) -> Self {
        BlobFsError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Wrap a bucket failure. A missing object maps to [`ErrorKind::NotFound`],
    /// everything else to [`ErrorKind::Io`].
    pub(crate) fn bucket(op: &'static str, path: impl Into<String>, err: BucketError) -> Self {
        match err {
            BucketError::NotFound(_) => BlobFsError::not_found(op, path),
            source => BlobFsError::io(op, path, source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BlobFsError::InvalidPath { .. } => ErrorKind::InvalidPath,
            BlobFsError::NotFound { .. } => ErrorKind::NotFound,
            BlobFsError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            BlobFsError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Name of the operation that failed.
    pub fn op(&self) -> &'static str {
        match self {
            BlobFsError::InvalidPath { op, .. }
            | BlobFsError::NotFound { op, .. }
            | BlobFsError::InvalidArgument { op, .. }
            | BlobFsError::Io { op, .. } => op,
        }
    }

    /// Path the failed operation was applied to.
    pub fn path(&self) -> &str {
        match self {
            BlobFsError::InvalidPath { path, .. }
            | BlobFsError::NotFound { path, .. }
            | BlobFsError::InvalidArgument { path, .. }
            | BlobFsError::Io { path, .. } => path,
        }
    }

    /// Recover a `BlobFsError` carried inside an [`io::Error`] produced by
    /// the `Read`/`Seek` impls of [`BlobFile`](crate::BlobFile).
    pub fn from_io_error(err: &io::Error) -> Option<&BlobFsError> {
        err.get_ref()?.downcast_ref::<BlobFsError>()
    }
}

impl From<BlobFsError> for io::Error {
    fn from(err: BlobFsError) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::InvalidPath | ErrorKind::InvalidArgument => io::ErrorKind::InvalidInput,
            ErrorKind::Io => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
