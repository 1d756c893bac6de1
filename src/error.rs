//! Library-wide error and result types.

use std::io;

use thiserror::Error;

/// Result alias used throughout vdrive.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept terse; callers that need richer context should
/// wrap `Error` in their own type.
#[derive(Debug, Error)]
pub enum Error {
    /// No container is mounted in the session.
    #[error("no container mounted")]
    NotMounted,
    /// A caller-supplied argument is unusable (e.g. an empty read buffer).
    #[error("invalid argument")]
    InvalidArgument,
    /// A read would extend past the end of the physical file.
    #[error("read outside of the physical file")]
    OutOfRange,
    /// The physical store returned fewer bytes than requested.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
    /// The container's structure is inconsistent (message describes which
    /// constraint failed).
    #[error("malformed container: {0}")]
    MalformedContainer(&'static str),
    /// The path is empty or names a container type that cannot be mounted.
    #[error("unsupported container type")]
    UnsupportedType,
    /// The directory table would exceed its fixed capacity.
    #[error("virtual directory capacity exceeded")]
    CapacityExceeded,
    /// An offset or size does not fit the 32-bit virtual file fields.
    #[error("offset or size does not fit in 32 bits")]
    OffsetOverflow,
    /// The stream ended before all expected bytes could be read.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Key material needed for an operation was not loaded.
    #[error("missing key: {0}")]
    MissingKey(&'static str),
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => Error::Io(e),
        }
    }
}
