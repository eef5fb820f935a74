use {
    agent_protocol::ErrorKind,
    std::{fmt, io},
    thiserror::Error,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Handler-local error, timestamped so it lines up with the log records
/// streamed alongside it.
#[derive(Debug)]
pub struct Error {
    time: i64,
    inner: Err,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }

    pub fn timestamp_nanos(&self) -> i64 {
        self.time
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for Error {}

impl<F> From<F> for Error
where
    F: Into<Err>,
{
    fn from(f: F) -> Self {
        Self {
            time: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            inner: f.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Err {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("Watch not found")]
    WatchNotFound,
    #[error("{0}")]
    Notify(#[from] notify::Error),
    #[error("{0}")]
    Generic(String),
}

impl Err {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Err::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                _ => ErrorKind::Io,
            },
            Err::WatchNotFound => ErrorKind::WatchNotFound,
            Err::Notify(_) => ErrorKind::Io,
            Err::Generic(_) => ErrorKind::Generic,
        }
    }
}

/// Renders this error's wire-visible `(message, errorType)` pair, including
/// the `ENOENT` special case.
pub fn wire_parts(err: &Error) -> (String, String) {
    if let Err::Io(io_err) = &err.inner {
        return (io_err.to_string(), agent_protocol::error_type_for(io_err));
    }
    (err.to_string(), err.kind().to_string())
}
