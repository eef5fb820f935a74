use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Coarse classification of a wire error, carried alongside the originating
/// OS error's message so a controller can branch on stable categories
/// without string-matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    InvalidInput,
    Io,
    Decode,
    WatchNotFound,
    Generic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NotFound",
            Self::PermissionDenied => "PermissionDenied",
            Self::AlreadyExists => "AlreadyExists",
            Self::InvalidInput => "InvalidInput",
            Self::Io => "Io",
            Self::Decode => "Decode",
            Self::WatchNotFound => "WatchNotFound",
            Self::Generic => "Generic",
        };
        write!(f, "{}", s)
    }
}

/// Maps a [`std::io::Error`] to the wire `errorType` string. POSIX `ENOENT`
/// is reported with that literal name.
pub fn error_type_for(err: &std::io::Error) -> String {
    use std::io::ErrorKind as K;
    match err.kind() {
        K::NotFound => "ENOENT".to_string(),
        K::PermissionDenied => ErrorKind::PermissionDenied.to_string(),
        K::AlreadyExists => ErrorKind::AlreadyExists.to_string(),
        K::InvalidInput => ErrorKind::InvalidInput.to_string(),
        _ => ErrorKind::Io.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed request frame: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("input stream closed")]
    Eof,
}
