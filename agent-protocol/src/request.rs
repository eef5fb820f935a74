use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// One of the ten predicates recognised by an `is` request.
///
/// Numeric values are stable across releases so a controller that
/// hardcodes the integer codes keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum IsCheck {
    ReadableFile = 0,
    WritableFile = 1,
    ExecutableFile = 2,
    ReadableDir = 3,
    WritableDir = 4,
    File = 5,
    Dir = 6,
    Exists = 7,
    Symlink = 8,
}

/// A caller-issued request, tagged on the wire by its `type` field.
///
/// The caller-assigned `id` is carried by every variant (§3 Data Model);
/// accessed uniformly via [`Request::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "stat")]
    Stat { id: i64, path: String },

    #[serde(rename = "is")]
    Is {
        id: i64,
        path: String,
        check: IsCheck,
    },

    #[serde(rename = "find")]
    Find {
        id: i64,
        directory: String,
        name_filters: Vec<String>,
        file_filters: i64,
        iterator_flags: i64,
    },

    #[serde(rename = "readfile")]
    ReadFile {
        id: i64,
        path: String,
        offset: i64,
        limit: i64,
    },

    #[serde(rename = "writefile")]
    WriteFile {
        id: i64,
        path: String,
        #[serde(with = "serde_bytes")]
        contents: Vec<u8>,
    },

    #[serde(rename = "copyfile")]
    CopyFile {
        id: i64,
        source: String,
        target: String,
    },

    #[serde(rename = "renamefile")]
    RenameFile {
        id: i64,
        source: String,
        target: String,
    },

    #[serde(rename = "setpermissions")]
    SetPermissions { id: i64, path: String, mode: u32 },

    #[serde(rename = "remove")]
    Remove { id: i64, path: String },

    #[serde(rename = "removeall")]
    RemoveAll { id: i64, path: String },

    #[serde(rename = "ensureexistingfile")]
    EnsureExistingFile { id: i64, path: String },

    #[serde(rename = "createdir")]
    CreateDir { id: i64, path: String },

    #[serde(rename = "createtempfile")]
    CreateTempFile { id: i64, path: String },

    #[serde(rename = "readlink")]
    ReadLink { id: i64, path: String },

    #[serde(rename = "fileid")]
    FileId { id: i64, path: String },

    #[serde(rename = "freespace")]
    FreeSpace { id: i64, path: String },

    #[serde(rename = "exec")]
    Exec {
        id: i64,
        args: Vec<String>,
        env: Vec<String>,
        #[serde(with = "serde_bytes")]
        stdin: Vec<u8>,
    },

    #[serde(rename = "signal")]
    Signal {
        id: i64,
        pid: i64,
        signal: SignalKind,
    },

    #[serde(rename = "watch")]
    Watch { id: i64, path: String },

    #[serde(rename = "stopwatch")]
    StopWatch { id: i64 },

    #[serde(rename = "exit")]
    Exit { id: i64 },

    /// Synthesized by the codec when an inbound frame fails to decode;
    /// never sent by a well-behaved controller.
    #[serde(rename = "error")]
    Error { id: i64, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Terminate,
    Kill,
    Interrupt,
}

impl Request {
    pub fn id(&self) -> i64 {
        match self {
            Request::Stat { id, .. }
            | Request::Is { id, .. }
            | Request::Find { id, .. }
            | Request::ReadFile { id, .. }
            | Request::WriteFile { id, .. }
            | Request::CopyFile { id, .. }
            | Request::RenameFile { id, .. }
            | Request::SetPermissions { id, .. }
            | Request::Remove { id, .. }
            | Request::RemoveAll { id, .. }
            | Request::EnsureExistingFile { id, .. }
            | Request::CreateDir { id, .. }
            | Request::CreateTempFile { id, .. }
            | Request::ReadLink { id, .. }
            | Request::FileId { id, .. }
            | Request::FreeSpace { id, .. }
            | Request::Exec { id, .. }
            | Request::Signal { id, .. }
            | Request::Watch { id, .. }
            | Request::StopWatch { id, .. }
            | Request::Exit { id, .. }
            | Request::Error { id, .. } => *id,
        }
    }
}

/// Bitmask constants for `find`'s `file_filters` field.
pub mod find_filters {
    pub const DIRS: i64 = 0x001;
    pub const FILES: i64 = 0x002;
    pub const DRIVES: i64 = 0x004;
    pub const NO_SYMLINKS: i64 = 0x008;
    pub const READABLE: i64 = 0x010;
    pub const WRITABLE: i64 = 0x020;
    pub const EXECUTABLE: i64 = 0x040;
    pub const NO_FILTER: i64 = -1;
}

/// Bitmask constants for `find`'s `iterator_flags` field.
pub mod find_iterator_flags {
    pub const NONE: i64 = 0x0;
    pub const FOLLOW_SYMLINKS: i64 = 0x1;
    pub const SUBDIRECTORIES: i64 = 0x2;
}
