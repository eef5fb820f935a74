use serde::{Deserialize, Serialize};

/// A chunk of a child process's output, carried under a literal `stdout` or
/// `stderr` wire key rather than a stream discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecChunk {
    Stdout {
        #[serde(with = "serde_bytes")]
        stdout: Vec<u8>,
    },
    Stderr {
        #[serde(with = "serde_bytes")]
        stderr: Vec<u8>,
    },
}

/// A reply frame. Every variant carries the `id` of the request it answers
/// (`-1` only for the bootstrap [`Reply::Environment`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    #[serde(rename = "environment")]
    Environment {
        id: i64,
        #[serde(rename = "osType")]
        os_type: String,
        env: Vec<String>,
    },

    #[serde(rename = "statresult")]
    StatResult {
        id: i64,
        size: i64,
        mode: u32,
        #[serde(rename = "userMode")]
        user_mode: u32,
        /// Nanoseconds since the Unix epoch.
        #[serde(rename = "modTime")]
        mod_time: i64,
        #[serde(rename = "isDir")]
        is_dir: bool,
        #[serde(rename = "numHardLinks")]
        num_hard_links: u64,
    },

    #[serde(rename = "isresult")]
    IsResult { id: i64, result: bool },

    #[serde(rename = "readlinkresult")]
    ReadLinkResult { id: i64, target: String },

    #[serde(rename = "fileidresult")]
    FileIdResult {
        id: i64,
        #[serde(rename = "fileId")]
        file_id: String,
    },

    #[serde(rename = "freespaceresult")]
    FreeSpaceResult {
        id: i64,
        #[serde(rename = "freeSpace")]
        free_space: u64,
    },

    #[serde(rename = "finddata")]
    FindData {
        id: i64,
        path: String,
        size: i64,
        mode: u32,
        #[serde(rename = "isDir")]
        is_dir: bool,
        #[serde(rename = "modTime")]
        mod_time: i64,
    },

    #[serde(rename = "findend")]
    FindEnd { id: i64 },

    #[serde(rename = "readfiledata")]
    ReadFileData {
        id: i64,
        #[serde(with = "serde_bytes")]
        contents: Vec<u8>,
    },

    #[serde(rename = "readfiledone")]
    ReadFileDone { id: i64 },

    #[serde(rename = "writefileresult")]
    WriteFileResult {
        id: i64,
        #[serde(rename = "writtenBytes")]
        written_bytes: u64,
    },

    #[serde(rename = "copyfileresult")]
    CopyFileResult { id: i64 },
    #[serde(rename = "renamefileresult")]
    RenameFileResult { id: i64 },
    #[serde(rename = "removeresult")]
    RemoveResult { id: i64 },
    #[serde(rename = "removeallresult")]
    RemoveAllResult { id: i64 },
    #[serde(rename = "createdirresult")]
    CreateDirResult { id: i64 },
    #[serde(rename = "ensureexistingfileresult")]
    EnsureExistingFileResult { id: i64 },
    #[serde(rename = "setpermissionsresult")]
    SetPermissionsResult { id: i64 },

    #[serde(rename = "createtempfileresult")]
    CreateTempFileResult { id: i64, path: String },

    #[serde(rename = "execdata")]
    ExecData {
        id: i64,
        #[serde(flatten)]
        chunk: ExecChunk,
    },

    #[serde(rename = "execresult")]
    ExecResult { id: i64, code: i32 },

    #[serde(rename = "signalsuccess")]
    SignalSuccess { id: i64 },

    #[serde(rename = "addwatchresult")]
    AddWatchResult { id: i64, result: bool },

    #[serde(rename = "removewatchresult")]
    RemoveWatchResult { id: i64, result: bool },

    #[serde(rename = "watchEvent")]
    WatchEvent {
        id: i64,
        path: String,
        #[serde(rename = "eventType")]
        event_type: i32,
    },

    #[serde(rename = "error")]
    Error {
        id: i64,
        error: String,
        #[serde(rename = "errorType")]
        error_type: String,
    },
}

impl Reply {
    pub fn id(&self) -> i64 {
        match self {
            Reply::Environment { id, .. }
            | Reply::StatResult { id, .. }
            | Reply::IsResult { id, .. }
            | Reply::ReadLinkResult { id, .. }
            | Reply::FileIdResult { id, .. }
            | Reply::FreeSpaceResult { id, .. }
            | Reply::FindData { id, .. }
            | Reply::FindEnd { id, .. }
            | Reply::ReadFileData { id, .. }
            | Reply::ReadFileDone { id, .. }
            | Reply::WriteFileResult { id, .. }
            | Reply::CopyFileResult { id, .. }
            | Reply::RenameFileResult { id, .. }
            | Reply::RemoveResult { id, .. }
            | Reply::RemoveAllResult { id, .. }
            | Reply::CreateDirResult { id, .. }
            | Reply::EnsureExistingFileResult { id, .. }
            | Reply::SetPermissionsResult { id, .. }
            | Reply::CreateTempFileResult { id, .. }
            | Reply::ExecData { id, .. }
            | Reply::ExecResult { id, .. }
            | Reply::SignalSuccess { id, .. }
            | Reply::AddWatchResult { id, .. }
            | Reply::RemoveWatchResult { id, .. }
            | Reply::WatchEvent { id, .. }
            | Reply::Error { id, .. } => *id,
        }
    }

    /// `true` for every reply kind except the streaming data chunks —
    /// the one that closes out a request (terminal-type reply or `error`).
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Reply::FindData { .. } | Reply::ReadFileData { .. } | Reply::ExecData { .. }
        )
    }

    pub fn error(id: i64, err: impl std::fmt::Display, error_type: impl Into<String>) -> Self {
        Reply::Error {
            id,
            error: err.to_string(),
            error_type: error_type.into(),
        }
    }
}
