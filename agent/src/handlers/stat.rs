use {
    crate::{error::Result, platform},
    agent_protocol::Reply,
    std::path::Path,
};

/// `Lstat` (no-follow) for the size/mode/modtime/isDir fields, but the
/// three `userMode` bits go through the access-check functions against the
/// same path string, which the OS resolves through symlinks.
pub fn stat(id: i64, path: &str) -> Result<Reply> {
    let meta = std::fs::symlink_metadata(path)?;
    let user_mode = platform::user_mode_bits(Path::new(path));

    Ok(Reply::StatResult {
        id,
        size: meta.len() as i64,
        mode: file_mode(&meta),
        user_mode,
        mod_time: mod_time_nanos(&meta),
        is_dir: meta.is_dir(),
        num_hard_links: platform::num_hard_links(Path::new(path)),
    })
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

#[cfg(windows)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    if meta.is_dir() {
        0x80000000
    } else {
        0
    }
}

fn mod_time_nanos(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_reports_size_and_dir_flag() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();

        let reply = stat(7, file.to_str().unwrap()).unwrap();
        match reply {
            Reply::StatResult { id, size, is_dir, .. } => {
                assert_eq!(id, 7);
                assert_eq!(size, 5);
                assert!(!is_dir);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn stat_missing_path_errors() {
        assert!(stat(1, "/does/not/exist").is_err());
    }
}
