//! `find`: walks `directory`, streaming one `finddata` reply per matching
//! entry followed by a terminal `findend`.

use {
    crate::{error::Result, platform, writer::Batcher},
    agent_protocol::{
        request::{find_filters as ff, find_iterator_flags as fl},
        Reply,
    },
    std::path::Path,
    walkdir::{DirEntry, WalkDir},
};

pub fn find(
    id: i64,
    directory: &str,
    name_filters: &[String],
    file_filters: i64,
    iterator_flags: i64,
    batcher: &mut Batcher,
) -> Result<()> {
    let follow_subdirs = iterator_flags & fl::SUBDIRECTORIES != 0;
    let root = Path::new(directory);

    let walker = if follow_subdirs {
        WalkDir::new(root)
    } else {
        WalkDir::new(root).max_depth(1)
    };

    // A directory that the filters reject is also pruned from descent.
    let walker = walker.into_iter().filter_entry(move |entry| {
        if entry.depth() == 0 || file_filters == ff::NO_FILTER {
            return true;
        }
        match resolved_metadata(entry) {
            Ok(meta) if meta.is_dir() => passes_filters(entry, &meta, file_filters),
            _ => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if entry.depth() == 0 {
            continue;
        }

        let meta = match resolved_metadata(&entry) {
            Ok(m) => m,
            Err(_) => continue,
        };

        if file_filters != ff::NO_FILTER && !passes_filters(&entry, &meta, file_filters) {
            continue;
        }

        if !name_filters.is_empty() && !matches_any_name(&entry, name_filters) {
            continue;
        }

        let payload = serde_cbor::to_vec(&Reply::FindData {
            id,
            path: entry.path().to_string_lossy().into_owned(),
            size: meta.len() as i64,
            mode: file_mode(&meta),
            is_dir: meta.is_dir(),
            mod_time: mod_time_nanos(&meta),
        })?;
        batcher.push(payload);
    }

    batcher.push(serde_cbor::to_vec(&Reply::FindEnd { id })?);
    Ok(())
}

/// A symlink whose target resolves is reported and filtered using the
/// target's metadata rather than the link's own `lstat` data.
fn resolved_metadata(entry: &DirEntry) -> std::io::Result<std::fs::Metadata> {
    if entry.path_is_symlink() {
        if let Ok(meta) = std::fs::metadata(entry.path()) {
            return Ok(meta);
        }
    }
    entry.metadata().map_err(|e| {
        e.into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })
}

fn passes_filters(entry: &DirEntry, meta: &std::fs::Metadata, filters: i64) -> bool {
    let is_device = is_device_file(meta);
    if filters & ff::DRIVES == 0 && is_device {
        return false;
    }
    if filters & ff::DIRS == 0 && meta.is_dir() {
        return false;
    }
    if filters & ff::FILES == 0 && !meta.is_dir() {
        return false;
    }
    if filters & ff::NO_SYMLINKS != 0 && entry.path_is_symlink() {
        return false;
    }
    let path = entry.path();
    if filters & ff::READABLE != 0 && !platform::is_readable(path) {
        return false;
    }
    if filters & ff::WRITABLE != 0 && !platform::is_writable(path) {
        return false;
    }
    if filters & ff::EXECUTABLE != 0 && !platform::is_executable(path) {
        return false;
    }
    true
}

#[cfg(unix)]
fn is_device_file(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    let ft = meta.file_type();
    ft.is_block_device() || ft.is_char_device()
}

#[cfg(windows)]
fn is_device_file(_meta: &std::fs::Metadata) -> bool {
    false
}

fn matches_any_name(entry: &DirEntry, filters: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    filters.iter().any(|pattern| {
        globset::Glob::new(pattern)
            .map(|g| g.compile_matcher().is_match(name.as_ref()))
            .unwrap_or(false)
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
    use crate::writer::ReplySink;

    fn drain_finddata_paths(batcher_sink: tokio::io::DuplexStream) -> tokio::task::JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut reader = batcher_sink;
            let mut bytes = Vec::new();
            let _ = reader.read_to_end(&mut bytes).await;

            let marker = agent_protocol::magic_marker();
            let mut paths = Vec::new();
            let mut rest = bytes.as_slice();
            while let Some(pos) = rest.windows(marker.len()).position(|w| w == marker) {
                rest = &rest[pos + marker.len()..];
                let len = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
                let payload = &rest[4..4 + len];
                if let Ok(Reply::FindData { path, .. }) = serde_cbor::from_slice(payload) {
                    paths.push(path);
                }
                rest = &rest[4 + len..];
            }
            paths
        })
    }

    #[tokio::test]
    async fn single_level_walk_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"x").unwrap();

        let (client, server) = tokio::io::duplex(64 * 1024);
        let sink = ReplySink::spawn(client);
        let drain = drain_finddata_paths(server);
        {
            let mut batcher = Batcher::new(&sink);
            find(1, dir.path().to_str().unwrap(), &[], ff::NO_FILTER, fl::NONE, &mut batcher).unwrap();
        }
        sink.close();

        let paths = drain.await.unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("a.txt"));
    }

    #[tokio::test]
    async fn recursive_walk_finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"x").unwrap();

        let (client, server) = tokio::io::duplex(64 * 1024);
        let sink = ReplySink::spawn(client);
        let drain = drain_finddata_paths(server);
        {
            let mut batcher = Batcher::new(&sink);
            find(
                1,
                dir.path().to_str().unwrap(),
                &[],
                ff::NO_FILTER,
                fl::SUBDIRECTORIES,
                &mut batcher,
            )
            .unwrap();
        }
        sink.close();

        let paths = drain.await.unwrap();
        assert!(paths.iter().any(|p| p.ends_with("b.txt")));
    }

    #[test]
    fn name_filter_matches_glob() {
        let dir = tempfile::tempdir().unwrap();
        let entry = walkdir::WalkDir::new(dir.path())
            .into_iter()
            .next()
            .unwrap()
            .unwrap();
        assert!(matches_any_name(&entry, &["*".to_string()]));
    }
}
