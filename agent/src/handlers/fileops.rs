//! The small path-in-path-out handlers: copy, rename, permissions,
//! remove/removeall, ensure-existing, mkdir, tempfile, readlink, fileid,
//! freespace. Each is a thin wrapper over a single `std::fs` call.

use {
    crate::{error::Result, platform},
    agent_protocol::Reply,
    std::path::{Path, PathBuf},
};

pub fn copy_file(id: i64, source: &str, target: &str) -> Result<Reply> {
    std::fs::copy(source, target)?;
    Ok(Reply::CopyFileResult { id })
}

pub fn rename_file(id: i64, source: &str, target: &str) -> Result<Reply> {
    std::fs::rename(source, target)?;
    Ok(Reply::RenameFileResult { id })
}

pub fn set_permissions(id: i64, path: &str, mode: u32) -> Result<Reply> {
    set_permissions_platform(path, mode)?;
    Ok(Reply::SetPermissionsResult { id })
}

#[cfg(unix)]
fn set_permissions_platform(path: &str, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(windows)]
fn set_permissions_platform(path: &str, mode: u32) -> std::io::Result<()> {
    // Windows has no POSIX mode bits; only the read-only bit is settable.
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(path, perms)
}

pub fn remove(id: i64, path: &str) -> Result<Reply> {
    std::fs::remove_file(path)?;
    Ok(Reply::RemoveResult { id })
}

pub fn remove_all(id: i64, path: &str) -> Result<Reply> {
    std::fs::remove_dir_all(path)?;
    Ok(Reply::RemoveAllResult { id })
}

pub fn ensure_existing_file(id: i64, path: &str) -> Result<Reply> {
    if std::fs::metadata(path).is_err() {
        std::fs::File::create(path)?;
    }
    Ok(Reply::EnsureExistingFileResult { id })
}

pub fn create_dir(id: i64, path: &str) -> Result<Reply> {
    std::fs::create_dir_all(path)?;
    Ok(Reply::CreateDirResult { id })
}

/// If `path` doesn't exist, its directory and basename become the
/// temp-file's directory and name prefix; otherwise `path` itself is
/// treated as the target directory.
pub fn create_temp_file(id: i64, path: &str) -> Result<Reply> {
    let (dir, prefix) = if std::fs::metadata(path).is_err() {
        let p = Path::new(path);
        (
            p.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    } else {
        (PathBuf::from(path), String::new())
    };

    let named = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(&dir)?;
    let (_, created_path) = named.keep().map_err(|e| e.error)?;

    Ok(Reply::CreateTempFileResult {
        id,
        path: created_path.to_string_lossy().into_owned(),
    })
}

pub fn read_link(id: i64, path: &str) -> Result<Reply> {
    let target = std::fs::read_link(path)?;
    Ok(Reply::ReadLinkResult {
        id,
        target: target.to_string_lossy().into_owned(),
    })
}

pub fn file_id(id: i64, path: &str) -> Result<Reply> {
    Ok(Reply::FileIdResult {
        id,
        file_id: platform::file_id(Path::new(path)),
    })
}

pub fn free_space(id: i64, path: &str) -> Result<Reply> {
    let free = platform::free_space(Path::new(path))?;
    Ok(Reply::FreeSpaceResult { id, free_space: free })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_then_remove_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, b"payload").unwrap();

        copy_file(1, src.to_str().unwrap(), dst.to_str().unwrap()).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"payload");

        remove(2, dst.to_str().unwrap()).unwrap();
        assert!(!dst.exists());
    }

    #[test]
    fn ensure_existing_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");

        ensure_existing_file(1, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
        // Second call must not error or truncate.
        std::fs::write(&path, b"keep me").unwrap();
        ensure_existing_file(2, path.to_str().unwrap()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn create_temp_file_uses_basename_as_template_when_path_absent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wanted-name");

        let reply = create_temp_file(1, target.to_str().unwrap()).unwrap();
        match reply {
            Reply::CreateTempFileResult { path, .. } => {
                assert!(Path::new(&path).exists());
                assert!(Path::new(&path).parent() == Some(dir.path()));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn read_link_reports_target() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("target");
            let link = dir.path().join("link");
            std::fs::write(&target, b"x").unwrap();
            std::os::unix::fs::symlink(&target, &link).unwrap();

            let reply = read_link(1, link.to_str().unwrap()).unwrap();
            match reply {
                Reply::ReadLinkResult { target: t, .. } => assert_eq!(Path::new(&t), target),
                other => panic!("unexpected reply: {other:?}"),
            }
        }
    }
}
