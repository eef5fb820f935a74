use {
    crate::{error::Result, platform},
    agent_protocol::{IsCheck, Reply},
    std::path::Path,
};

/// A `stat` failure yields `false` rather than propagating an error;
/// `File` and `Exists` short-circuit ahead of the switch; `ReadableDir`/
/// `WritableDir` fall through to the same access checks `ReadableFile`/
/// `WritableFile` use rather than being re-gated on `IsDir`.
pub fn is(id: i64, path: &str, check: IsCheck) -> Result<Reply> {
    let result = check_path(path, check);
    Ok(Reply::IsResult { id, result })
}

fn check_path(path: &str, check: IsCheck) -> bool {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return false,
    };

    if matches!(check, IsCheck::ReadableDir | IsCheck::WritableDir | IsCheck::Dir) && !meta.is_dir()
    {
        return false;
    }

    match check {
        IsCheck::Symlink => is_symlink(path),
        IsCheck::Exists => true,
        IsCheck::File => !meta.is_dir(),
        IsCheck::ReadableFile | IsCheck::ReadableDir => platform::is_readable(Path::new(path)),
        IsCheck::WritableFile | IsCheck::WritableDir => platform::is_writable(Path::new(path)),
        IsCheck::ExecutableFile => platform::is_executable(Path::new(path)),
        IsCheck::Dir => true,
    }
}

fn is_symlink(path: &str) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_false_for_every_check() {
        assert!(!check_path("/does/not/exist", IsCheck::Exists));
        assert!(!check_path("/does/not/exist", IsCheck::File));
    }

    #[test]
    fn exists_short_circuits_before_dir_check() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(check_path(file.to_str().unwrap(), IsCheck::Exists));
    }

    #[test]
    fn readable_dir_falls_through_to_access_check() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_path(dir.path().to_str().unwrap(), IsCheck::ReadableDir));
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(!check_path(file.to_str().unwrap(), IsCheck::ReadableDir));
    }

    #[test]
    fn file_check_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_path(dir.path().to_str().unwrap(), IsCheck::File));
    }
}
