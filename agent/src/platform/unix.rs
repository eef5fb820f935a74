use std::{
    ffi::CString,
    io,
    os::unix::ffi::OsStrExt,
    path::Path,
};

fn path_cstring(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

fn access(path: &Path, mode: libc::c_int) -> bool {
    match path_cstring(path) {
        Ok(c) => unsafe { libc::access(c.as_ptr(), mode) == 0 },
        Err(_) => false,
    }
}

pub fn is_readable(path: &Path) -> bool {
    access(path, libc::R_OK)
}

pub fn is_writable(path: &Path) -> bool {
    access(path, libc::W_OK)
}

pub fn is_executable(path: &Path) -> bool {
    access(path, libc::X_OK)
}

fn stat(path: &Path) -> io::Result<libc::stat> {
    let c = path_cstring(path)?;
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::stat(c.as_ptr(), &mut st) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(st)
}

pub fn num_hard_links(path: &Path) -> u64 {
    stat(path).map(|st| st.st_nlink as u64).unwrap_or(0)
}

/// `"{device:x}:{inode:x}"`, unpadded hex.
pub fn file_id(path: &Path) -> String {
    match stat(path) {
        Ok(st) => format!("{:x}:{:x}", st.st_dev, st.st_ino),
        Err(_) => String::new(),
    }
}

pub fn free_space(path: &Path) -> io::Result<u64> {
    let c = path_cstring(path)?;
    let mut buf: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c.as_ptr(), &mut buf) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(buf.f_bavail as u64 * buf.f_bsize as u64)
}

/// Sends `SIGTERM` (terminate), `SIGINT` (interrupt), or an unconditional
/// `SIGKILL` (kill) to `pid`.
pub fn send_signal(pid: i64, kind: agent_protocol::SignalKind) -> io::Result<()> {
    use agent_protocol::SignalKind::*;
    let sig = match kind {
        Terminate => libc::SIGTERM,
        Interrupt => libc::SIGINT,
        Kill => libc::SIGKILL,
    };
    let rc = unsafe { libc::kill(pid as libc::pid_t, sig) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_matches_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        assert!(is_readable(&path));
        assert!(is_writable(&path));
    }

    #[test]
    fn hard_link_count_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(num_hard_links(&path), 1);
    }

    #[test]
    fn file_id_is_stable_and_colon_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        let id1 = file_id(&path);
        let id2 = file_id(&path);
        assert_eq!(id1, id2);
        assert_eq!(id1.matches(':').count(), 1);
    }
}
