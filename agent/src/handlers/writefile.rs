use {crate::error::Result, agent_protocol::Reply};

/// Truncate-and-create-0644 semantics, matching `std::fs::write`.
pub fn write_file(id: i64, path: &str, contents: &[u8]) -> Result<Reply> {
    std::fs::write(path, contents)?;
    Ok(Reply::WriteFileResult {
        id,
        written_bytes: contents.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_truncates_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"old and longer").unwrap();

        let reply = write_file(1, path.to_str().unwrap(), b"new").unwrap();
        match reply {
            Reply::WriteFileResult { written_bytes, .. } => assert_eq!(written_bytes, 3),
            other => panic!("unexpected reply: {other:?}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
