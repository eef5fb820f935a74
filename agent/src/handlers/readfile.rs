//! `readfile`: streams `readfiledata` chunks of at most 4096 bytes
//! followed by a terminal `readfiledone`. Each chunk carries exactly the
//! bytes actually read, never the full (possibly oversized) read buffer.

use {
    crate::{error::Result, writer::Batcher},
    agent_protocol::Reply,
    std::io::{Read, Seek, SeekFrom},
};

const CHUNK: usize = 4096;

pub fn read_file(
    id: i64,
    path: &str,
    offset: i64,
    limit: i64,
    batcher: &mut Batcher,
) -> Result<()> {
    let mut file = std::fs::File::open(path)?;
    let size = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(offset as u64))?;

    let mut remaining = if limit == -1 {
        size as i64 - offset
    } else {
        limit
    };

    let mut buf = vec![0u8; CHUNK];
    while remaining > 0 {
        let to_read = std::cmp::min(remaining as usize, CHUNK);
        let n = file.read(&mut buf[..to_read])?;
        if n == 0 {
            break;
        }
        let payload = serde_cbor::to_vec(&Reply::ReadFileData {
            id,
            contents: buf[..n].to_vec(),
        })?;
        batcher.push(payload);
        remaining -= n as i64;
    }

    batcher.push(serde_cbor::to_vec(&Reply::ReadFileDone { id })?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ReplySink;
    use tokio::io::AsyncReadExt;

    async fn collect_replies(sink_side: tokio::io::DuplexStream) -> Vec<Reply> {
        let mut reader = sink_side;
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes).await;

        let marker = agent_protocol::magic_marker();
        let mut replies = Vec::new();
        let mut rest = bytes.as_slice();
        while let Some(pos) = find_subslice(rest, marker) {
            rest = &rest[pos + marker.len()..];
            let len = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
            let payload = &rest[4..4 + len];
            replies.push(serde_cbor::from_slice(payload).unwrap());
            rest = &rest[4 + len..];
        }
        replies
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[tokio::test]
    async fn reads_entire_short_file_in_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello world").unwrap();

        let (client, server) = tokio::io::duplex(64 * 1024);
        let sink = ReplySink::spawn(client);
        {
            let mut batcher = Batcher::new(&sink);
            read_file(1, path.to_str().unwrap(), 0, -1, &mut batcher).unwrap();
        }
        sink.close();

        let replies = collect_replies(server).await;
        assert!(matches!(
            replies.as_slice(),
            [Reply::ReadFileData { contents, .. }, Reply::ReadFileDone { .. }]
                if contents == b"hello world"
        ));
    }

    #[tokio::test]
    async fn respects_offset_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"0123456789").unwrap();

        let (client, server) = tokio::io::duplex(64 * 1024);
        let sink = ReplySink::spawn(client);
        {
            let mut batcher = Batcher::new(&sink);
            read_file(1, path.to_str().unwrap(), 2, 3, &mut batcher).unwrap();
        }
        sink.close();

        let replies = collect_replies(server).await;
        assert!(matches!(
            replies.as_slice(),
            [Reply::ReadFileData { contents, .. }, Reply::ReadFileDone { .. }]
                if contents == b"234"
        ));
    }
}
