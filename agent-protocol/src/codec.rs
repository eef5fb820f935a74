//! Binary framing. Inbound requests are a sequence of back-to-back,
//! self-delimited CBOR objects read from stdin; outbound replies are framed
//! as `MAGIC || u32-be length || CBOR payload` and written to the agent's
//! secondary output stream.

use {
    crate::{error::DecodeError, request::Request},
    byteorder::{BigEndian, WriteBytesExt},
    bytes::BytesMut,
    once_cell::sync::OnceCell,
    std::io,
};

/// Build-time default; overridable at process start via the
/// `AGENT_MAGIC_MARKER` environment variable.
pub const DEFAULT_MAGIC: &[u8] = b"-magic-packet-marker-";

static MAGIC: OnceCell<Vec<u8>> = OnceCell::new();

/// Reads and caches the magic marker for this process. Must agree on every
/// call site — call once at bootstrap before any frame is written.
pub fn magic_marker() -> &'static [u8] {
    MAGIC
        .get_or_init(|| match std::env::var("AGENT_MAGIC_MARKER") {
            Ok(v) if !v.is_empty() => v.into_bytes(),
            _ => DEFAULT_MAGIC.to_vec(),
        })
        .as_slice()
}

/// Encodes one reply payload as a complete frame: marker, big-endian u32
/// length, payload. The payload itself is produced by the caller (usually
/// `serde_cbor::to_vec`).
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(magic_marker().len() + 4 + payload.len());
    out.extend_from_slice(magic_marker());
    out.write_u32::<BigEndian>(payload.len() as u32)
        .expect("writing to a Vec<u8> cannot fail");
    out.extend_from_slice(payload);
    out
}

/// Incrementally decodes a stream of concatenated CBOR `Request` objects
/// out of a growing buffer. The buffer is fed externally (by an async
/// reader loop) so this type has no I/O dependency of its own and is easy
/// to unit test without a pipe.
#[derive(Default)]
pub struct RequestDecoder {
    buf: BytesMut,
}

/// Outcome of one decode attempt against the buffer's current contents.
pub enum DecodeOutcome {
    /// A full request was decoded and removed from the buffer.
    Request(Request),
    /// The buffer holds malformed bytes that could not form a request, and
    /// none of the remaining bytes are parsable — the decoder clears the
    /// buffer on a hard decode failure instead of attempting a byte-level
    /// resync, since CBOR does not provide a safe resync point (see
    /// DESIGN.md).
    Error(DecodeError),
    /// Not enough bytes are buffered yet to know; caller should read more
    /// from the underlying stream and call `feed` again.
    NeedMoreData,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly-read bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Attempts to decode the next request from the buffered bytes.
    pub fn poll_decode(&mut self) -> DecodeOutcome {
        if self.buf.is_empty() {
            return DecodeOutcome::NeedMoreData;
        }

        let mut de = serde_cbor::Deserializer::from_slice(&self.buf);
        match Request::deserialize(&mut de) {
            Ok(req) => {
                let consumed = de.byte_offset();
                let _ = self.buf.split_to(consumed);
                DecodeOutcome::Request(req)
            }
            Err(e) => match e.classify() {
                serde_cbor::error::Category::Eof => DecodeOutcome::NeedMoreData,
                _ => {
                    self.buf.clear();
                    DecodeOutcome::Error(DecodeError::Cbor(e))
                }
            },
        }
    }

    /// `true` once no more bytes are buffered and the caller has seen EOF
    /// from the underlying stream — the request channel can be closed.
    pub fn is_drained(&self) -> bool {
        self.buf.is_empty()
    }
}

use serde::Deserialize as _;

/// Drives a [`RequestDecoder`] against an `AsyncRead`, yielding one
/// `Result<Request, DecodeError>` per call until the stream ends cleanly
/// (returns `Ok(None)`).
pub async fn read_next_request<R>(
    reader: &mut R,
    decoder: &mut RequestDecoder,
) -> io::Result<Option<Result<Request, DecodeError>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    loop {
        match decoder.poll_decode() {
            DecodeOutcome::Request(req) => return Ok(Some(Ok(req))),
            DecodeOutcome::Error(e) => return Ok(Some(Err(e))),
            DecodeOutcome::NeedMoreData => {
                let mut chunk = [0u8; 8192];
                let n = reader.read(&mut chunk).await?;
                if n == 0 {
                    return if decoder.is_drained() {
                        Ok(None)
                    } else {
                        Ok(Some(Err(DecodeError::Eof)))
                    };
                }
                decoder.feed(&chunk[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{IsCheck, Request};

    #[test]
    fn decodes_back_to_back_requests() {
        let a = Request::Stat {
            id: 1,
            path: "/tmp".into(),
        };
        let b = Request::Is {
            id: 2,
            path: "/tmp".into(),
            check: IsCheck::Exists,
        };
        let mut bytes = serde_cbor::to_vec(&a).unwrap();
        bytes.extend(serde_cbor::to_vec(&b).unwrap());

        let mut dec = RequestDecoder::new();
        dec.feed(&bytes);

        match dec.poll_decode() {
            DecodeOutcome::Request(Request::Stat { id, .. }) => assert_eq!(id, 1),
            _ => panic!("expected first request"),
        }
        match dec.poll_decode() {
            DecodeOutcome::Request(Request::Is { id, .. }) => assert_eq!(id, 2),
            _ => panic!("expected second request"),
        }
        assert!(matches!(dec.poll_decode(), DecodeOutcome::NeedMoreData));
    }

    #[test]
    fn frame_layout_is_marker_len_payload() {
        let frame = encode_frame(b"hello");
        assert!(frame.starts_with(magic_marker()));
        let len_offset = magic_marker().len();
        let len = u32::from_be_bytes(frame[len_offset..len_offset + 4].try_into().unwrap());
        assert_eq!(len, 5);
        assert_eq!(&frame[len_offset + 4..], b"hello");
    }
}
