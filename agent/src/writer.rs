//! The single-writer output channel and its per-handler batcher.
//!
//! Every handler task holds a cheap [`ReplySink`] clone; none of them touch
//! stderr directly. Frames funnel through one `mpsc` channel into a single
//! task that owns the actual stream, a "one writer, many producers" shape
//! that keeps every handler from needing a lock around the output stream.

use {
    agent_protocol::{codec, Reply},
    tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        sync::mpsc,
    },
};

/// The empty payload is the sentinel that tells the writer task to stop.
type RawPayload = Vec<u8>;

#[derive(Clone)]
pub struct ReplySink {
    tx: mpsc::UnboundedSender<RawPayload>,
}

impl ReplySink {
    /// Spawns the single task that frames every payload (marker + u32-BE
    /// length + body) and writes it to `out`.
    pub fn spawn<W>(mut out: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<RawPayload>();
        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                if payload.is_empty() {
                    break;
                }
                let frame = codec::encode_frame(&payload);
                if out.write_all(&frame).await.is_err() {
                    break;
                }
                let _ = out.flush().await;
            }
        });
        Self { tx }
    }

    /// Spawns a writer task that decodes each payload back into a [`Reply`]
    /// and prints it as one JSON line to stderr, for `--test` mode where
    /// replies are inspected by a human rather than parsed by a controller.
    pub fn spawn_pretty() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<RawPayload>();
        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                if payload.is_empty() {
                    break;
                }
                match serde_cbor::from_slice::<Reply>(&payload) {
                    Ok(reply) => match serde_json::to_string(&reply) {
                        Ok(line) => eprintln!("{line}"),
                        Err(err) => eprintln!("<unprintable reply: {err}>"),
                    },
                    Err(err) => eprintln!("<undecodable reply: {err}>"),
                }
            }
        });
        Self { tx }
    }

    /// Enqueues an already-serialized CBOR reply payload.
    pub fn send_encoded(&self, payload: Vec<u8>) {
        let _ = self.tx.send(payload);
    }

    /// Enqueues a reply, serializing it to CBOR first.
    pub fn send(&self, reply: &Reply) {
        match serde_cbor::to_vec(reply) {
            Ok(payload) => self.send_encoded(payload),
            Err(err) => tracing::error!(%err, "failed to encode reply"),
        }
    }

    /// Signals the writer task to stop after draining what's queued.
    pub fn close(&self) {
        let _ = self.tx.send(Vec::new());
    }
}

/// Accumulates a handler's frames and flushes them to the sink once the
/// buffered size passes 1024 bytes. Frames are forwarded individually and
/// never merged into one.
pub struct Batcher<'a> {
    sink: &'a ReplySink,
    pending: Vec<Vec<u8>>,
    byte_size: usize,
}

impl<'a> Batcher<'a> {
    pub fn new(sink: &'a ReplySink) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            byte_size: 0,
        }
    }

    pub fn push(&mut self, payload: Vec<u8>) {
        self.byte_size += payload.len();
        self.pending.push(payload);
        if self.byte_size > 1024 {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        for payload in self.pending.drain(..) {
            self.sink.send_encoded(payload);
        }
        self.byte_size = 0;
    }
}

impl Drop for Batcher<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
