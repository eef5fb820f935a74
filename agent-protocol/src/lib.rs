//! Wire types and binary framing shared by the agent binary: tagged-variant
//! `Request`/`Reply` enums carried as CBOR, plus the length-prefixed framing
//! used for outbound replies.

pub mod codec;
pub mod error;
pub mod reply;
pub mod request;

pub use codec::{encode_frame, magic_marker, read_next_request, DecodeOutcome, RequestDecoder, DEFAULT_MAGIC};
pub use error::{error_type_for, DecodeError, ErrorKind};
pub use reply::{ExecChunk, Reply};
pub use request::{find_filters, find_iterator_flags, IsCheck, Request, SignalKind};
