//! NDJSON framing for streamed records.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`encode`] | Records → one `\n`-terminated JSON line per chunk |
//! | [`decode`] | Byte chunks → JSON values / typed records |
//!
//! End of stream is signalled by the transport closing; there is no
//! terminal record.

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_items, typed};
pub use encode::{encode, encode_record};

/// Record delimiter.
pub const DELIMITER: u8 = b'\n';

/// Media type of an encoded stream.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
