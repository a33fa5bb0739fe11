//! RESP3 wire protocol
//!
//! The decoding side lives in [`parser`] and emits [`Node`]s, one per RESP3
//! element; the encoding side is the [`Request`] builder. Both sides are
//! binary safe and make no UTF-8 assumptions about payloads.

pub mod parser;
pub mod request;
pub mod resp3;

pub use parser::Resp3Parser;
pub use request::{Request, RequestConfig, ToBulkArgs};
pub use resp3::{Node, Resp3Type};
