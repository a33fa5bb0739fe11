//! Multiplexed RESP3 connection core for Redis-compatible servers
//!
//! `redis-mux` keeps one long-lived, full-duplex connection over which any
//! number of tasks submit commands concurrently. Requests are pipelined:
//! the writer batches queued payloads into single socket writes, the reader
//! decodes RESP3 replies incrementally and routes each one back to its
//! submitter, and server pushes (pub/sub traffic) are demultiplexed onto a
//! separate channel. Periodic pings with an idle monitor keep the link
//! healthy, and reconnection is transparent when enabled.
//!
//! # Quick Start
//!
//! ```no_run
//! use redis_mux::{Connection, ConnectionConfig, NodeCollector, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::default()
//!         .with_host("127.0.0.1")
//!         .with_port("6379");
//!     let conn = Connection::new(config);
//!
//!     let mut req = Request::new();
//!     req.push_with("SET", ("greeting", "hello"));
//!     req.push_with("GET", "greeting");
//!
//!     let mut resp = NodeCollector::new();
//!     conn.run_exec(&req, &mut resp).await?;
//!     for node in resp.roots() {
//!         println!("{}: {}", node.data_type, node.data_as_str());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For long-lived use, spawn [`Connection::run`] on its own task and call
//! [`Connection::exec`] from anywhere; subscribers additionally loop on
//! [`Connection::receive_push`].

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod connection;
pub mod core;
pub mod protocol;
pub mod transport;

pub use crate::adapter::{Adapter, IgnoreAdapter, NodeCollector, PUSH_INDEX};
pub use crate::connection::{Connection, Event, Operation};
pub use crate::core::{
    config::ConnectionConfig,
    error::{RedisError, RedisResult},
};
pub use crate::protocol::{Node, Request, RequestConfig, Resp3Parser, Resp3Type, ToBulkArgs};
pub use crate::transport::{Connector, TcpConnector, Transport};
