//! Transport abstraction
//!
//! The connection core is agnostic to the byte stream it runs over: anything
//! that can be read from and written to concurrently works, which is how
//! tests drive the pipeline over in-memory duplex pipes. [`TcpConnector`]
//! is the production implementation.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::core::error::{RedisError, RedisResult};

/// A full-duplex byte stream the connection can run over
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

/// Factory for the two network steps of a run: name resolution and the
/// connect itself
///
/// The run supervisor owns the timeouts around both calls and emits the
/// corresponding lifecycle events between them.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The stream type produced by [`connect`](Connector::connect)
    type Stream: Transport;

    /// Resolve the configured host and port into socket addresses
    async fn resolve(&self, host: &str, port: &str) -> RedisResult<Vec<SocketAddr>>;

    /// Open a stream to one of the resolved addresses
    async fn connect(&self, addrs: &[SocketAddr]) -> RedisResult<Self::Stream>;
}

/// TCP connector backed by the system resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn resolve(&self, host: &str, port: &str) -> RedisResult<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(format!("{host}:{port}"))
            .await?
            .collect();
        if addrs.is_empty() {
            return Err(RedisError::Io(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "name resolved to no addresses",
            )));
        }
        debug!(count = addrs.len(), "resolved {host}:{port}");
        Ok(addrs)
    }

    async fn connect(&self, addrs: &[SocketAddr]) -> RedisResult<TcpStream> {
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => {
                    debug!(%addr, %err, "connect attempt failed");
                    last_error = Some(err);
                }
            }
        }
        Err(match last_error {
            Some(err) => RedisError::Io(err),
            None => RedisError::Io(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no addresses to connect to",
            )),
        })
    }
}
