//! Error types for the connection core

use std::io;
use thiserror::Error;

/// Result type used throughout the crate
pub type RedisResult<T> = Result<T, RedisError>;

/// Errors produced by the connection, the parser and the adapters
#[derive(Error, Debug)]
pub enum RedisError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Name resolution did not finish within `resolve_timeout`
    #[error("resolve timed out")]
    ResolveTimeout,

    /// The connect attempt did not finish within `connect_timeout`
    #[error("connect timed out")]
    ConnectTimeout,

    /// No data was received for longer than twice the ping interval
    #[error("connection idle for too long")]
    IdleTimeout,

    /// The request required an open connection but there was none
    #[error("not connected")]
    NotConnected,

    /// The operation was cancelled before it could complete
    #[error("operation canceled")]
    OperationCanceled,

    /// A payload did not have the shape its RESP3 type promises
    #[error("invalid response type")]
    InvalidResponseType,

    /// A length or numeric payload failed to parse
    #[error("expected a number")]
    NotANumber,

    /// A line or blob was not terminated by CRLF
    #[error("expected CRLF")]
    ExpectedCrlf,

    /// The byte does not introduce any RESP3 type
    #[error("invalid RESP3 lead byte: {0:#04x}")]
    InvalidLeadByte(u8),

    /// The stream ended in the middle of a message
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// The request expects more responses than the adapter supports
    #[error("request and adapter have incompatible sizes")]
    IncompatibleSize,

    /// A non-push response arrived with no request waiting for it.
    /// The reply stream is out of sync and the run is aborted.
    #[error("response with no owning request")]
    UnsolicitedResponse,
}
