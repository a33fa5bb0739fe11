//! Shared test harness: an in-memory connector handing out scripted duplex
//! streams, and a small server that answers the commands the tests use.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use redis_mux::{ConnectionConfig, Connector, Node, RedisError, RedisResult, Resp3Parser};

/// Connector that hands out pre-arranged duplex streams, one per connect
pub struct ScriptedConnector {
    streams: Mutex<VecDeque<DuplexStream>>,
}

impl ScriptedConnector {
    pub fn new(streams: Vec<DuplexStream>) -> Self {
        Self {
            streams: Mutex::new(streams.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    async fn resolve(&self, _host: &str, _port: &str) -> RedisResult<Vec<SocketAddr>> {
        Ok(vec!["127.0.0.1:6379".parse().unwrap()])
    }

    async fn connect(&self, _addrs: &[SocketAddr]) -> RedisResult<DuplexStream> {
        self.streams.lock().unwrap().pop_front().ok_or_else(|| {
            RedisError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no scripted stream left",
            ))
        })
    }
}

/// Configuration with health checks far enough away to not interfere
pub fn quiet_config() -> ConnectionConfig {
    ConnectionConfig::default().with_ping_interval(Duration::from_secs(60))
}

/// Behavior knobs for the scripted server
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOptions {
    /// Sleep before each response, making completion order observable
    pub response_delay: Option<Duration>,
    /// Keep reading but stop answering after the subscribe confirmation
    pub mute_after_subscribe: bool,
    /// Answer every PING twice, desynchronizing the reply stream
    pub double_pong: bool,
}

pub fn spawn_server(stream: DuplexStream, options: ServerOptions) -> JoinHandle<()> {
    tokio::spawn(serve(stream, options))
}

/// Minimal Redis stand-in: parses inbound command frames with the crate's
/// own parser and answers them in arrival order. `BLPOP` blocks the reply
/// stream the way a blocking list read does on a real server; `QUIT` is
/// confirmed and then the connection is closed.
pub async fn serve(stream: DuplexStream, options: ServerOptions) {
    let (mut rd, mut wr) = tokio::io::split(stream);
    let mut parser = Resp3Parser::new();
    let mut buf: Vec<u8> = Vec::new();
    let mut pos = 0usize;
    let mut frame: Vec<Node> = Vec::new();
    let mut muted = false;

    loop {
        loop {
            match parser.parse(&buf, &mut pos) {
                Ok(Some(node)) => {
                    frame.push(node);
                    if parser.at_tree_boundary() {
                        let request = std::mem::take(&mut frame);
                        if let Some(delay) = options.response_delay {
                            tokio::time::sleep(delay).await;
                        }
                        if respond(&mut wr, &request, &mut muted, options).await {
                            return;
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => return,
            }
        }
        buf.drain(..pos);
        pos = 0;

        let mut chunk = [0u8; 4096];
        match rd.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => buf.extend_from_slice(&chunk[..read]),
        }
    }
}

/// Answer one command frame; returns true when the connection should close
async fn respond<W: AsyncWrite + Unpin>(
    wr: &mut W,
    request: &[Node],
    muted: &mut bool,
    options: ServerOptions,
) -> bool {
    let command = request
        .get(1)
        .map(|node| node.data_as_str().to_ascii_uppercase())
        .unwrap_or_default();
    if *muted {
        return false;
    }

    let reply: Vec<u8> = match command.as_str() {
        "HELLO" => b"%1\r\n$6\r\nserver\r\n$5\r\nredis\r\n".to_vec(),
        "PING" => match request.get(2) {
            Some(arg) => {
                let mut out = Vec::new();
                out.extend_from_slice(format!("${}\r\n", arg.data.len()).as_bytes());
                out.extend_from_slice(&arg.data);
                out.extend_from_slice(b"\r\n");
                out
            }
            None if options.double_pong => b"+PONG\r\n+PONG\r\n".to_vec(),
            None => b"+PONG\r\n".to_vec(),
        },
        "SUBSCRIBE" => {
            let channel = request.get(2).map(|node| node.data.to_vec()).unwrap_or_default();
            let mut out = Vec::new();
            out.extend_from_slice(b">3\r\n$9\r\nsubscribe\r\n");
            out.extend_from_slice(format!("${}\r\n", channel.len()).as_bytes());
            out.extend_from_slice(&channel);
            out.extend_from_slice(b"\r\n:1\r\n");
            if options.mute_after_subscribe {
                *muted = true;
            }
            out
        }
        "BLPOP" => {
            // A blocking read holds back every later reply on this
            // connection.
            *muted = true;
            return false;
        }
        "QUIT" => b"+OK\r\n".to_vec(),
        _ => b"+OK\r\n".to_vec(),
    };

    if wr.write_all(&reply).await.is_err() {
        return true;
    }
    let _ = wr.flush().await;
    command == "QUIT"
}

pub fn duplex_pair() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(1 << 16)
}
