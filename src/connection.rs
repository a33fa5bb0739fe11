//! The multiplexed connection
//!
//! A [`Connection`] drives a single full-duplex stream shared by any number
//! of concurrent callers. [`exec`](Connection::exec) enqueues a request and
//! waits for its responses; [`run`](Connection::run) owns the socket and
//! runs the writer, the reader, the health-check pings and the idle monitor
//! until the connection fails, optionally reconnecting.
//!
//! Requests are written strictly in queue order and a Redis-compatible
//! server answers non-push commands in that same order, so the reader maps
//! each decoded reply tree to the oldest written request still waiting.
//! Replies whose root is a push frame are routed to the push channel
//! instead, see [`receive_push`](Connection::receive_push).

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::adapter::{Adapter, PUSH_INDEX};
use crate::core::config::ConnectionConfig;
use crate::core::error::{RedisError, RedisResult};
use crate::protocol::parser::Resp3Parser;
use crate::protocol::request::{Request, RequestConfig};
use crate::protocol::resp3::{Node, Resp3Type};
use crate::transport::{Connector, TcpConnector};

/// Lifecycle events reported by [`Connection::receive_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The resolve step succeeded
    Resolve,
    /// The connect step succeeded
    Connect,
    /// The RESP3 handshake succeeded
    Hello,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Connect => "connect",
            Self::Hello => "hello",
        })
    }
}

/// The cancellable operations of a [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Cancel pending [`Connection::exec`] calls
    Exec,
    /// Cancel the active [`Connection::run`]
    Run,
    /// Cancel pending [`Connection::receive_event`] calls
    ReceiveEvent,
    /// Cancel pending [`Connection::receive_push`] calls
    ReceivePush,
}

/// A decoded top-level reply: its nodes in pre-order plus its wire size
struct Tree {
    nodes: Vec<Node>,
    bytes: usize,
}

/// Messages from the pipeline to the task awaiting a request
enum RecordSignal {
    /// One command's reply tree
    Response(Tree),
    /// All expected replies have been delivered
    Done,
    /// The request was cancelled
    Canceled,
}

/// A request queued in the pipeline
struct QueueEntry {
    payload: Bytes,
    size: u32,
    remaining: u32,
    written: bool,
    config: RequestConfig,
    tx: mpsc::UnboundedSender<RecordSignal>,
}

/// Queue and counters, mutated only under the connection-local lock and
/// never across a suspension point
struct PipelineState {
    queue: VecDeque<QueueEntry>,
    /// Commands written to the socket whose replies are still outstanding
    cmds: u32,
    /// Whether a socket is currently open
    open: bool,
    run_active: bool,
    run_canceled: bool,
    /// Wakes the active run when `cancel(Run)` is called; replaced per run
    stop: Arc<Notify>,
}

/// Which step of the run failed, deciding whether a reconnect is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Resolving,
    Connecting,
    Greeting,
    Running,
}

/// A multiplexed connection to a Redis-compatible server
///
/// All operations take `&self` and can be called concurrently; the pipeline
/// keeps an internal queue so callers never need to synchronize. One task
/// drives [`run`](Connection::run) while any number of others submit
/// requests with [`exec`](Connection::exec).
pub struct Connection<C: Connector = TcpConnector> {
    connector: C,
    cfg: ConnectionConfig,
    state: Mutex<PipelineState>,
    writer_wake: Notify,
    last_data: Mutex<Instant>,
    push_tx: mpsc::Sender<Tree>,
    push_rx: tokio::sync::Mutex<mpsc::Receiver<Tree>>,
    push_cancel: Notify,
    push_waiters: AtomicU32,
    event_tx: mpsc::Sender<Event>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<Event>>,
    event_cancel: Notify,
    event_waiters: AtomicU32,
}

impl Connection<TcpConnector> {
    /// Create a TCP connection with the given configuration
    ///
    /// Nothing touches the network until [`run`](Connection::run) is called.
    #[must_use]
    pub fn new(cfg: ConnectionConfig) -> Self {
        Self::with_connector(cfg, TcpConnector)
    }
}

impl<C: Connector> Connection<C> {
    /// Create a connection over a custom [`Connector`]
    #[must_use]
    pub fn with_connector(cfg: ConnectionConfig, connector: C) -> Self {
        // Capacity one: the reader parks on the channel when pushes are not
        // being consumed, which the idle monitor eventually notices.
        let (push_tx, push_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::channel(1);
        Self {
            connector,
            cfg,
            state: Mutex::new(PipelineState {
                queue: VecDeque::new(),
                cmds: 0,
                open: false,
                run_active: false,
                run_canceled: false,
                stop: Arc::new(Notify::new()),
            }),
            writer_wake: Notify::new(),
            last_data: Mutex::new(Instant::now()),
            push_tx,
            push_rx: tokio::sync::Mutex::new(push_rx),
            push_cancel: Notify::new(),
            push_waiters: AtomicU32::new(0),
            event_tx,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_cancel: Notify::new(),
            event_waiters: AtomicU32::new(0),
        }
    }

    /// The configuration this connection was created with
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.cfg
    }

    /// Drive the connection lifecycle
    ///
    /// Resolves and connects (each under its configured timeout), performs
    /// the `HELLO 3` handshake, then services the request queue until the
    /// connection fails. With `enable_reconnect` set, failures past the
    /// resolve step restart the cycle after `reconnect_interval` instead of
    /// returning.
    ///
    /// Only one run may be active per connection; a second concurrent call
    /// fails immediately with [`RedisError::OperationCanceled`].
    pub async fn run(&self) -> RedisResult<()> {
        let stop = {
            let mut st = self.state();
            if st.run_active {
                return Err(RedisError::OperationCanceled);
            }
            st.run_active = true;
            st.run_canceled = false;
            st.stop = Arc::new(Notify::new());
            Arc::clone(&st.stop)
        };
        let result = self.run_loop(&stop).await;
        self.state().run_active = false;
        result
    }

    /// Execute a request, waiting for all its responses
    ///
    /// The request is appended to the pipeline queue (or, with
    /// `hello_with_priority`, inserted ahead of everything not yet written)
    /// and its decoded reply trees are fed to `adapter` one command at a
    /// time, in submission order relative to other requests. Returns the
    /// number of response bytes consumed.
    ///
    /// An error returned by the adapter fails only this call; the
    /// connection keeps running.
    pub async fn exec<A: Adapter>(&self, req: &Request, adapter: &mut A) -> RedisResult<usize> {
        if u64::from(req.size()) > adapter.supported_response_size() {
            return Err(RedisError::IncompatibleSize);
        }
        if req.payload().is_empty() {
            return Ok(0);
        }
        let rx = self.enqueue(req.payload_bytes(), req.size(), req.config().clone())?;
        self.await_record(rx, adapter).await
    }

    /// Run the connection only as long as one request needs
    ///
    /// Convenience for one-shot usage: drives [`run`](Connection::run) and
    /// [`exec`](Connection::exec) together, tears the run down once the
    /// request has completed and returns the exec outcome.
    pub async fn run_exec<A: Adapter>(
        &self,
        req: &Request,
        adapter: &mut A,
    ) -> RedisResult<usize> {
        // Settle the paths exec would fail on without suspending up front,
        // so the race below never completes before the run has started.
        if u64::from(req.size()) > adapter.supported_response_size() {
            return Err(RedisError::IncompatibleSize);
        }
        if req.payload().is_empty() {
            return Ok(0);
        }
        if req.config().cancel_if_not_connected && !self.state().open {
            return Err(RedisError::NotConnected);
        }

        let run_fut = self.run();
        let exec_fut = self.exec(req, adapter);
        tokio::pin!(run_fut);
        tokio::pin!(exec_fut);

        let mut exec_result = None;
        loop {
            tokio::select! {
                result = &mut exec_fut, if exec_result.is_none() => {
                    self.cancel(Operation::Run);
                    exec_result = Some(result);
                }
                result = &mut run_fut => {
                    return match exec_result {
                        Some(exec_result) => exec_result,
                        None => Err(result.err().unwrap_or(RedisError::OperationCanceled)),
                    };
                }
            }
        }
    }

    /// Receive a single server push
    ///
    /// The push tree is fed to `adapter` under [`PUSH_INDEX`]. Users
    /// expecting pushes must keep a receive pending: the push channel holds
    /// one tree, and once it is full the reader stops consuming the socket
    /// until someone receives, which eventually trips the idle timeout.
    pub async fn receive_push<A: Adapter>(&self, adapter: &mut A) -> RedisResult<usize> {
        let mut rx = self.push_rx.lock().await;
        self.push_waiters.fetch_add(1, Ordering::SeqCst);
        let result = tokio::select! {
            tree = rx.recv() => match tree {
                Some(tree) => {
                    let mut delivered = Ok(tree.bytes);
                    for node in &tree.nodes {
                        if let Err(err) = adapter.on_node(PUSH_INDEX, node) {
                            delivered = Err(err);
                            break;
                        }
                    }
                    delivered
                }
                None => Err(RedisError::OperationCanceled),
            },
            _ = self.push_cancel.notified() => Err(RedisError::OperationCanceled),
        };
        self.push_waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Receive the next lifecycle event
    ///
    /// Events are only produced when `enable_events` is set in the
    /// configuration. The event channel holds one event; a non-consuming
    /// caller stalls the run supervisor at the next emission.
    pub async fn receive_event(&self) -> RedisResult<Event> {
        let mut rx = self.event_rx.lock().await;
        self.event_waiters.fetch_add(1, Ordering::SeqCst);
        let result = tokio::select! {
            event = rx.recv() => event.ok_or(RedisError::OperationCanceled),
            _ = self.event_cancel.notified() => Err(RedisError::OperationCanceled),
        };
        self.event_waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Cancel an operation, returning how many pending ones were affected
    ///
    /// - [`Operation::Exec`] purges every queued request, failing each with
    ///   [`RedisError::OperationCanceled`]. Requests already written stay
    ///   unaccounted for, so the run will abort on their replies.
    /// - [`Operation::Run`] closes the active run; its shutdown settles the
    ///   queue according to each request's policy. Idempotent: a second
    ///   call returns 0.
    /// - [`Operation::ReceivePush`] / [`Operation::ReceiveEvent`] fail the
    ///   pending receivers.
    pub fn cancel(&self, op: Operation) -> u32 {
        match op {
            Operation::Exec => {
                let mut st = self.state();
                let purged = st.queue.len() as u32;
                for entry in st.queue.drain(..) {
                    let _ = entry.tx.send(RecordSignal::Canceled);
                }
                st.cmds = 0;
                purged
            }
            Operation::Run => {
                let stop = {
                    let mut st = self.state();
                    if !st.run_active || st.run_canceled {
                        return 0;
                    }
                    st.run_canceled = true;
                    st.open = false;
                    Arc::clone(&st.stop)
                };
                stop.notify_one();
                1
            }
            Operation::ReceivePush => {
                let waiters = self.push_waiters.load(Ordering::SeqCst);
                self.push_cancel.notify_waiters();
                waiters
            }
            Operation::ReceiveEvent => {
                let waiters = self.event_waiters.load(Ordering::SeqCst);
                self.event_cancel.notify_waiters();
                waiters
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record to the queue, waking the writer when it is idle
    fn enqueue(
        &self,
        payload: Bytes,
        size: u32,
        config: RequestConfig,
    ) -> RedisResult<mpsc::UnboundedReceiver<RecordSignal>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut st = self.state();
        if config.cancel_if_not_connected && !st.open {
            return Err(RedisError::NotConnected);
        }
        let entry = QueueEntry {
            payload,
            size,
            remaining: size,
            written: false,
            config,
            tx,
        };
        if entry.config.hello_with_priority {
            let at = st
                .queue
                .iter()
                .position(|existing| !existing.written)
                .unwrap_or(st.queue.len());
            st.queue.insert(at, entry);
        } else {
            st.queue.push_back(entry);
        }
        if st.open && st.cmds == 0 {
            self.writer_wake.notify_one();
        }
        Ok(rx)
    }

    /// Drive an adapter with the signals of one queued record
    async fn await_record<A: Adapter>(
        &self,
        mut rx: mpsc::UnboundedReceiver<RecordSignal>,
        adapter: &mut A,
    ) -> RedisResult<usize> {
        let mut total = 0usize;
        let mut cmd_index = 0usize;
        let mut failure: Option<RedisError> = None;
        while let Some(signal) = rx.recv().await {
            match signal {
                RecordSignal::Response(tree) => {
                    total += tree.bytes;
                    // After an adapter error the remaining trees are still
                    // drained to keep the reply stream in sync.
                    if failure.is_none() {
                        for node in &tree.nodes {
                            if let Err(err) = adapter.on_node(cmd_index, node) {
                                failure = Some(err);
                                break;
                            }
                        }
                    }
                    cmd_index += 1;
                }
                RecordSignal::Done => {
                    return match failure {
                        Some(err) => Err(err),
                        None => Ok(total),
                    };
                }
                RecordSignal::Canceled => return Err(RedisError::OperationCanceled),
            }
        }
        Err(RedisError::OperationCanceled)
    }

    async fn run_loop(&self, stop: &Notify) -> RedisResult<()> {
        loop {
            let (phase, error) = self.run_one(stop).await;
            self.shutdown_records();
            let canceled = self.state().run_canceled;
            debug!(?phase, %error, canceled, "run attempt ended");

            let reconnect = self.cfg.enable_reconnect
                && !canceled
                && matches!(phase, Phase::Connecting | Phase::Running);
            if !reconnect {
                return Err(error);
            }
            tokio::select! {
                _ = stop.notified() => return Err(RedisError::OperationCanceled),
                _ = tokio::time::sleep(self.cfg.reconnect_interval) => {}
            }
        }
    }

    /// One resolve → connect → hello → running cycle
    async fn run_one(&self, stop: &Notify) -> (Phase, RedisError) {
        debug!(host = %self.cfg.host, port = %self.cfg.port, "resolving");
        let resolved = tokio::select! {
            _ = stop.notified() => return (Phase::Resolving, RedisError::OperationCanceled),
            resolved = timeout(
                self.cfg.resolve_timeout,
                self.connector.resolve(&self.cfg.host, &self.cfg.port),
            ) => resolved,
        };
        let addrs = match resolved {
            Err(_) => return (Phase::Resolving, RedisError::ResolveTimeout),
            Ok(Err(err)) => return (Phase::Resolving, err),
            Ok(Ok(addrs)) => addrs,
        };
        tokio::select! {
            _ = stop.notified() => return (Phase::Resolving, RedisError::OperationCanceled),
            _ = self.emit_event(Event::Resolve) => {}
        }

        let connected = tokio::select! {
            _ = stop.notified() => return (Phase::Connecting, RedisError::OperationCanceled),
            connected = timeout(self.cfg.connect_timeout, self.connector.connect(&addrs)) => connected,
        };
        let stream = match connected {
            Err(_) => return (Phase::Connecting, RedisError::ConnectTimeout),
            Ok(Err(err)) => return (Phase::Connecting, err),
            Ok(Ok(stream)) => stream,
        };
        debug!("connected");
        tokio::select! {
            _ = stop.notified() => return (Phase::Connecting, RedisError::OperationCanceled),
            _ = self.emit_event(Event::Connect) => {}
        }

        self.state().open = true;
        *self.last_data.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();

        let hello_rx = match self.enqueue_hello() {
            Ok(rx) => rx,
            Err(err) => return (Phase::Greeting, err),
        };

        let (rd, wr) = tokio::io::split(stream);
        let (phase, result) = tokio::select! {
            result = self.reader_loop(rd) => (Phase::Running, result),
            result = self.writer_loop(wr) => (Phase::Running, result),
            result = self.ping_loop() => (Phase::Running, result),
            result = self.idle_loop() => (Phase::Running, result),
            result = self.greeting(hello_rx) => (Phase::Greeting, result),
            _ = stop.notified() => (Phase::Running, Err(RedisError::OperationCanceled)),
        };
        (phase, result.err().unwrap_or(RedisError::OperationCanceled))
    }

    /// Enqueue the mandatory `HELLO 3` ahead of anything not yet written
    fn enqueue_hello(&self) -> RedisResult<mpsc::UnboundedReceiver<RecordSignal>> {
        let mut req = Request::new();
        req.config_mut().hello_with_priority = true;
        req.config_mut().cancel_on_connection_lost = true;
        match (&self.cfg.username, &self.cfg.password) {
            (Some(username), Some(password)) => req.push_with(
                "HELLO",
                (3, "AUTH", username.as_str(), password.as_str()),
            ),
            _ => req.push_with("HELLO", 3),
        }
        self.enqueue(req.payload_bytes(), req.size(), req.config().clone())
    }

    /// Wait for the handshake to complete, then sleep until the run ends
    async fn greeting(
        &self,
        mut rx: mpsc::UnboundedReceiver<RecordSignal>,
    ) -> RedisResult<()> {
        loop {
            match rx.recv().await {
                Some(RecordSignal::Response(_)) => {}
                Some(RecordSignal::Done) => break,
                Some(RecordSignal::Canceled) | None => {
                    return Err(RedisError::OperationCanceled)
                }
            }
        }
        debug!("RESP3 handshake complete");
        self.emit_event(Event::Hello).await;
        std::future::pending::<()>().await;
        Ok(())
    }

    /// Write queued requests, batching where the policy allows it
    async fn writer_loop<W: AsyncWrite + Unpin>(&self, mut wr: W) -> RedisResult<()> {
        loop {
            match self.next_write_batch() {
                Some(batch) => {
                    wr.write_all(&batch).await?;
                    wr.flush().await?;
                }
                None => self.writer_wake.notified().await,
            }
        }
    }

    /// Claim the next batch of unwritten requests, marking them written
    fn next_write_batch(&self) -> Option<Vec<u8>> {
        let mut st = self.state();
        let start = st.queue.iter().position(|entry| !entry.written)?;
        let mut end = start + 1;
        if self.cfg.coalesce_requests && st.queue[start].config.coalesce {
            while end < st.queue.len()
                && !st.queue[end].written
                && st.queue[end].config.coalesce
            {
                end += 1;
            }
        }
        let mut batch = Vec::new();
        let mut written_cmds = 0u32;
        for index in start..end {
            let entry = &mut st.queue[index];
            batch.extend_from_slice(&entry.payload);
            entry.written = true;
            written_cmds += entry.size;
        }
        st.cmds += written_cmds;
        Some(batch)
    }

    /// Read bytes, decode reply trees and route each to its owner
    async fn reader_loop<R: AsyncRead + Unpin>(&self, mut rd: R) -> RedisResult<()> {
        let mut buf = BytesMut::with_capacity(8 * 1024);
        let mut parser = Resp3Parser::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut pos = 0usize;
        loop {
            loop {
                match parser.parse(&buf[..], &mut pos)? {
                    Some(node) => {
                        nodes.push(node);
                        if parser.at_tree_boundary() {
                            let bytes = pos;
                            buf.advance(bytes);
                            pos = 0;
                            let tree = Tree {
                                nodes: std::mem::take(&mut nodes),
                                bytes,
                            };
                            self.dispatch_tree(tree).await?;
                        }
                    }
                    None => break,
                }
            }
            if buf.len() >= self.cfg.max_read_size {
                return Err(RedisError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "read buffer limit exceeded",
                )));
            }
            let read = rd.read_buf(&mut buf).await?;
            if read == 0 {
                // A close between reply trees is the server ending the
                // session; one mid-tree is a truncated reply.
                return Err(if parser.at_tree_boundary() && buf.is_empty() {
                    RedisError::OperationCanceled
                } else {
                    RedisError::UnexpectedEof
                });
            }
            *self.last_data.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        }
    }

    /// Route one decoded tree to the push channel or its owning record
    async fn dispatch_tree(&self, tree: Tree) -> RedisResult<()> {
        if tree.nodes[0].data_type == Resp3Type::Push {
            debug!(children = tree.nodes[0].aggregate_size, "server push");
            let _ = self.push_tx.send(tree).await;
            self.complete_push_waiters();
            return Ok(());
        }

        let mut st = self.state();
        let Some(index) = st
            .queue
            .iter()
            .position(|entry| entry.written && entry.size > 0 && entry.remaining > 0)
        else {
            warn!("response with no owning request, aborting");
            return Err(RedisError::UnsolicitedResponse);
        };
        let finished = {
            let entry = &mut st.queue[index];
            entry.remaining -= 1;
            let _ = entry.tx.send(RecordSignal::Response(tree));
            entry.remaining == 0
        };
        if finished {
            if let Some(entry) = st.queue.remove(index) {
                let _ = entry.tx.send(RecordSignal::Done);
            }
        }
        st.cmds = st.cmds.saturating_sub(1);
        if st.cmds == 0 && st.queue.iter().any(|entry| !entry.written) {
            self.writer_wake.notify_one();
        }
        Ok(())
    }

    /// A push confirms every written subscribe-only request
    fn complete_push_waiters(&self) {
        let mut st = self.state();
        let mut index = 0;
        while index < st.queue.len() {
            if st.queue[index].written && st.queue[index].size == 0 {
                if let Some(entry) = st.queue.remove(index) {
                    let _ = entry.tx.send(RecordSignal::Done);
                }
            } else {
                index += 1;
            }
        }
    }

    /// Enqueue an internal `PING` every `ping_interval`
    async fn ping_loop(&self) -> RedisResult<()> {
        let period = self.cfg.ping_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let mut req = Request::new();
            req.config_mut().close_on_run_completion = true;
            req.push("PING");
            // The receiver is dropped: the reply is consumed by the reader
            // for ordering but carries no information.
            let _ = self.enqueue(req.payload_bytes(), req.size(), req.config().clone());
        }
    }

    /// Abort the run when the socket has been silent for too long
    async fn idle_loop(&self) -> RedisResult<()> {
        let period = self.cfg.ping_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let last = *self.last_data.lock().unwrap_or_else(PoisonError::into_inner);
            if last.elapsed() > period * 2 {
                warn!(silent_for = ?last.elapsed(), "idle timeout");
                return Err(RedisError::IdleTimeout);
            }
        }
    }

    /// Settle every queued record according to its policy after a run ends
    fn shutdown_records(&self) {
        let mut st = self.state();
        st.open = false;
        st.cmds = 0;
        let drained = std::mem::take(&mut st.queue);
        for mut entry in drained {
            let push_waiter = entry.written && entry.size == 0;
            if push_waiter || entry.config.cancel_on_connection_lost {
                let _ = entry.tx.send(RecordSignal::Canceled);
            } else if entry.config.retry_on_connection_lost {
                entry.written = false;
                entry.remaining = entry.size;
                st.queue.push_back(entry);
            } else {
                // Internal pings and plain requests end here.
                let _ = entry.tx.send(RecordSignal::Canceled);
            }
        }
    }

    async fn emit_event(&self, event: Event) {
        if self.cfg.enable_events {
            let _ = self.event_tx.send(event).await;
        }
    }
}
