//! Request builder
//!
//! A [`Request`] accumulates one or more commands as RESP3 arrays of bulk
//! strings, ready to be written to the server in a single unit, together
//! with the policy flags that steer how the pipeline treats it.
//!
//! ```
//! use redis_mux::Request;
//!
//! let mut req = Request::new();
//! req.push_with("HELLO", 3);
//! req.push_with("SET", ("key", "value"));
//! req.push("QUIT");
//! assert_eq!(req.size(), 3);
//! ```

use bytes::Bytes;

/// Commands whose confirmation arrives as a push frame rather than as an
/// in-band response
const PUSH_FAMILY: [&str; 4] = ["SUBSCRIBE", "PSUBSCRIBE", "UNSUBSCRIBE", "PUNSUBSCRIBE"];

/// Per-request pipeline policy
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Allow this request to be batched with others in one socket write
    pub coalesce: bool,

    /// Fail immediately when submitted while the connection is down
    pub cancel_if_not_connected: bool,

    /// Fail the request if the run completes before a response arrives
    pub cancel_on_connection_lost: bool,

    /// Survive a reconnect and be sent again; mutually exclusive with
    /// `cancel_on_connection_lost`, which wins when both are set
    pub retry_on_connection_lost: bool,

    /// Insert at the front of the queue, used for the `HELLO` handshake
    pub hello_with_priority: bool,

    /// Close the request when the run completes instead of carrying it
    /// over; set on the internal health-check pings
    pub close_on_run_completion: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            coalesce: true,
            cancel_if_not_connected: false,
            cancel_on_connection_lost: false,
            retry_on_connection_lost: false,
            hello_with_priority: false,
            close_on_run_completion: false,
        }
    }
}

/// One or more commands serialized as RESP3, plus their pipeline policy
///
/// `size` is the number of responses the request expects. Commands of the
/// subscribe family are confirmed out-of-band as pushes and therefore do
/// not count towards it.
#[derive(Debug, Clone, Default)]
pub struct Request {
    payload: Vec<u8>,
    commands: u32,
    config: RequestConfig,
}

impl Request {
    /// Create an empty request with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pipeline policy of this request
    #[must_use]
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Mutable access to the pipeline policy
    pub fn config_mut(&mut self) -> &mut RequestConfig {
        &mut self.config
    }

    /// Append a command without arguments
    pub fn push(&mut self, command: &str) {
        self.push_with(command, ());
    }

    /// Append a command with arguments
    ///
    /// Arguments can be strings, byte slices, numbers, pairs and tuples of
    /// those, or slices; see [`ToBulkArgs`].
    pub fn push_with<A: ToBulkArgs>(&mut self, command: &str, args: A) {
        add_header(&mut self.payload, 1 + args.bulk_count());
        add_bulk(&mut self.payload, command.as_bytes());
        args.write_bulks(&mut self.payload);
        if !is_push_family(command) {
            self.commands += 1;
        }
    }

    /// Number of responses this request expects
    #[must_use]
    pub fn size(&self) -> u32 {
        self.commands
    }

    /// The serialized RESP3 payload
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// A snapshot of the payload for handing to the pipeline
    #[must_use]
    pub fn payload_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.payload)
    }

    /// Drop all accumulated commands, keeping the policy
    pub fn clear(&mut self) {
        self.payload.clear();
        self.commands = 0;
    }
}

fn is_push_family(command: &str) -> bool {
    PUSH_FAMILY
        .iter()
        .any(|name| command.eq_ignore_ascii_case(name))
}

fn add_header(out: &mut Vec<u8>, bulks: usize) {
    out.push(b'*');
    out.extend_from_slice(bulks.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn add_bulk(out: &mut Vec<u8>, data: &[u8]) {
    out.push(b'$');
    out.extend_from_slice(data.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
}

/// Serialization of command arguments into RESP3 bulk strings
///
/// Numbers are written in their decimal form, strings and byte slices
/// verbatim, and pairs and tuples contribute one bulk per element.
pub trait ToBulkArgs {
    /// How many bulk strings this value expands to
    fn bulk_count(&self) -> usize;
    /// Append the bulk strings to the payload
    fn write_bulks(&self, out: &mut Vec<u8>);
}

impl ToBulkArgs for () {
    fn bulk_count(&self) -> usize {
        0
    }

    fn write_bulks(&self, _out: &mut Vec<u8>) {}
}

impl ToBulkArgs for &str {
    fn bulk_count(&self) -> usize {
        1
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        add_bulk(out, self.as_bytes());
    }
}

impl ToBulkArgs for String {
    fn bulk_count(&self) -> usize {
        1
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        add_bulk(out, self.as_bytes());
    }
}

impl ToBulkArgs for &[u8] {
    fn bulk_count(&self) -> usize {
        1
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        add_bulk(out, self);
    }
}

impl ToBulkArgs for Vec<u8> {
    fn bulk_count(&self) -> usize {
        1
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        add_bulk(out, self);
    }
}

impl ToBulkArgs for Bytes {
    fn bulk_count(&self) -> usize {
        1
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        add_bulk(out, self);
    }
}

macro_rules! impl_to_bulk_args_display {
    ($($kind:ty),* $(,)?) => {
        $(
            impl ToBulkArgs for $kind {
                fn bulk_count(&self) -> usize {
                    1
                }

                fn write_bulks(&self, out: &mut Vec<u8>) {
                    add_bulk(out, self.to_string().as_bytes());
                }
            }
        )*
    };
}

impl_to_bulk_args_display!(i16, i32, i64, isize, u16, u32, u64, usize, f32, f64);

macro_rules! impl_to_bulk_args_tuple {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: ToBulkArgs),+> ToBulkArgs for ($($name,)+) {
            fn bulk_count(&self) -> usize {
                let ($(ref $name,)+) = *self;
                0 $(+ $name.bulk_count())+
            }

            fn write_bulks(&self, out: &mut Vec<u8>) {
                let ($(ref $name,)+) = *self;
                $($name.write_bulks(out);)+
            }
        }
    };
}

impl_to_bulk_args_tuple!(A);
impl_to_bulk_args_tuple!(A, B);
impl_to_bulk_args_tuple!(A, B, C);
impl_to_bulk_args_tuple!(A, B, C, D);
impl_to_bulk_args_tuple!(A, B, C, D, E);

impl ToBulkArgs for &[&str] {
    fn bulk_count(&self) -> usize {
        self.len()
    }

    fn write_bulks(&self, out: &mut Vec<u8>) {
        for item in *self {
            add_bulk(out, item.as_bytes());
        }
    }
}
