//! Incremental RESP3 parser
//!
//! [`Resp3Parser`] decodes one [`Node`] per call from a byte buffer and a
//! read offset. When the buffer does not yet hold a complete element the
//! parser returns `Ok(None)` and consumes nothing; callers read more bytes
//! and retry. Between emitted nodes the parser keeps only the stack of open
//! aggregates, which yields the depth of every node and detects when a
//! top-level reply tree is complete.

use bytes::Bytes;

use crate::core::error::{RedisError, RedisResult};
use crate::protocol::resp3::{Node, Resp3Type};

/// An open aggregate whose children are still being decoded
#[derive(Debug)]
struct Frame {
    /// Direct children still expected; unused for streamed frames
    remaining: u64,
    /// Open-ended aggregate, closed by a zero-length streamed part
    streamed: bool,
}

/// Streaming decoder from bytes to [`Node`]s
#[derive(Debug, Default)]
pub struct Resp3Parser {
    stack: Vec<Frame>,
}

/// Length token of an aggregate or blob header
enum LenToken {
    Streamed,
    Null,
    Len(u64),
}

impl Resp3Parser {
    /// Create a parser positioned at a tree boundary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next node starts a new top-level reply tree
    #[must_use]
    pub fn at_tree_boundary(&self) -> bool {
        self.stack.is_empty()
    }

    /// Depth the next node will be emitted at
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.stack.len() as u32
    }

    /// Forget any partially decoded tree
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Decode the next node from `buf` starting at `*pos`
    ///
    /// On success `*pos` is advanced past the consumed bytes. `Ok(None)`
    /// means the buffer ends before the element does; nothing is consumed
    /// and the call can be retried once more data has arrived.
    pub fn parse(&mut self, buf: &[u8], pos: &mut usize) -> RedisResult<Option<Node>> {
        loop {
            let input = &buf[*pos..];
            if input.is_empty() {
                return Ok(None);
            }
            let lead = input[0];
            let kind = Resp3Type::from_lead_byte(lead)
                .ok_or(RedisError::InvalidLeadByte(lead))?;

            return match kind {
                Resp3Type::SimpleString | Resp3Type::SimpleError | Resp3Type::BigNumber => {
                    self.parse_line(kind, input, pos, |_| Ok(()))
                }
                Resp3Type::Number => self.parse_line(kind, input, pos, |line| {
                    parse_utf8(line)?
                        .parse::<i64>()
                        .map(|_| ())
                        .map_err(|_| RedisError::NotANumber)
                }),
                Resp3Type::Doublean => self.parse_line(kind, input, pos, |line| {
                    parse_utf8(line)?
                        .parse::<f64>()
                        .map(|_| ())
                        .map_err(|_| RedisError::NotANumber)
                }),
                Resp3Type::Boolean => self.parse_line(kind, input, pos, |line| {
                    if line == b"t" || line == b"f" {
                        Ok(())
                    } else {
                        Err(RedisError::InvalidResponseType)
                    }
                }),
                Resp3Type::Null => self.parse_line(kind, input, pos, |line| {
                    if line.is_empty() {
                        Ok(())
                    } else {
                        Err(RedisError::InvalidResponseType)
                    }
                }),
                Resp3Type::BlobString | Resp3Type::BlobError | Resp3Type::VerbatimString => {
                    match self.parse_blob(kind, input, pos)? {
                        BlobOutcome::Node(node) => Ok(Some(node)),
                        BlobOutcome::NeedMore => Ok(None),
                        // A `$?` header opens a streamed string and emits
                        // nothing; its chunks follow as separate elements.
                        BlobOutcome::StreamStarted => continue,
                    }
                }
                Resp3Type::StreamedStringPart => self.parse_stream_part(input, pos),
                Resp3Type::Array
                | Resp3Type::Push
                | Resp3Type::Set
                | Resp3Type::Map
                | Resp3Type::Attribute => self.parse_aggregate(kind, input, pos),
                Resp3Type::Invalid => Err(RedisError::InvalidLeadByte(lead)),
            };
        }
    }

    /// Decode a CRLF-terminated leaf after validating its payload
    fn parse_line(
        &mut self,
        kind: Resp3Type,
        input: &[u8],
        pos: &mut usize,
        validate: impl FnOnce(&[u8]) -> RedisResult<()>,
    ) -> RedisResult<Option<Node>> {
        let Some((line, used)) = find_line(&input[1..])? else {
            return Ok(None);
        };
        validate(line)?;
        let node = Node::leaf(self.depth(), kind, Bytes::copy_from_slice(line));
        *pos += 1 + used;
        self.close_leaf();
        Ok(Some(node))
    }

    /// Decode a length-prefixed blob, a `$-1` null or a `$?` stream header
    fn parse_blob(
        &mut self,
        kind: Resp3Type,
        input: &[u8],
        pos: &mut usize,
    ) -> RedisResult<BlobOutcome> {
        let Some((line, used)) = find_line(&input[1..])? else {
            return Ok(BlobOutcome::NeedMore);
        };
        let header = 1 + used;
        match parse_len(line)? {
            LenToken::Streamed => {
                if kind != Resp3Type::BlobString {
                    return Err(RedisError::NotANumber);
                }
                *pos += header;
                self.note_child();
                self.stack.push(Frame {
                    remaining: 0,
                    streamed: true,
                });
                Ok(BlobOutcome::StreamStarted)
            }
            LenToken::Null => {
                if kind != Resp3Type::BlobString {
                    return Err(RedisError::NotANumber);
                }
                let node = Node::leaf(self.depth(), Resp3Type::Null, Bytes::new());
                *pos += header;
                self.close_leaf();
                Ok(BlobOutcome::Node(node))
            }
            LenToken::Len(len) => {
                let len = usize::try_from(len).map_err(|_| RedisError::NotANumber)?;
                if input.len() < header + len + 2 {
                    return Ok(BlobOutcome::NeedMore);
                }
                if &input[header + len..header + len + 2] != b"\r\n" {
                    return Err(RedisError::ExpectedCrlf);
                }
                let node = Node::leaf(
                    self.depth(),
                    kind,
                    Bytes::copy_from_slice(&input[header..header + len]),
                );
                *pos += header + len + 2;
                self.close_leaf();
                Ok(BlobOutcome::Node(node))
            }
        }
    }

    /// Decode a `;N` chunk; a zero-length chunk ends the enclosing stream
    fn parse_stream_part(&mut self, input: &[u8], pos: &mut usize) -> RedisResult<Option<Node>> {
        if !matches!(self.stack.last(), Some(frame) if frame.streamed) {
            return Err(RedisError::InvalidResponseType);
        }
        let Some((line, used)) = find_line(&input[1..])? else {
            return Ok(None);
        };
        let header = 1 + used;
        let len = match parse_len(line)? {
            LenToken::Len(len) => usize::try_from(len).map_err(|_| RedisError::NotANumber)?,
            LenToken::Streamed | LenToken::Null => return Err(RedisError::NotANumber),
        };
        if len == 0 {
            let node = Node::leaf(self.depth(), Resp3Type::StreamedStringPart, Bytes::new());
            *pos += header;
            self.stack.pop();
            self.settle();
            return Ok(Some(node));
        }
        if input.len() < header + len + 2 {
            return Ok(None);
        }
        if &input[header + len..header + len + 2] != b"\r\n" {
            return Err(RedisError::ExpectedCrlf);
        }
        let node = Node::leaf(
            self.depth(),
            Resp3Type::StreamedStringPart,
            Bytes::copy_from_slice(&input[header..header + len]),
        );
        *pos += header + len + 2;
        Ok(Some(node))
    }

    /// Decode an aggregate header, a `-1` null or a `?` streamed aggregate
    fn parse_aggregate(
        &mut self,
        kind: Resp3Type,
        input: &[u8],
        pos: &mut usize,
    ) -> RedisResult<Option<Node>> {
        let Some((line, used)) = find_line(&input[1..])? else {
            return Ok(None);
        };
        let multiplier = match kind {
            Resp3Type::Map | Resp3Type::Attribute => 2,
            _ => 1,
        };
        match parse_len(line)? {
            LenToken::Streamed => {
                let node = Node::aggregate(self.depth(), kind, Node::STREAMED);
                *pos += 1 + used;
                self.note_child();
                self.stack.push(Frame {
                    remaining: 0,
                    streamed: true,
                });
                Ok(Some(node))
            }
            LenToken::Null => {
                let node = Node::leaf(self.depth(), Resp3Type::Null, Bytes::new());
                *pos += 1 + used;
                self.close_leaf();
                Ok(Some(node))
            }
            LenToken::Len(len) => {
                let children = len * multiplier;
                let node = Node::aggregate(self.depth(), kind, children);
                *pos += 1 + used;
                if children == 0 {
                    self.close_leaf();
                } else {
                    self.note_child();
                    self.stack.push(Frame {
                        remaining: children,
                        streamed: false,
                    });
                }
                Ok(Some(node))
            }
        }
    }

    /// Count one child towards the innermost bounded aggregate
    fn note_child(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            if !top.streamed {
                top.remaining = top.remaining.saturating_sub(1);
            }
        }
    }

    /// Pop every bounded aggregate whose children have all arrived
    fn settle(&mut self) {
        while matches!(self.stack.last(), Some(frame) if !frame.streamed && frame.remaining == 0) {
            self.stack.pop();
        }
    }

    fn close_leaf(&mut self) {
        self.note_child();
        self.settle();
    }
}

enum BlobOutcome {
    Node(Node),
    NeedMore,
    StreamStarted,
}

/// Locate the next CRLF; returns the line and the bytes consumed with it
fn find_line(input: &[u8]) -> RedisResult<Option<(&[u8], usize)>> {
    match input.iter().position(|&byte| byte == b'\r') {
        Some(at) if at + 1 < input.len() => {
            if input[at + 1] == b'\n' {
                Ok(Some((&input[..at], at + 2)))
            } else {
                Err(RedisError::ExpectedCrlf)
            }
        }
        _ => Ok(None),
    }
}

fn parse_len(line: &[u8]) -> RedisResult<LenToken> {
    if line == b"?" {
        return Ok(LenToken::Streamed);
    }
    if line == b"-1" {
        return Ok(LenToken::Null);
    }
    let n = parse_utf8(line)?
        .parse::<u64>()
        .map_err(|_| RedisError::NotANumber)?;
    Ok(LenToken::Len(n))
}

fn parse_utf8(line: &[u8]) -> RedisResult<&str> {
    std::str::from_utf8(line).map_err(|_| RedisError::NotANumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(wire: &[u8]) -> Vec<Node> {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        let mut nodes = Vec::new();
        while let Some(node) = parser.parse(wire, &mut pos).unwrap() {
            nodes.push(node);
        }
        assert_eq!(pos, wire.len(), "parser left trailing bytes");
        assert!(parser.at_tree_boundary(), "tree left open");
        nodes
    }

    #[test]
    fn test_simple_string() {
        let nodes = parse_all(b"+PONG\r\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].data_type, Resp3Type::SimpleString);
        assert_eq!(nodes[0].depth, 0);
        assert_eq!(&nodes[0].data[..], b"PONG");
    }

    #[test]
    fn test_blob_string() {
        let nodes = parse_all(b"$5\r\nhello\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::BlobString);
        assert_eq!(&nodes[0].data[..], b"hello");
    }

    #[test]
    fn test_blob_string_binary_safe() {
        let nodes = parse_all(b"$4\r\na\r\nb\r\n");
        assert_eq!(&nodes[0].data[..], b"a\r\nb");
    }

    #[test]
    fn test_number_and_validation() {
        let nodes = parse_all(b":-42\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::Number);
        assert_eq!(&nodes[0].data[..], b"-42");

        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        let err = parser.parse(b":abc\r\n", &mut pos).unwrap_err();
        assert!(matches!(err, RedisError::NotANumber));
    }

    #[test]
    fn test_double_literals() {
        for wire in [&b",3.25\r\n"[..], b",inf\r\n", b",-inf\r\n", b",nan\r\n"] {
            let nodes = parse_all(wire);
            assert_eq!(nodes[0].data_type, Resp3Type::Doublean);
        }
    }

    #[test]
    fn test_boolean() {
        assert_eq!(&parse_all(b"#t\r\n")[0].data[..], b"t");
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(matches!(
            parser.parse(b"#x\r\n", &mut pos),
            Err(RedisError::InvalidResponseType)
        ));
    }

    #[test]
    fn test_null_variants() {
        for wire in [&b"_\r\n"[..], b"$-1\r\n", b"*-1\r\n"] {
            let nodes = parse_all(wire);
            assert_eq!(nodes[0].data_type, Resp3Type::Null);
            assert_eq!(nodes[0].aggregate_size, 0);
        }
    }

    #[test]
    fn test_nested_array_depths() {
        let nodes = parse_all(b"*2\r\n*1\r\n+a\r\n:7\r\n");
        let depths: Vec<u32> = nodes.iter().map(|node| node.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
        assert_eq!(nodes[0].aggregate_size, 2);
        assert_eq!(nodes[1].aggregate_size, 1);
    }

    #[test]
    fn test_map_child_count() {
        let nodes = parse_all(b"%2\r\n+a\r\n:1\r\n+b\r\n:2\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::Map);
        assert_eq!(nodes[0].aggregate_size, 4);
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn test_push_tree() {
        let nodes = parse_all(b">3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::Push);
        assert_eq!(nodes[0].aggregate_size, 3);
        assert_eq!(nodes.len(), 4);
    }

    #[test]
    fn test_empty_aggregate_closes() {
        let nodes = parse_all(b"*1\r\n*0\r\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].aggregate_size, 0);
    }

    #[test]
    fn test_verbatim_string_kept_opaque() {
        let nodes = parse_all(b"=15\r\ntxt:Some string\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::VerbatimString);
        assert_eq!(&nodes[0].data[..], b"txt:Some string");
    }

    #[test]
    fn test_big_number_opaque() {
        let nodes = parse_all(b"(3492890328409238509324850943850943825024385\r\n");
        assert_eq!(nodes[0].data_type, Resp3Type::BigNumber);
    }

    #[test]
    fn test_streamed_blob_string() {
        let nodes = parse_all(b"$?\r\n;4\r\nHell\r\n;5\r\no wor\r\n;1\r\nd\r\n;0\r\n");
        assert_eq!(nodes.len(), 4);
        for node in &nodes[..3] {
            assert_eq!(node.data_type, Resp3Type::StreamedStringPart);
        }
        assert!(nodes[3].data.is_empty());
    }

    #[test]
    fn test_streamed_blob_inside_array() {
        let nodes = parse_all(b"*2\r\n$?\r\n;2\r\nok\r\n;0\r\n:1\r\n");
        assert_eq!(nodes[0].aggregate_size, 2);
        assert_eq!(nodes[1].data_type, Resp3Type::StreamedStringPart);
        assert_eq!(nodes.last().unwrap().data_type, Resp3Type::Number);
        assert_eq!(nodes.last().unwrap().depth, 1);
    }

    #[test]
    fn test_streamed_aggregate() {
        let nodes = parse_all(b"*?\r\n:1\r\n:2\r\n;0\r\n");
        assert_eq!(nodes[0].aggregate_size, Node::STREAMED);
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1].depth, 1);
    }

    #[test]
    fn test_incremental_feeding() {
        let wire = b"*2\r\n$4\r\nping\r\n:12\r\n";
        let mut parser = Resp3Parser::new();
        let mut nodes = Vec::new();
        let mut buf = Vec::new();
        let mut pos = 0;
        for &byte in wire.iter() {
            buf.push(byte);
            while let Some(node) = parser.parse(&buf, &mut pos).unwrap() {
                nodes.push(node);
            }
        }
        assert_eq!(nodes.len(), 3);
        assert!(parser.at_tree_boundary());
    }

    #[test]
    fn test_need_more_consumes_nothing() {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(parser.parse(b"$10\r\nhal", &mut pos).unwrap().is_none());
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_invalid_lead_byte() {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(matches!(
            parser.parse(b"@oops\r\n", &mut pos),
            Err(RedisError::InvalidLeadByte(b'@'))
        ));
    }

    #[test]
    fn test_missing_crlf_after_blob() {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(matches!(
            parser.parse(b"$2\r\nab??", &mut pos),
            Err(RedisError::ExpectedCrlf)
        ));
    }

    #[test]
    fn test_bare_carriage_return_line() {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(matches!(
            parser.parse(b"+ok\rxx\r\n", &mut pos),
            Err(RedisError::ExpectedCrlf)
        ));
    }

    #[test]
    fn test_stream_part_outside_stream() {
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        assert!(matches!(
            parser.parse(b";2\r\nab\r\n", &mut pos),
            Err(RedisError::InvalidResponseType)
        ));
    }

    #[test]
    fn test_two_trees_share_buffer() {
        let wire = b"+OK\r\n:5\r\n";
        let mut parser = Resp3Parser::new();
        let mut pos = 0;
        let first = parser.parse(wire, &mut pos).unwrap().unwrap();
        assert!(parser.at_tree_boundary());
        let second = parser.parse(wire, &mut pos).unwrap().unwrap();
        assert_eq!(first.data_type, Resp3Type::SimpleString);
        assert_eq!(second.data_type, Resp3Type::Number);
        assert_eq!(pos, wire.len());
    }
}
