// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MCP stdio framing codec.
//!
//! Accepts newline-delimited JSON as well as LSP-style `Content-Length`
//! headers. Each decoded frame remembers which framing it arrived in so the
//! reply can be written back the same way. A malformed frame is surfaced as
//! `Frame::Malformed` and the stream stays usable.

use anyhow::Result;
use bytes::{Buf, BytesMut};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::constants::limits;
use crate::protocol::JsonRpcResponse;

const CONTENT_LENGTH: &[u8] = b"content-length";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Newline,
    ContentLength,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Framing, Value),
    Malformed(Framing, String),
}

/// A response paired with the framing it must be written in.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub framing: Framing,
    pub response: JsonRpcResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Head,
    Body(usize),
    /// Dropping the rest of an oversized frame
    SkipBody(usize),
    SkipLine,
}

pub struct McpCodec {
    state: DecodeState,
    max_message_bytes: usize,
}

impl McpCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_message_bytes(limits::MAX_MESSAGE_SIZE_BYTES)
    }

    #[must_use]
    pub fn with_max_message_bytes(max_message_bytes: usize) -> Self {
        Self {
            state: DecodeState::Head,
            max_message_bytes,
        }
    }

    fn parse(framing: Framing, bytes: &[u8]) -> Frame {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(val) => {
                trace!("Decoded message: {:?}", val);
                Frame::Message(framing, val)
            }
            Err(e) => Frame::Malformed(framing, e.to_string()),
        }
    }

    fn decode_head(&mut self, src: &mut BytesMut) -> Option<Frame> {
        // Blank lines between frames carry no meaning
        let leading = src
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        src.advance(leading);
        if src.is_empty() {
            return None;
        }

        if starts_with_header(src) {
            self.decode_header_block(src)
        } else {
            self.decode_line(src)
        }
    }

    fn decode_header_block(&mut self, src: &mut BytesMut) -> Option<Frame> {
        let framing = Framing::ContentLength;
        let Some(end) = find_header_end(src) else {
            if src.len() > limits::MAX_HEADER_BYTES {
                src.clear();
                return Some(Frame::Malformed(framing, "Header too large".to_string()));
            }
            return None;
        };

        let header_bytes = src.split_to(end);
        let len = match parse_content_length(&header_bytes) {
            Ok(len) => len,
            Err(detail) => return Some(Frame::Malformed(framing, detail)),
        };
        debug!("Found Content-Length: {}", len);

        if len > self.max_message_bytes {
            self.state = DecodeState::SkipBody(len);
            return Some(Frame::Malformed(
                framing,
                format!("Message length {} exceeds max limit", len),
            ));
        }
        self.state = DecodeState::Body(len);
        None
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Option<Frame> {
        let framing = Framing::Newline;
        match src.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let line = src.split_to(pos + 1);
                if pos > self.max_message_bytes {
                    return Some(Frame::Malformed(framing, "Message exceeds max limit".to_string()));
                }
                Some(Self::parse(framing, trim_ascii(&line)))
            }
            None if src.len() > self.max_message_bytes => {
                src.clear();
                self.state = DecodeState::SkipLine;
                Some(Frame::Malformed(framing, "Message exceeds max limit".to_string()))
            }
            None => None,
        }
    }
}

impl Default for McpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for McpCodec {
    type Item = Frame;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        trace!("Decoder attempting to read from {} bytes buffer", src.len());
        loop {
            match self.state {
                DecodeState::Head => {
                    if let Some(frame) = self.decode_head(src) {
                        return Ok(Some(frame));
                    }
                    // A consumed header block switches state; anything else needs more input
                    if self.state == DecodeState::Head {
                        return Ok(None);
                    }
                }
                DecodeState::Body(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    let body = src.split_to(len);
                    self.state = DecodeState::Head;
                    return Ok(Some(Self::parse(Framing::ContentLength, &body)));
                }
                DecodeState::SkipBody(remaining) => {
                    let n = remaining.min(src.len());
                    src.advance(n);
                    if n < remaining {
                        self.state = DecodeState::SkipBody(remaining - n);
                        return Ok(None);
                    }
                    self.state = DecodeState::Head;
                }
                DecodeState::SkipLine => match src.iter().position(|b| *b == b'\n') {
                    Some(pos) => {
                        src.advance(pos + 1);
                        self.state = DecodeState::Head;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                },
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        let rest = trim_ascii(src).to_vec();
        src.clear();
        let frame = match self.state {
            _ if rest.is_empty() && self.state == DecodeState::Head => None,
            DecodeState::Head if starts_with_header(&rest) => Some(Frame::Malformed(
                Framing::ContentLength,
                "Incomplete header at end of stream".to_string(),
            )),
            // A final line without its newline is still a frame
            DecodeState::Head => Some(Self::parse(Framing::Newline, &rest)),
            DecodeState::Body(_) => Some(Frame::Malformed(
                Framing::ContentLength,
                "Truncated message body at end of stream".to_string(),
            )),
            DecodeState::SkipBody(_) | DecodeState::SkipLine => None,
        };
        self.state = DecodeState::Head;
        Ok(frame)
    }
}

impl Encoder<Outbound> for McpCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(&item.response)?;
        match item.framing {
            Framing::Newline => {
                dst.reserve(body.len() + 1);
                dst.extend_from_slice(&body);
                dst.extend_from_slice(b"\n");
            }
            Framing::ContentLength => {
                let header = format!("Content-Length: {}\r\n\r\n", body.len());
                dst.extend_from_slice(header.as_bytes());
                dst.extend_from_slice(&body);
            }
        }
        Ok(())
    }
}

/// True when the buffer starts (case-insensitively) with `Content-Length`,
/// or with a prefix of it that could still become one.
fn starts_with_header(src: &[u8]) -> bool {
    let n = src.len().min(CONTENT_LENGTH.len());
    src[..n].eq_ignore_ascii_case(&CONTENT_LENGTH[..n])
}

/// Offset just past the blank line ending a header block (`\r\n\r\n` or `\n\n`).
fn find_header_end(src: &[u8]) -> Option<usize> {
    (0..src.len()).find_map(|i| {
        if src[i] != b'\n' {
            return None;
        }
        let lf_lf = i >= 1 && src[i - 1] == b'\n';
        let crlf_crlf = i >= 3 && &src[i - 3..i] == b"\r\n\r";
        (lf_lf || crlf_crlf).then_some(i + 1)
    })
}

fn parse_content_length(header_bytes: &[u8]) -> std::result::Result<usize, String> {
    let header_str =
        std::str::from_utf8(header_bytes).map_err(|_| "Invalid UTF-8 in headers".to_string())?;

    let mut len = None;
    for line in header_str.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                len = Some(
                    value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid Content-Length value '{}'", value.trim()))?,
                );
            }
        }
    }

    match len {
        Some(0) | None => Err("Missing or invalid Content-Length header".to_string()),
        Some(len) => Ok(len),
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use serde_json::json;

    fn decode_all(codec: &mut McpCodec, input: &[u8]) -> Vec<Frame> {
        let mut buf = BytesMut::from(input);
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_newline_delimited() {
        let mut codec = McpCodec::new();
        let frames = decode_all(
            &mut codec,
            b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n{\"id\":2}\r\n",
        );
        assert_eq!(
            frames,
            vec![
                Frame::Message(Framing::Newline, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})),
                Frame::Message(Framing::Newline, json!({"id": 2})),
            ]
        );
    }

    #[test]
    fn test_content_length_split_across_reads() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::from(header.as_bytes());
        buf.extend_from_slice(&body[..10]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&body[10..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Message(
                Framing::ContentLength,
                json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})
            ))
        );
    }

    #[test]
    fn test_lowercase_header_and_lf_only() {
        let mut codec = McpCodec::new();
        let frames = decode_all(&mut codec, b"content-length: 2\n\n{}");
        assert_eq!(frames, vec![Frame::Message(Framing::ContentLength, json!({}))]);
    }

    #[test]
    fn test_malformed_line_does_not_poison_stream() {
        let mut codec = McpCodec::new();
        let frames = decode_all(&mut codec, b"{not json\n{\"id\":3}\n");
        assert!(matches!(frames[0], Frame::Malformed(Framing::Newline, _)));
        assert_eq!(frames[1], Frame::Message(Framing::Newline, json!({"id": 3})));
    }

    #[test]
    fn test_oversized_content_length_is_skipped() {
        let mut codec = McpCodec::with_max_message_bytes(8);
        let frames = decode_all(
            &mut codec,
            b"Content-Length: 12\r\n\r\n{\"a\":123456}{\"id\":4}\n",
        );
        assert!(matches!(frames[0], Frame::Malformed(Framing::ContentLength, _)));
        assert_eq!(frames[1], Frame::Message(Framing::Newline, json!({"id": 4})));
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let mut codec = McpCodec::with_max_message_bytes(8);
        let mut buf = BytesMut::from(&b"{\"aaaaaaaaaaaa"[..]);
        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Malformed(Framing::Newline, _))
        ));
        buf.extend_from_slice(b"aaaa\"}\n{}\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Message(Framing::Newline, json!({})))
        );
    }

    #[test]
    fn test_missing_content_length_value() {
        let mut codec = McpCodec::new();
        let frames = decode_all(&mut codec, b"Content-Length: abc\r\n\r\n{\"id\":5}\n");
        assert!(matches!(frames[0], Frame::Malformed(Framing::ContentLength, _)));
        assert_eq!(frames[1], Frame::Message(Framing::Newline, json!({"id": 5})));
    }

    #[test]
    fn test_final_line_without_newline() {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::from(&b"{\"id\":6}"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(Frame::Message(Framing::Newline, json!({"id": 6})))
        );
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_encode_matches_framing() {
        let mut codec = McpCodec::new();
        let response = JsonRpcResponse::success(Some(RequestId::from(1)), json!({}));

        let mut dst = BytesMut::new();
        codec
            .encode(Outbound { framing: Framing::Newline, response: response.clone() }, &mut dst)
            .unwrap();
        assert_eq!(&dst[..], b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n");

        let mut dst = BytesMut::new();
        codec
            .encode(Outbound { framing: Framing::ContentLength, response }, &mut dst)
            .unwrap();
        assert!(dst.starts_with(b"Content-Length: 36\r\n\r\n"));
    }
}
