//! Newline-delimited framing over any byte stream.
//!
//! Each frame is one compact JSON document followed by `\n`. Compact JSON
//! never contains a raw newline, so the delimiter is unambiguous.
//!
//! Lines that cannot be read as text (too long, or not UTF-8) are yielded as
//! [`Frame`] values rather than decoder errors, so a single bad line never
//! ends the stream.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};

use crate::{ChannelError, MAX_FRAME_BYTES};

pub type FrameReader<R> = FramedRead<R, FrameCodec>;
pub type FrameWriter<W> = FramedWrite<W, FrameCodec>;

/// One line read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// The line ran past the frame limit and was discarded up to its newline.
    Oversized,
    NotUtf8,
}

impl Frame {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Oversized | Self::NotUtf8 => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_length: usize,
    next_index: usize,
    discarding: bool,
}

impl FrameCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_BYTES)
    }
}

fn classify(line: &[u8]) -> Frame {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match std::str::from_utf8(line) {
        Ok(text) => Frame::Text(text.to_string()),
        Err(_) => Frame::NotUtf8,
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            let read_to = self.max_length.saturating_add(1).min(buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|byte| *byte == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                    return Ok(Some(Frame::Oversized));
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(classify(&line[..end])));
                }
                (false, None) if buf.len() > self.max_length => {
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        self.next_index = 0;
        if self.discarding {
            self.discarding = false;
            buf.clear();
            return Ok(Some(Frame::Oversized));
        }

        if buf.is_empty() {
            return Ok(None);
        }

        let line = buf.split_to(buf.len());
        Ok(Some(classify(&line)))
    }
}

impl Encoder<String> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), io::Error> {
        buf.reserve(line.len() + 1);
        buf.put_slice(line.as_bytes());
        buf.put_u8(b'\n');
        Ok(())
    }
}

pub fn frame_reader<R: AsyncRead>(reader: R) -> FrameReader<R> {
    FramedRead::new(reader, FrameCodec::default())
}

pub fn frame_writer<W: AsyncWrite>(writer: W) -> FrameWriter<W> {
    FramedWrite::new(writer, FrameCodec::default())
}

pub fn encode_frame<T: Serialize>(message: &T) -> Result<String, ChannelError> {
    let frame = serde_json::to_string(message)
        .map_err(|error| ChannelError::protocol(format!("failed to encode frame: {error}")))?;

    if frame.len() > MAX_FRAME_BYTES {
        return Err(ChannelError::protocol(format!(
            "frame of {} bytes exceeds the {MAX_FRAME_BYTES} byte limit",
            frame.len()
        )));
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn frames_round_trip_over_a_pipe() {
        let (client, server) = tokio::io::duplex(4096);
        let mut writer = frame_writer(client);
        let mut reader = frame_reader(server);

        let frame = encode_frame(&json!({"text": "line one\nline two"})).expect("encode");
        assert!(!frame.contains('\n'));

        writer.send(frame.clone()).await.expect("send");
        let received = reader.next().await.expect("frame").expect("decode");
        assert_eq!(received, Frame::Text(frame));
    }

    #[test]
    fn oversized_frames_are_refused() {
        let huge = "x".repeat(MAX_FRAME_BYTES);
        let error = encode_frame(&json!({ "blob": huge })).expect_err("too large");
        assert_eq!(error.kind, crate::ChannelErrorKind::Protocol);
    }

    #[test]
    fn bad_lines_are_reported_and_decoding_continues() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"\xff\xfe\nthis line is too long\nok\r\n"[..]);

        assert_eq!(codec.decode(&mut buf).expect("decode"), Some(Frame::NotUtf8));
        assert_eq!(codec.decode(&mut buf).expect("decode"), Some(Frame::Oversized));
        assert_eq!(
            codec.decode(&mut buf).expect("decode"),
            Some(Frame::Text("ok".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).expect("decode"), None);
    }

    #[test]
    fn partial_lines_wait_for_their_newline() {
        let mut codec = FrameCodec::new(64);
        let mut buf = BytesMut::from(&b"{\"a\":"[..]);
        assert_eq!(codec.decode(&mut buf).expect("decode"), None);

        buf.extend_from_slice(b"1}\n");
        assert_eq!(
            codec.decode(&mut buf).expect("decode"),
            Some(Frame::Text("{\"a\":1}".to_string()))
        );
    }

    #[tokio::test]
    async fn stream_survives_an_invalid_utf8_line() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut reader = frame_reader(server);

        client.write_all(b"\xc3\x28\n{}\n").await.expect("write");
        drop(client);

        assert_eq!(reader.next().await.expect("frame").expect("io"), Frame::NotUtf8);
        assert_eq!(
            reader.next().await.expect("frame").expect("io"),
            Frame::Text("{}".to_string())
        );
        assert!(reader.next().await.is_none());
    }
}
