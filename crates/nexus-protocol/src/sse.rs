//! SSE framing for the UI message stream.

use crate::events::StreamEvent;
use thiserror::Error;

/// Trailer frame marking end-of-stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

const DONE_PAYLOAD: &str = "[DONE]";

/// Encode one event as an SSE `data:` frame.
pub fn sse_frame(event: &StreamEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("data: {json}\n\n"))
}

/// One decoded frame from an SSE byte stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// A protocol event.
    Event(StreamEvent),
    /// The `[DONE]` trailer.
    Done,
}

/// Decode errors.
#[derive(Debug, Error)]
pub enum SseDecodeError {
    #[error("invalid event payload: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// Incremental decoder for `data: <json>\n\n` frames.
///
/// Bytes arrive in arbitrary chunk boundaries; frames are yielded only once
/// their terminating blank line has been seen. Non-`data:` lines (comments,
/// event names) are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning all frames completed by this chunk.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseFrame>, SseDecodeError> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some(end) = find_frame_end(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&raw);
            for line in text.lines() {
                let Some(payload) = line.strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim_start();
                if payload == DONE_PAYLOAD {
                    frames.push(SseFrame::Done);
                } else if !payload.is_empty() {
                    frames.push(SseFrame::Event(serde_json::from_str(payload)?));
                }
            }
        }

        Ok(frames)
    }
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let ev = StreamEvent::text_delta("t0", "Hi");
        let frame = sse_frame(&ev).unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));

        let mut dec = SseDecoder::new();
        let frames = dec.push(frame.as_bytes()).unwrap();
        assert_eq!(frames, vec![SseFrame::Event(ev)]);
    }

    #[test]
    fn decodes_across_chunk_boundaries() {
        let frame = sse_frame(&StreamEvent::text_delta("t0", "chunked")).unwrap();
        let (a, b) = frame.as_bytes().split_at(7);

        let mut dec = SseDecoder::new();
        assert!(dec.push(a).unwrap().is_empty());
        let frames = dec.push(b).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn decodes_multiple_frames_in_one_chunk() {
        let mut payload = String::new();
        payload.push_str(&sse_frame(&StreamEvent::start("m")).unwrap());
        payload.push_str(&sse_frame(&StreamEvent::text_start("t0")).unwrap());
        payload.push_str(DONE_FRAME);

        let mut dec = SseDecoder::new();
        let frames = dec.push(payload.as_bytes()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], SseFrame::Done);
    }

    #[test]
    fn ignores_comment_lines() {
        let mut dec = SseDecoder::new();
        let frames = dec.push(b": keep-alive\n\n").unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn rejects_malformed_payload() {
        let mut dec = SseDecoder::new();
        let err = dec.push(b"data: {not json}\n\n").unwrap_err();
        assert!(matches!(err, SseDecodeError::InvalidEvent(_)));
    }
}
