//! SSE plumbing for the streaming endpoints.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use nexus_protocol::{sse_frame, StreamEvent, DONE_FRAME, STREAM_PROTOCOL_VERSION};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tracing::warn;

/// Channel capacity for one stream's frames.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Sender half handed to a streaming task.
///
/// A failed send means the client went away; the task should stop pulling
/// from the provider (which drops the upstream stream; that is the
/// cooperative cancellation path for disconnects).
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Bytes>,
}

impl FrameSender {
    /// Send one protocol event as an SSE frame.
    pub async fn send_event(&self, event: &StreamEvent) -> Result<(), ()> {
        let frame = match sse_frame(event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "failed to serialize stream event");
                return Err(());
            }
        };
        self.tx.send(Bytes::from(frame)).await.map_err(|_| ())
    }

    /// Send several events in order, stopping on the first failure.
    pub async fn send_events(&self, events: &[StreamEvent]) -> Result<(), ()> {
        for event in events {
            self.send_event(event).await?;
        }
        Ok(())
    }

    /// Send raw bytes (plain-text streaming endpoints).
    pub async fn send_raw(&self, bytes: Bytes) -> Result<(), ()> {
        self.tx.send(bytes).await.map_err(|_| ())
    }

    /// Send the `[DONE]` trailer.
    pub async fn send_done(&self) {
        let _ = self.tx.send(Bytes::from(DONE_FRAME)).await;
    }
}

/// Create the channel pair for one response stream.
pub fn frame_channel() -> (
    FrameSender,
    impl futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
) {
    let (tx, mut rx) = mpsc::channel::<Bytes>(FRAME_CHANNEL_CAPACITY);
    let body = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    };
    (FrameSender { tx }, body)
}

/// Plain SSE response.
pub fn sse_response<S>(stream: S) -> Response
where
    S: futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}

/// SSE response tagged as a UI message stream.
pub fn ui_stream_response<S>(stream: S) -> Response
where
    S: futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut response = sse_response(stream);
    response.headers_mut().insert(
        header::HeaderName::from_static("x-vercel-ai-ui-message-stream"),
        HeaderValue::from_static(STREAM_PROTOCOL_VERSION),
    );
    response
}

/// Plain-text streaming response (structured object endpoints).
pub fn text_stream_response<S>(stream: S) -> Response
where
    S: futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    (headers, Body::from_stream(stream)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn frames_flow_through_channel_in_order() {
        let (sender, body) = frame_channel();
        sender
            .send_event(&StreamEvent::text_delta("t0", "a"))
            .await
            .unwrap();
        sender.send_done().await;
        drop(sender);

        let chunks: Vec<_> = body.collect().await;
        assert_eq!(chunks.len(), 2);
        let first = String::from_utf8(chunks[0].as_ref().unwrap().to_vec()).unwrap();
        assert!(first.contains("text-delta"));
        let last = String::from_utf8(chunks[1].as_ref().unwrap().to_vec()).unwrap();
        assert_eq!(last, DONE_FRAME);
    }

    #[tokio::test]
    async fn send_fails_once_receiver_dropped() {
        let (sender, body) = frame_channel();
        drop(body);
        let res = sender.send_event(&StreamEvent::finish_with_reason("stop")).await;
        assert!(res.is_err());
    }

    #[test]
    fn ui_stream_response_carries_protocol_header() {
        let (_, body) = frame_channel();
        let resp = ui_stream_response(body);
        assert_eq!(
            resp.headers()
                .get("x-vercel-ai-ui-message-stream")
                .and_then(|v| v.to_str().ok()),
            Some("v1")
        );
        assert_eq!(
            resp.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
    }
}
