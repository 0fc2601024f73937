//! HTTP client driving the shared session state machine.

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use nexus_protocol::{SseDecoder, SseFrame, StreamEvent};
use nexus_session::{await_or_cancel, CancelAware, StreamSession};
use serde_json::Value;

/// Client for the gateway's capability endpoints.
///
/// The streaming methods all follow the same shape: guard + submit through
/// the [`StreamSession`], dispatch, consume chunks sequentially, and settle
/// the session on completion, error, or cancellation. Endpoint failures are
/// recorded on the session (status `error` + message), not returned as
/// `Err`; `Err` is reserved for local misuse.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Drive a UI message stream endpoint for an already-submitted session.
    ///
    /// The caller submits (the guard against empty input and double
    /// submission lives on [`StreamSession::submit`]) and may cancel the
    /// session's token at any point; on cancellation the body stream is
    /// dropped, which releases the connection. `on_event` sees every
    /// decoded protocol event (for tool lifecycle rendering). Text deltas
    /// are appended to the session buffer in arrival order.
    pub async fn drive_ui<F>(
        &self,
        path: &str,
        payload: &Value,
        session: &mut StreamSession,
        mut on_event: F,
    ) -> Result<()>
    where
        F: FnMut(&StreamEvent),
    {
        if !session.is_active() {
            return Err(anyhow!("drive_ui requires a submitted session"));
        }
        let token = session.cancellation_token();

        let dispatch = self.http.post(self.url(path)).json(payload).send();
        let response = match await_or_cancel(Some(&token), dispatch).await {
            CancelAware::Cancelled => {
                session.cancel().ok();
                return Ok(());
            }
            CancelAware::Value(Ok(response)) => response,
            CancelAware::Value(Err(err)) => {
                session.fail(err.to_string()).ok();
                return Ok(());
            }
        };

        if !response.status().is_success() {
            let message = error_message_from_body(&response.text().await.unwrap_or_default());
            session.fail(message).ok();
            return Ok(());
        }

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            let chunk = match await_or_cancel(Some(&token), body.next()).await {
                CancelAware::Cancelled => {
                    // Dropping `body` below releases the connection.
                    session.cancel().ok();
                    return Ok(());
                }
                CancelAware::Value(Some(Ok(chunk))) => chunk,
                CancelAware::Value(Some(Err(err))) => {
                    session.fail(err.to_string()).ok();
                    return Ok(());
                }
                CancelAware::Value(None) => break,
            };

            let frames = match decoder.push(&chunk) {
                Ok(frames) => frames,
                Err(err) => {
                    session.fail(err.to_string()).ok();
                    return Ok(());
                }
            };
            for frame in frames {
                match frame {
                    SseFrame::Event(event) => {
                        match &event {
                            StreamEvent::TextDelta { delta, .. } => {
                                session.append_chunk(delta).ok();
                            }
                            StreamEvent::Error { error_text } => {
                                session.fail(error_text.clone()).ok();
                            }
                            StreamEvent::Finish { .. } => {
                                session.complete().ok();
                            }
                            _ => {}
                        }
                        on_event(&event);
                    }
                    SseFrame::Done => {
                        if session.is_active() {
                            session.complete().ok();
                        }
                    }
                }
            }
        }

        // Stream ended without a terminal event (server went away).
        if session.is_active() {
            session.complete().ok();
        }
        Ok(())
    }

    /// Drive a plain-text streaming endpoint (structured objects) for an
    /// already-submitted session.
    pub async fn drive_text<F>(
        &self,
        path: &str,
        payload: &Value,
        session: &mut StreamSession,
        mut on_delta: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        if !session.is_active() {
            return Err(anyhow!("drive_text requires a submitted session"));
        }
        let token = session.cancellation_token();

        let dispatch = self.http.post(self.url(path)).json(payload).send();
        let response = match await_or_cancel(Some(&token), dispatch).await {
            CancelAware::Cancelled => {
                session.cancel().ok();
                return Ok(());
            }
            CancelAware::Value(Ok(response)) => response,
            CancelAware::Value(Err(err)) => {
                session.fail(err.to_string()).ok();
                return Ok(());
            }
        };

        if !response.status().is_success() {
            let message = error_message_from_body(&response.text().await.unwrap_or_default());
            session.fail(message).ok();
            return Ok(());
        }

        let mut body = response.bytes_stream();
        loop {
            match await_or_cancel(Some(&token), body.next()).await {
                CancelAware::Cancelled => {
                    session.cancel().ok();
                    return Ok(());
                }
                CancelAware::Value(Some(Ok(chunk))) => {
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    session.append_chunk(&text).ok();
                    on_delta(&text);
                }
                CancelAware::Value(Some(Err(err))) => {
                    session.fail(err.to_string()).ok();
                    return Ok(());
                }
                CancelAware::Value(None) => break,
            }
        }

        if session.is_active() {
            session.complete().ok();
        }
        Ok(())
    }

    /// One-shot completion: `{ prompt }` → `{ text }`.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/api/completion"))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!(error_message_from_body(&body)));
        }
        let parsed: Value = serde_json::from_str(&body).context("invalid response body")?;
        Ok(parsed["text"].as_str().unwrap_or_default().to_string())
    }

    /// Image synthesis: `{ prompt }` → base64 string.
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/api/generate-image"))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            // Surface exactly the provider's message.
            return Err(anyhow!(error_message_from_body(&body)));
        }
        let base64: String = serde_json::from_str(&body).context("invalid image payload")?;
        Ok(base64)
    }

    /// Speech synthesis: `{ text }` → (audio bytes, media type).
    pub async fn generate_speech(&self, text: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .http
            .post(self.url("/api/generate-speech"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        if !status.is_success() {
            // This endpoint replies plain text on failure.
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("speech generation failed ({status})")
            } else {
                body
            };
            return Err(anyhow!(message));
        }
        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await.context("reading audio body")?;
        Ok((bytes.to_vec(), media_type))
    }

    /// Transcription: multipart audio upload → transcript JSON.
    pub async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<Value> {
        let part = reqwest::multipart::Part::bytes(audio).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("audio", part);
        let response = self
            .http
            .post(self.url("/api/transcribe-audio"))
            .multipart(form)
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!(error_message_from_body(&body)));
        }
        serde_json::from_str(&body).context("invalid transcript payload")
    }
}

/// Pull the display message out of a `{ "error": msg }` body, falling back
/// to the raw text.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "request failed".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
