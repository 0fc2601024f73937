use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use futures::stream;
use genai::chat::{
    ChatOptions, ChatRequest, ChatStreamEvent, MessageContent, StreamChunk, StreamEnd, ToolCall,
    ToolChunk,
};
use nexus_provider::{
    ChatCompletion, ChatEventStream, ChatExecutor, GeneratedImage, MediaClient, ModelConfig,
    ProviderError, SpeechAudio, Transcription, TranscriptionSegment,
};
use nexus_server::api::create_router;
use nexus_server::state::AppState;
use nexus_server::tools::default_registry;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ============================================================================
// Scripted provider doubles
// ============================================================================

#[derive(Default)]
struct ScriptedExecutor {
    completions: Mutex<VecDeque<ChatCompletion>>,
    streams: Mutex<VecDeque<Vec<genai::Result<ChatStreamEvent>>>>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    fn with_completion(self, completion: ChatCompletion) -> Self {
        self.completions.lock().unwrap().push_back(completion);
        self
    }

    fn with_stream(self, events: Vec<genai::Result<ChatStreamEvent>>) -> Self {
        self.streams.lock().unwrap().push_back(events);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatExecutor for ScriptedExecutor {
    async fn exec_chat(
        &self,
        _model: &str,
        _chat_req: ChatRequest,
        _options: Option<&ChatOptions>,
    ) -> genai::Result<ChatCompletion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn exec_chat_stream(
        &self,
        _model: &str,
        _chat_req: ChatRequest,
        _options: Option<&ChatOptions>,
    ) -> genai::Result<ChatEventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let events = self.streams.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(stream::iter(events)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
struct ScriptedMedia {
    /// When set, every media call fails with this (status, body) pair.
    fail_with: Option<(u16, String)>,
}

impl ScriptedMedia {
    fn failing(status: u16, body: &str) -> Self {
        Self {
            fail_with: Some((status, body.to_string())),
        }
    }

    fn fail(&self) -> Option<ProviderError> {
        self.fail_with
            .as_ref()
            .map(|(status, body)| ProviderError::from_error_body(*status, body))
    }
}

#[async_trait]
impl MediaClient for ScriptedMedia {
    async fn generate_image(
        &self,
        _model: &str,
        _prompt: &str,
    ) -> Result<GeneratedImage, ProviderError> {
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(GeneratedImage {
            base64: "QUJDRA==".to_string(),
            media_type: "image/png".to_string(),
        })
    }

    async fn generate_speech(
        &self,
        _model: &str,
        _voice: &str,
        _text: &str,
    ) -> Result<SpeechAudio, ProviderError> {
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(SpeechAudio {
            bytes: Bytes::from_static(b"ID3fakeaudio"),
            media_type: "audio/mpeg".to_string(),
        })
    }

    async fn transcribe(
        &self,
        _model: &str,
        _audio: Vec<u8>,
        _filename: &str,
    ) -> Result<Transcription, ProviderError> {
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(Transcription {
            text: "hello world".to_string(),
            segments: vec![TranscriptionSegment {
                start: 0.0,
                end: 1.5,
                text: "hello world".to_string(),
            }],
            language: Some("english".to_string()),
            duration_seconds: Some(1.5),
        })
    }
}

fn make_app(executor: ScriptedExecutor, media: ScriptedMedia) -> axum::Router {
    let state = AppState::new(
        Arc::new(executor),
        Arc::new(media),
        ModelConfig::default(),
        default_registry(),
    );
    create_router(state)
}

fn text_stream(parts: &[&str]) -> Vec<genai::Result<ChatStreamEvent>> {
    let mut events: Vec<genai::Result<ChatStreamEvent>> = vec![Ok(ChatStreamEvent::Start)];
    for part in parts {
        events.push(Ok(ChatStreamEvent::Chunk(StreamChunk {
            content: part.to_string(),
        })));
    }
    events.push(Ok(ChatStreamEvent::End(StreamEnd::default())));
    events
}

async fn post_json(app: axum::Router, uri: &str, payload: Value) -> (StatusCode, String) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request build should succeed"),
        )
        .await
        .expect("app should handle request");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 4 * 1024 * 1024)
        .await
        .expect("response body should be readable");
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn assert_ordered(body: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match body[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("expected {needle:?} (in order) in body:\n{body}"),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_is_ok() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test]
async fn completion_returns_text() {
    let executor = ScriptedExecutor::default().with_completion(ChatCompletion {
        text: "Hi there".to_string(),
        usage: None,
    });
    let app = make_app(executor, ScriptedMedia::default());

    let (status, body) = post_json(app, "/api/completion", json!({"prompt": "Hello"})).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["text"], "Hi there");
}

#[tokio::test]
async fn completion_rejects_empty_prompt_without_dispatch() {
    let executor = Arc::new(ScriptedExecutor::default());
    let state = AppState::new(
        executor.clone(),
        Arc::new(ScriptedMedia::default()),
        ModelConfig::default(),
        default_registry(),
    );
    let app = create_router(state);

    let (status, body) = post_json(app, "/api/completion", json!({"prompt": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));
    assert_eq!(executor.call_count(), 0, "no request must be dispatched");
}

// ============================================================================
// Chat / stream endpoints
// ============================================================================

#[tokio::test]
async fn chat_streams_ui_message_events() {
    let executor =
        ScriptedExecutor::default().with_stream(text_stream(&["Hello", " ", "world"]));
    let app = make_app(executor, ScriptedMedia::default());

    let payload = json!({
        "messages": [
            { "id": "u1", "role": "user", "parts": [ { "type": "text", "text": "hi" } ] }
        ]
    });
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("x-vercel-ai-ui-message-stream")
            .and_then(|v| v.to_str().ok()),
        Some("v1")
    );

    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = String::from_utf8_lossy(&body);
    assert_ordered(
        &body,
        &[
            r#""type":"start""#,
            r#""type":"text-start""#,
            r#""delta":"Hello""#,
            r#""delta":" ""#,
            r#""delta":"world""#,
            r#""type":"text-end""#,
            r#""type":"finish""#,
            "[DONE]",
        ],
    );
}

#[tokio::test]
async fn chat_rejects_history_without_user_text() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let (status, _) = post_json(app, "/api/chat", json!({"messages": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let payload = json!({
        "messages": [
            { "id": "u1", "role": "user", "parts": [ { "type": "text", "text": "  " } ] }
        ]
    });
    let (status, _) = post_json(app, "/api/chat", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stream_endpoint_relays_prompt_stream() {
    let executor = ScriptedExecutor::default().with_stream(text_stream(&["to", "ken", "s"]));
    let app = make_app(executor, ScriptedMedia::default());

    let (status, body) = post_json(app, "/api/stream", json!({"prompt": "count tokens"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_ordered(
        &body,
        &[
            r#""delta":"to""#,
            r#""delta":"ken""#,
            r#""delta":"s""#,
            r#""finishReason":"stop""#,
        ],
    );
}

#[tokio::test]
async fn multi_modal_chat_accepts_file_only_message() {
    let executor = ScriptedExecutor::default().with_stream(text_stream(&["a cat"]));
    let app = make_app(executor, ScriptedMedia::default());

    let payload = json!({
        "messages": [{
            "id": "u1",
            "role": "user",
            "parts": [
                { "type": "file", "url": "data:image/png;base64,aGk=", "mediaType": "image/png" }
            ]
        }]
    });
    let (status, body) = post_json(app, "/api/multi-modal-chat", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""delta":"a cat""#));
}

// ============================================================================
// Tools endpoint
// ============================================================================

fn weather_call_stream() -> Vec<genai::Result<ChatStreamEvent>> {
    let call = ToolCall {
        call_id: "call_1".to_string(),
        fn_name: "get_weather".to_string(),
        fn_arguments: Value::String(r#"{"location":"Berlin"}"#.to_string()),
    };
    vec![
        Ok(ChatStreamEvent::Start),
        Ok(ChatStreamEvent::ToolCallChunk(ToolChunk {
            tool_call: call.clone(),
        })),
        Ok(ChatStreamEvent::End(StreamEnd {
            captured_content: Some(MessageContent::from_tool_calls(vec![call])),
            ..Default::default()
        })),
    ]
}

#[tokio::test]
async fn tools_endpoint_streams_full_tool_lifecycle() {
    let executor = ScriptedExecutor::default()
        .with_stream(weather_call_stream())
        .with_stream(text_stream(&["It is sunny in Berlin."]));
    let app = make_app(executor, ScriptedMedia::default());

    let payload = json!({
        "messages": [
            { "id": "u1", "role": "user", "parts": [ { "type": "text", "text": "weather in berlin?" } ] }
        ]
    });
    let (status, body) = post_json(app, "/api/tools", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_ordered(
        &body,
        &[
            r#""type":"start""#,
            r#""type":"start-step""#,
            r#""type":"tool-input-start""#,
            r#""toolName":"get_weather""#,
            r#""type":"tool-input-available""#,
            r#""type":"tool-output-available""#,
            r#""type":"finish-step""#,
            r#""type":"start-step""#,
            r#""delta":"It is sunny in Berlin.""#,
            r#""type":"finish""#,
            "[DONE]",
        ],
    );
    // The invocation's visible lifecycle never regresses: output comes after
    // input, and the tool result payload carries the executed data.
    assert!(body.contains(r#""location":"Berlin""#), "body: {body}");
    assert!(body.contains("temperature"), "body: {body}");
}

#[tokio::test]
async fn tools_endpoint_reports_tool_failure_in_stream() {
    let call = ToolCall {
        call_id: "call_1".to_string(),
        fn_name: "get_weather".to_string(),
        // Wrong argument type: schema validation fails at execution time.
        fn_arguments: Value::String(r#"{"location":42}"#.to_string()),
    };
    let first = vec![
        Ok(ChatStreamEvent::Start),
        Ok(ChatStreamEvent::End(StreamEnd {
            captured_content: Some(MessageContent::from_tool_calls(vec![call])),
            ..Default::default()
        })),
    ];
    let executor = ScriptedExecutor::default()
        .with_stream(first)
        .with_stream(text_stream(&["I could not check the weather."]));
    let app = make_app(executor, ScriptedMedia::default());

    let payload = json!({
        "messages": [
            { "id": "u1", "role": "user", "parts": [ { "type": "text", "text": "weather?" } ] }
        ]
    });
    let (status, body) = post_json(app, "/api/tools", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_ordered(
        &body,
        &[
            r#""type":"tool-input-available""#,
            r#""type":"tool-output-error""#,
            r#""type":"finish""#,
        ],
    );
}

// ============================================================================
// Structured endpoints
// ============================================================================

#[tokio::test]
async fn structured_data_streams_plain_json_text() {
    let recipe = r#"{"recipe":{"name":"Biryani","ingredients":[{"name":"rice","amount":"2 cups"}],"steps":["cook"]}}"#;
    let halves = recipe.split_at(20);
    let executor =
        ScriptedExecutor::default().with_stream(text_stream(&[halves.0, halves.1]));
    let app = make_app(executor, ScriptedMedia::default());

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/structured-data")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"dish": "biryani"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("text/plain"));

    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&body), recipe);
}

#[tokio::test]
async fn structured_array_requires_type() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let (status, _) = post_json(app, "/api/structured-array", json!({"type": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Image
// ============================================================================

#[tokio::test]
async fn generate_image_returns_base64_json_string() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let (status, body) = post_json(app, "/api/generate-image", json!({"prompt": "a cat"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "\"QUJDRA==\"");
}

#[tokio::test]
async fn generate_image_relays_provider_error_message() {
    let media = ScriptedMedia::failing(429, r#"{"error":{"message":"quota exceeded"}}"#);
    let app = make_app(ScriptedExecutor::default(), media);

    let (status, body) = post_json(app, "/api/generate-image", json!({"prompt": "a cat"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "quota exceeded");
}

#[tokio::test]
async fn generate_image_rejects_empty_prompt() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let (status, _) = post_json(app, "/api/generate-image", json!({"prompt": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Speech
// ============================================================================

#[tokio::test]
async fn generate_speech_returns_audio_with_content_type() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-speech")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"text": "read this"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("audio/mpeg")
    );
    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    assert_eq!(&body[..], b"ID3fakeaudio");
}

#[tokio::test]
async fn generate_speech_errors_are_plain_text() {
    let media = ScriptedMedia::failing(500, "synthesis backend down");
    let app = make_app(ScriptedExecutor::default(), media);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-speech")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"text": "read this"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("text/plain"));
    let body = to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&body), "synthesis backend down");
}

// ============================================================================
// Transcription
// ============================================================================

fn multipart_audio_request(field: &str) -> Request<Body> {
    let boundary = "nexus-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"take.wav\"\r\n\
         Content-Type: audio/wav\r\n\r\n\
         RIFFfakewavdata\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/api/transcribe-audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn transcribe_audio_returns_transcript_metadata() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let resp = app.oneshot(multipart_audio_request("audio")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["text"], "hello world");
    assert_eq!(parsed["language"], "english");
    assert_eq!(parsed["durationInSeconds"], 1.5);
    assert_eq!(parsed["segments"][0]["text"], "hello world");
}

#[tokio::test]
async fn transcribe_audio_accepts_file_field_name() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let resp = app.oneshot(multipart_audio_request("file")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn transcribe_audio_without_file_is_bad_request() {
    let app = make_app(ScriptedExecutor::default(), ScriptedMedia::default());
    let boundary = "nexus-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         no audio here\r\n\
         --{boundary}--\r\n"
    );
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transcribe-audio")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
