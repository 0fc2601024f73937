//! Capability subcommands: each one is the terminal rendition of a demo
//! page, driving the shared [`StreamSession`] over the gateway.

use crate::capture::{read_capped, MAX_CAPTURE_SECONDS};
use crate::client::GatewayClient;
use anyhow::{anyhow, Context, Result};
use base64::Engine;
use nexus_protocol::{StreamEvent, UiMessage, UiMessagePart};
use nexus_session::{MessageLog, SessionError, SessionStatus, StreamSession, ToolInvocation};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

fn message_id(prefix: &str, n: usize) -> String {
    format!("{prefix}-{n}")
}

/// Watch Ctrl-C and cancel the session's token; abort on drop.
fn spawn_cancel_watcher(session: &StreamSession) -> tokio::task::JoinHandle<()> {
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

fn report_outcome(session: &StreamSession) {
    match session.status() {
        SessionStatus::Error => {
            eprintln!();
            eprintln!("error: {}", session.error_message().unwrap_or("unknown"));
        }
        _ => println!(),
    }
}

/// Interactive chat (`/api/chat`) or tool-calling chat (`/api/tools`).
pub async fn chat(client: &GatewayClient, tools: bool) -> Result<()> {
    let path = if tools { "/api/tools" } else { "/api/chat" };
    println!("connected to {path} - empty line to skip, Ctrl-D to quit, Ctrl-C to cancel a reply");

    let mut log = MessageLog::new();
    let mut session = StreamSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut turn = 0usize;

    loop {
        print!("you> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match session.submit(&line) {
            Ok(()) => {}
            // Empty input is a no-op: no request, status unchanged.
            Err(SessionError::EmptyInput) => continue,
            Err(err) => return Err(err.into()),
        }

        turn += 1;
        log.append(UiMessage::user(message_id("user", turn), line.trim()));
        let payload = json!({ "messages": serde_json::to_value(log.messages())? });

        let watcher = spawn_cancel_watcher(&session);
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();

        client
            .drive_ui(path, &payload, &mut session, |event| {
                render_event(event, &mut invocations, &mut index_by_id);
            })
            .await?;
        watcher.abort();
        report_outcome(&session);

        // Finalize the assistant message: text plus tool parts, in order.
        let mut assistant = UiMessage::assistant(message_id("assistant", turn));
        for invocation in &invocations {
            assistant = assistant.with_part(invocation.to_part());
        }
        if !session.output().is_empty() {
            assistant = assistant.with_part(UiMessagePart::Text {
                text: session.output().to_string(),
                state: None,
            });
        }
        if !assistant.parts.is_empty() {
            log.append(assistant);
        }
    }
    Ok(())
}

/// Apply one protocol event to the render state and the terminal.
fn render_event(
    event: &StreamEvent,
    invocations: &mut Vec<ToolInvocation>,
    index_by_id: &mut HashMap<String, usize>,
) {
    match event {
        StreamEvent::TextDelta { delta, .. } => {
            print!("{delta}");
            std::io::stdout().flush().ok();
        }
        StreamEvent::ToolInputStart {
            tool_call_id,
            tool_name,
        } => {
            index_by_id.insert(tool_call_id.clone(), invocations.len());
            invocations.push(ToolInvocation::start(tool_call_id, tool_name));
            println!("[tool] {tool_name}: collecting input");
        }
        StreamEvent::ToolInputDelta {
            tool_call_id,
            input_text_delta,
        } => {
            if let Some(&i) = index_by_id.get(tool_call_id) {
                invocations[i].append_input_delta(input_text_delta).ok();
            }
        }
        StreamEvent::ToolInputAvailable {
            tool_call_id,
            input,
            ..
        } => {
            if let Some(&i) = index_by_id.get(tool_call_id) {
                invocations[i].input_available(input.clone()).ok();
                println!("[tool] input: {input}");
            }
        }
        StreamEvent::ToolOutputAvailable {
            tool_call_id,
            output,
        } => {
            if let Some(&i) = index_by_id.get(tool_call_id) {
                invocations[i].output_available(output.clone()).ok();
                println!("[tool] output: {output}");
            }
        }
        StreamEvent::ToolOutputError {
            tool_call_id,
            error_text,
        } => {
            if let Some(&i) = index_by_id.get(tool_call_id) {
                invocations[i].output_error(error_text.clone()).ok();
                println!("[tool] failed: {error_text}");
            }
        }
        _ => {}
    }
}

/// One-shot completion.
pub async fn complete(client: &GatewayClient, prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(anyhow!("prompt is empty"));
    }
    match client.complete(prompt).await {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(())
        }
    }
}

/// Streamed completion for a bare prompt.
pub async fn stream(client: &GatewayClient, prompt: &str) -> Result<()> {
    let mut session = StreamSession::new();
    if session.submit(prompt).is_err() {
        return Err(anyhow!("prompt is empty"));
    }
    let watcher = spawn_cancel_watcher(&session);
    client
        .drive_ui(
            "/api/stream",
            &json!({ "prompt": prompt.trim() }),
            &mut session,
            |event| {
                if let StreamEvent::TextDelta { delta, .. } = event {
                    print!("{delta}");
                    std::io::stdout().flush().ok();
                }
            },
        )
        .await?;
    watcher.abort();
    report_outcome(&session);
    Ok(())
}

/// Structured object extraction (`recipe` and `pokemon` pages).
pub async fn structured(
    client: &GatewayClient,
    path: &str,
    payload: Value,
    input: &str,
) -> Result<()> {
    let mut session = StreamSession::new();
    if session.submit(input).is_err() {
        return Err(anyhow!("input is empty"));
    }
    let watcher = spawn_cancel_watcher(&session);
    client
        .drive_text(path, &payload, &mut session, |delta| {
            print!("{delta}");
            std::io::stdout().flush().ok();
        })
        .await?;
    watcher.abort();
    report_outcome(&session);
    Ok(())
}

/// Image synthesis; writes the decoded image next to the prompt.
pub async fn image(client: &GatewayClient, prompt: &str, out: &Path) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(anyhow!("prompt is empty"));
    }
    let base64 = match client.generate_image(prompt).await {
        Ok(base64) => base64,
        Err(err) => {
            // Show exactly the provider's message; nothing is written.
            eprintln!("{err}");
            return Ok(());
        }
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64.as_bytes())
        .context("image payload is not valid base64")?;
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

/// Speech synthesis; writes the audio payload to `out`.
pub async fn speech(client: &GatewayClient, text: &str, out: &Path) -> Result<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("text is empty"));
    }
    let (bytes, media_type) = match client.generate_speech(text).await {
        Ok(audio) => audio,
        Err(err) => {
            eprintln!("{err}");
            return Ok(());
        }
    };
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {} ({media_type}, {} bytes)", out.display(), bytes.len());
    Ok(())
}

/// Transcription of a file, or of bytes piped on stdin (capped at 10 s).
pub async fn transcribe(
    client: &GatewayClient,
    file: Option<PathBuf>,
    record: bool,
) -> Result<()> {
    let (bytes, filename) = match (file, record) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("audio.webm")
                .to_string();
            (bytes, filename)
        }
        (None, true) => {
            eprintln!("capturing from stdin (auto-stops after {MAX_CAPTURE_SECONDS}s)...");
            let capture = read_capped(
                tokio::io::stdin(),
                Duration::from_secs(MAX_CAPTURE_SECONDS),
            )
            .await
            .context("capturing audio")?;
            if capture.hit_cap {
                eprintln!("capture stopped at the {MAX_CAPTURE_SECONDS}s boundary");
            }
            (capture.bytes, "recording.webm".to_string())
        }
        (None, false) => {
            return Err(anyhow!("pass an audio file, or --record to capture stdin"));
        }
    };

    if bytes.is_empty() {
        return Err(anyhow!("no audio captured"));
    }

    let transcript = match client.transcribe(bytes, &filename).await {
        Ok(transcript) => transcript,
        Err(err) => {
            eprintln!("{err}");
            return Ok(());
        }
    };

    println!("{}", transcript["text"].as_str().unwrap_or_default());
    if let Some(language) = transcript["language"].as_str() {
        eprintln!("language: {language}");
    }
    if let Some(duration) = transcript["durationInSeconds"].as_f64() {
        eprintln!("duration: {duration:.1}s");
    }
    if let Some(segments) = transcript["segments"].as_array() {
        for segment in segments {
            eprintln!(
                "  [{:>6.2} - {:>6.2}] {}",
                segment["start"].as_f64().unwrap_or_default(),
                segment["end"].as_f64().unwrap_or_default(),
                segment["text"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}
