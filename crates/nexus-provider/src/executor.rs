use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest, ChatStreamEvent, Usage};
use genai::Client;
use std::pin::Pin;

/// Boxed stream of chat inference events.
pub type ChatEventStream =
    Pin<Box<dyn futures::Stream<Item = Result<ChatStreamEvent, genai::Error>> + Send>>;

/// Result of a non-streaming chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    /// First text content of the response.
    pub text: String,
    /// Token usage reported by the provider.
    pub usage: Option<Usage>,
}

/// Abstraction over the chat inference backend.
///
/// Handlers call this for both non-streaming (`exec_chat`) and streaming
/// (`exec_chat_stream`) inference. The default implementation
/// ([`GenaiChatExecutor`]) delegates to `genai::Client`; tests substitute a
/// scripted mock.
#[async_trait]
pub trait ChatExecutor: Send + Sync {
    /// Run a non-streaming chat completion.
    async fn exec_chat(
        &self,
        model: &str,
        chat_req: ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<ChatCompletion>;

    /// Run a streaming chat completion, returning a boxed event stream.
    async fn exec_chat_stream(
        &self,
        model: &str,
        chat_req: ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<ChatEventStream>;

    /// Stable label for logging.
    fn name(&self) -> &'static str;
}

/// Chat options used by the streaming endpoints: capture usage and tool
/// calls so the `End` event carries the reconciled values.
pub fn default_chat_options() -> ChatOptions {
    ChatOptions::default()
        .with_capture_usage(true)
        .with_capture_tool_calls(true)
}

/// Default executor backed by `genai::Client`.
#[derive(Clone, Default)]
pub struct GenaiChatExecutor {
    client: Client,
}

impl GenaiChatExecutor {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for GenaiChatExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiChatExecutor").finish()
    }
}

#[async_trait]
impl ChatExecutor for GenaiChatExecutor {
    async fn exec_chat(
        &self,
        model: &str,
        chat_req: ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<ChatCompletion> {
        let response = self.client.exec_chat(model, chat_req, options).await?;
        Ok(ChatCompletion {
            text: response.first_text().unwrap_or_default().to_string(),
            usage: Some(response.usage),
        })
    }

    async fn exec_chat_stream(
        &self,
        model: &str,
        chat_req: ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<ChatEventStream> {
        let resp = self
            .client
            .exec_chat_stream(model, chat_req, options)
            .await?;
        Ok(Box::pin(resp.stream))
    }

    fn name(&self) -> &'static str {
        "genai_client"
    }
}
