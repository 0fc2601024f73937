//! Provider boundary.
//!
//! Everything that talks to the AI provider lives here: chat/completion/
//! structured inference through the `genai` client behind [`ChatExecutor`],
//! and the binary media capabilities (image, speech, transcription) through
//! a `reqwest` client against an OpenAI-compatible HTTP API behind
//! [`MediaClient`]. Handlers depend on the traits so tests can script the
//! provider.

mod collector;
mod config;
mod convert;
mod error;
mod executor;
mod media;

pub use collector::{CollectedResponse, StreamCollector, StreamOutput, ToolCallRequest};
pub use config::ModelConfig;
pub use convert::{
    assistant_with_tool_calls, build_chat_request, parse_data_url, to_genai_tool,
    tool_response_message,
};
pub use error::ProviderError;
pub use executor::{
    default_chat_options, ChatCompletion, ChatEventStream, ChatExecutor, GenaiChatExecutor,
};
pub use media::{
    GeneratedImage, MediaClient, OpenAiMediaClient, SpeechAudio, Transcription,
    TranscriptionSegment,
};
