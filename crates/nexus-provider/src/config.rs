/// Model ids and voice used by the capability endpoints.
///
/// Every field can be overridden from server flags/env; the defaults match
/// the hosted demo deployment.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Chat, completion, streaming, tools, and structured extraction.
    pub chat_model: String,
    /// Vision-capable model for multi-modal chat.
    pub vision_model: String,
    /// Image synthesis model.
    pub image_model: String,
    /// Speech synthesis model.
    pub speech_model: String,
    /// Voice preset for speech synthesis.
    pub speech_voice: String,
    /// Audio transcription model.
    pub transcription_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4.1-nano".to_string(),
            vision_model: "gpt-4.1-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            speech_model: "tts-1".to_string(),
            speech_voice: "alloy".to_string(),
            transcription_model: "whisper-1".to_string(),
        }
    }
}
