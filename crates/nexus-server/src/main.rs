//! Nexus gateway server binary.

use clap::Parser;
use nexus_provider::{GenaiChatExecutor, ModelConfig, OpenAiMediaClient};
use nexus_server::api;
use nexus_server::state::AppState;
use nexus_server::tools::default_registry;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "nexus-server", about = "AI capability gateway")]
struct Args {
    #[arg(long, env = "NEXUS_HTTP_ADDR", default_value = "127.0.0.1:3000")]
    http_addr: String,

    /// OpenAI-compatible base URL for the media endpoints.
    #[arg(
        long,
        env = "NEXUS_OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    openai_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    openai_api_key: String,

    #[arg(long, env = "NEXUS_CHAT_MODEL")]
    chat_model: Option<String>,

    #[arg(long, env = "NEXUS_VISION_MODEL")]
    vision_model: Option<String>,

    #[arg(long, env = "NEXUS_IMAGE_MODEL")]
    image_model: Option<String>,

    #[arg(long, env = "NEXUS_SPEECH_MODEL")]
    speech_model: Option<String>,

    #[arg(long, env = "NEXUS_SPEECH_VOICE")]
    speech_voice: Option<String>,

    #[arg(long, env = "NEXUS_TRANSCRIPTION_MODEL")]
    transcription_model: Option<String>,
}

impl Args {
    fn models(&self) -> ModelConfig {
        let mut models = ModelConfig::default();
        if let Some(m) = &self.chat_model {
            models.chat_model = m.clone();
        }
        if let Some(m) = &self.vision_model {
            models.vision_model = m.clone();
        }
        if let Some(m) = &self.image_model {
            models.image_model = m.clone();
        }
        if let Some(m) = &self.speech_model {
            models.speech_model = m.clone();
        }
        if let Some(v) = &self.speech_voice {
            models.speech_voice = v.clone();
        }
        if let Some(m) = &self.transcription_model {
            models.transcription_model = m.clone();
        }
        models
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if args.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; provider calls will fail");
    }

    let models = args.models();
    info!(chat = %models.chat_model, image = %models.image_model, "starting nexus gateway");

    let executor = Arc::new(GenaiChatExecutor::default());
    let media = Arc::new(OpenAiMediaClient::new(
        args.openai_base_url.clone(),
        args.openai_api_key.clone(),
    ));
    let state = AppState::new(executor, media, models, default_registry());

    let app = api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.http_addr).await?;
    info!("listening on http://{}", args.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
