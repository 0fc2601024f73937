//! Nexus terminal client.
//!
//! Each subcommand is one capability page of the demo, driven over HTTP
//! against a running `nexus-server`.

mod capture;
mod client;
mod commands;

use clap::{Parser, Subcommand};
use client::GatewayClient;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "nexus",
    about = "Terminal client for the Nexus AI gateway",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true
)]
struct Cli {
    /// Gateway base URL.
    #[arg(
        long,
        global = true,
        env = "NEXUS_SERVER",
        default_value = "http://localhost:3000"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive chat.
    Chat,
    /// Interactive chat with tool calling (weather).
    Tools,
    /// One-shot completion for a prompt.
    Complete {
        /// Prompt text.
        prompt: Vec<String>,
    },
    /// Streamed completion for a prompt.
    Stream {
        /// Prompt text.
        prompt: Vec<String>,
    },
    /// Stream a structured recipe for a dish.
    Recipe {
        /// Dish name.
        dish: String,
    },
    /// Stream a structured list of pokémon for a type.
    Pokemon {
        /// Pokémon type (fire, water, ...).
        kind: String,
    },
    /// Generate an image for a prompt.
    Image {
        /// Prompt text.
        prompt: Vec<String>,
        /// Output file.
        #[arg(long, default_value = "nexus-image.png")]
        out: PathBuf,
    },
    /// Synthesize speech for a text.
    Speech {
        /// Text to read.
        text: Vec<String>,
        /// Output file.
        #[arg(long, default_value = "nexus-speech.mp3")]
        out: PathBuf,
    },
    /// Transcribe an audio file, or bytes piped to stdin with --record.
    Transcribe {
        /// Audio file to transcribe.
        file: Option<PathBuf>,
        /// Capture audio bytes from stdin (capped at 10 seconds).
        #[arg(long)]
        record: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = GatewayClient::new(cli.server.clone());

    match cli.command {
        Commands::Chat => commands::chat(&client, false).await,
        Commands::Tools => commands::chat(&client, true).await,
        Commands::Complete { prompt } => commands::complete(&client, &prompt.join(" ")).await,
        Commands::Stream { prompt } => commands::stream(&client, &prompt.join(" ")).await,
        Commands::Recipe { dish } => {
            let payload = serde_json::json!({ "dish": dish.trim() });
            commands::structured(&client, "/api/structured-data", payload, &dish).await
        }
        Commands::Pokemon { kind } => {
            let payload = serde_json::json!({ "type": kind.trim() });
            commands::structured(&client, "/api/structured-array", payload, &kind).await
        }
        Commands::Image { prompt, out } => {
            commands::image(&client, &prompt.join(" "), &out).await
        }
        Commands::Speech { text, out } => commands::speech(&client, &text.join(" "), &out).await,
        Commands::Transcribe { file, record } => {
            commands::transcribe(&client, file, record).await
        }
    }
}
