use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vocab_extract::tts::{serve, AppState, CoquiCli, TtsConfig, DEFAULT_MODEL};

/// Local speech server for the flashcard front-end.
///
/// Point the front-end's TTS endpoint at http://HOST:PORT/speak.
#[derive(Debug, Parser)]
#[command(author, version, about = "HTTP proxy around the Coqui TTS command-line tool")]
struct Args {
    /// Voice model (see `tts --list_models`)
    #[arg(long, env = "COQUI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Speaker id for multi-speaker models, e.g. p225 for vctk
    #[arg(long, env = "COQUI_SPEAKER", default_value = "")]
    speaker: String,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 5005)]
    port: u16,

    /// Seconds allowed for one synthesis
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Path to the `tts` executable
    #[arg(long, default_value = "tts")]
    program: PathBuf,
}

impl From<Args> for TtsConfig {
    fn from(args: Args) -> Self {
        Self {
            model: args.model,
            speaker: args.speaker,
            host: args.host,
            port: args.port,
            synthesis_timeout_secs: args.timeout,
            program: args.program,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = TtsConfig::from(Args::parse());
    info!("Model: {}", config.model);
    if let Some(speaker) = config.speaker() {
        info!("Speaker: {}", speaker);
    }

    let state = AppState::new(Arc::new(CoquiCli::from_config(&config)));
    serve(&config.bind_addr(), state).await
}
