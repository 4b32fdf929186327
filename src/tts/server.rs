use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use super::synth::{SynthError, Synthesizer};

#[derive(Clone)]
pub struct AppState {
    synth: Arc<dyn Synthesizer>,
    scratch_dir: PathBuf,
}

impl AppState {
    pub fn new(synth: Arc<dyn Synthesizer>) -> Self {
        Self {
            synth,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the short-lived WAV files.
    pub fn with_scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/speak", post(speak))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.synth.model().to_string(),
    })
}

async fn speak(
    State(state): State<AppState>,
    Json(request): Json<SpeakRequest>,
) -> Result<Response, SynthError> {
    if request.text.trim().is_empty() {
        return Err(SynthError::EmptyText);
    }

    let wav_path = state.scratch_dir.join(format!("{}.wav", Uuid::new_v4()));
    let synthesized = state.synth.synthesize(&request.text, &wav_path).await;
    let audio = match synthesized {
        Ok(()) => tokio::fs::read(&wav_path).await.map_err(SynthError::from),
        Err(e) => Err(e),
    };
    if let Err(e) = tokio::fs::remove_file(&wav_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {:?}: {}", wav_path, e);
        }
    }
    let audio = audio?;

    info!("Synthesized {} bytes of audio", audio.len());
    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"tts.wav\""),
        ],
        audio,
    )
        .into_response())
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Speech proxy listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .await
        .with_context(|| "Speech proxy server error")?;
    Ok(())
}
