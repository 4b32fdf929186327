use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

use super::TtsConfig;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("text is required")]
    EmptyText,

    #[error("failed to launch speech synthesizer: {0}")]
    Launch(#[source] io::Error),

    #[error("speech synthesizer exited with {0}")]
    Failed(ExitStatus),

    #[error("speech synthesis did not finish within {0:?}")]
    Timeout(Duration),

    #[error("audio file error: {0}")]
    Io(#[from] io::Error),
}

impl SynthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyText => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SynthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Synthesis failed: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Turns text into a WAV file.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Voice model name reported by the health check.
    fn model(&self) -> &str;

    /// Write speech for `text` to `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), SynthError>;
}

/// The Coqui `tts` command-line tool.
#[derive(Debug, Clone)]
pub struct CoquiCli {
    program: PathBuf,
    model: String,
    speaker: Option<String>,
    timeout: Duration,
}

impl CoquiCli {
    pub fn new(model: String) -> Self {
        Self {
            program: PathBuf::from("tts"),
            model,
            speaker: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &TtsConfig) -> Self {
        Self {
            program: config.program.clone(),
            model: config.model.clone(),
            speaker: config.speaker(),
            timeout: config.synthesis_timeout(),
        }
    }

    pub fn with_speaker(mut self, speaker: Option<String>) -> Self {
        self.speaker = speaker;
        self
    }

    fn command(&self, text: &str, out_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--text")
            .arg(text)
            .arg("--model_name")
            .arg(&self.model)
            .arg("--out_path")
            .arg(out_path);
        // Multi-speaker models (e.g. vctk) need one; single-speaker ones reject it.
        if let Some(speaker) = &self.speaker {
            cmd.arg("--speaker_idx").arg(speaker);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Synthesizer for CoquiCli {
    fn model(&self) -> &str {
        &self.model
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), SynthError> {
        debug!("Synthesizing {} chars with {}", text.chars().count(), self.model);
        let output = tokio::time::timeout(self.timeout, self.command(text, out_path).output())
            .await
            .map_err(|_| SynthError::Timeout(self.timeout))?
            .map_err(SynthError::Launch)?;

        if !output.status.success() {
            debug!("tts stderr: {}", String::from_utf8_lossy(&output.stderr));
            return Err(SynthError::Failed(output.status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SynthError::EmptyText.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SynthError::Timeout(Duration::from_secs(1)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_command_includes_speaker_only_when_set() {
        let cli = CoquiCli::new("tts_models/en/vctk/vits".to_string());
        assert_eq!(
            args(&cli.command("hello", Path::new("/tmp/x.wav"))),
            vec!["--text", "hello", "--model_name", "tts_models/en/vctk/vits", "--out_path", "/tmp/x.wav"]
        );

        let cli = cli.with_speaker(Some("p225".to_string()));
        let args = args(&cli.command("hello", Path::new("/tmp/x.wav")));
        assert_eq!(args[args.len() - 2..], ["--speaker_idx", "p225"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let mut cli = CoquiCli::new("m".to_string());
        cli.program = PathBuf::from("definitely-not-an-installed-tts-4711");
        let err = cli.synthesize("hi", Path::new("/tmp/never.wav")).await.unwrap_err();
        assert!(matches!(err, SynthError::Launch(_)));
    }
}
