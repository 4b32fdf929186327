mod server;
mod synth;

pub use server::{router, serve, AppState};
pub use synth::{CoquiCli, SynthError, Synthesizer};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "tts_models/en/vctk/vits";

/// Settings for the speech proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub model: String,
    /// Speaker id for multi-speaker models; blank means none.
    pub speaker: String,
    pub host: String,
    pub port: u16,
    pub synthesis_timeout_secs: u64,
    pub program: PathBuf,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            speaker: String::new(),
            host: "127.0.0.1".to_string(),
            port: 5005,
            synthesis_timeout_secs: 120,
            program: PathBuf::from("tts"),
        }
    }
}

impl TtsConfig {
    pub fn speaker(&self) -> Option<String> {
        let speaker = self.speaker.trim();
        (!speaker.is_empty()).then(|| speaker.to_string())
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_speaker_is_none() {
        let mut config = TtsConfig {
            speaker: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.speaker(), None);
        config.speaker = " p225 ".to_string();
        assert_eq!(config.speaker().as_deref(), Some("p225"));
        assert_eq!(config.bind_addr(), "127.0.0.1:5005");
    }
}
