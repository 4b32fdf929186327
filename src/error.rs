use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Failure of an external command-line tool (rasterizer, recognizer).
///
/// Any of these aborts the current batch; rerunning resumes from the first
/// page without a marker.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {tool}; is it installed and on PATH?")]
    Launch {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}")]
    Failed { tool: &'static str, status: ExitStatus },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: &'static str, timeout: Duration },

    #[error("I/O error while running {tool}")]
    Io {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Launch { tool, .. }
            | Self::Failed { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::Io { tool, .. } => tool,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
