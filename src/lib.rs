// Library exports for the CLI binaries

pub mod config;
pub mod data;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod tts;
pub mod utils;

// Re-export commonly used types
pub use config::{ExtractConfig, PageRange};
pub use data::{Deduplicator, Entry};
pub use error::ToolError;
pub use parser::{EntryParser, ParseStats};
pub use pipeline::{BatchOrchestrator, BatchReport};
pub use utils::PageSource;
