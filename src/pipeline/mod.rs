mod fulltext;
mod orchestrator;
mod storage;

pub use fulltext::{FulltextExporter, FulltextReport};
pub use orchestrator::{BatchOrchestrator, BatchReport};
pub use storage::{CsvStore, PageMarkers, PageRecord};
