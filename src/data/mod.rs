mod dedup;
mod entry;

pub use dedup::{dedup, DedupKey, Deduplicator, KEY_TRANSLATION_CHARS};
pub use entry::{Entry, CSV_COLUMNS};
