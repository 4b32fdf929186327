mod entry_parser;
mod patterns;
mod stats;

pub use entry_parser::{page_lines, EntryParser, PageLine};
pub use patterns::LinePatterns;
pub use stats::ParseStats;
