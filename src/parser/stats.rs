use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Counters describing what a parse pass did with its input lines.
///
/// Nothing here changes parser output; it only reports lines that were
/// attached, dropped or left unattached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub lines_total: usize,
    pub blank_lines: usize,
    pub pair_headwords: usize,
    pub bracket_headwords: usize,
    pub bare_headwords: usize,
    pub backfilled_headwords: usize,
    pub translation_lines: usize,
    pub examples_captured: usize,
    pub example_translations: usize,
    pub unmatched_latin_lines: usize,
    /// Chinese lines with no open entry and nothing to backfill from.
    pub orphan_chinese_lines: usize,
    /// Entries removed by the final quality filter.
    pub entries_filtered: usize,
}

impl ParseStats {
    pub fn headwords_opened(&self) -> usize {
        self.pair_headwords + self.bracket_headwords + self.bare_headwords + self.backfilled_headwords
    }

    /// Lines that contributed nothing to any emitted entry.
    pub fn dropped_lines(&self) -> usize {
        self.unmatched_latin_lines + self.orphan_chinese_lines
    }
}

impl AddAssign for ParseStats {
    fn add_assign(&mut self, other: Self) {
        self.lines_total += other.lines_total;
        self.blank_lines += other.blank_lines;
        self.pair_headwords += other.pair_headwords;
        self.bracket_headwords += other.bracket_headwords;
        self.bare_headwords += other.bare_headwords;
        self.backfilled_headwords += other.backfilled_headwords;
        self.translation_lines += other.translation_lines;
        self.examples_captured += other.examples_captured;
        self.example_translations += other.example_translations;
        self.unmatched_latin_lines += other.unmatched_latin_lines;
        self.orphan_chinese_lines += other.orphan_chinese_lines;
        self.entries_filtered += other.entries_filtered;
    }
}

impl fmt::Display for ParseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} headwords ({} pair, {} bracket, {} bare, {} backfilled), \
             {} examples, {} unmatched latin, {} orphan chinese, {} entries filtered",
            self.lines_total,
            self.headwords_opened(),
            self.pair_headwords,
            self.bracket_headwords,
            self.bare_headwords,
            self.backfilled_headwords,
            self.examples_captured,
            self.unmatched_latin_lines,
            self.orphan_chinese_lines,
            self.entries_filtered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_sums_counters() {
        let mut total = ParseStats::default();
        total += ParseStats {
            lines_total: 10,
            pair_headwords: 2,
            orphan_chinese_lines: 1,
            ..Default::default()
        };
        total += ParseStats {
            lines_total: 5,
            bare_headwords: 1,
            unmatched_latin_lines: 3,
            ..Default::default()
        };
        assert_eq!(total.lines_total, 15);
        assert_eq!(total.headwords_opened(), 3);
        assert_eq!(total.dropped_lines(), 4);
    }
}
