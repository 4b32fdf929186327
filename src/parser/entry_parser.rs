use tracing::debug;

use super::patterns::LinePatterns;
use super::stats::ParseStats;
use crate::data::Entry;

/// One raw line of recognized text and the page it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLine<'a> {
    pub page: u32,
    pub text: &'a str,
}

impl<'a> PageLine<'a> {
    pub fn new(page: u32, text: &'a str) -> Self {
        Self { page, text }
    }
}

/// Split a page's recognized text into tagged lines.
pub fn page_lines(page: u32, text: &str) -> impl Iterator<Item = PageLine<'_>> {
    text.split('\n').map(move |line| PageLine::new(page, line))
}

/// Turns recognized dictionary text into [`Entry`] records.
///
/// Lines are consumed one at a time with at most one entry open. Per line
/// the candidates are tried strongest first: `word [ipa]`, `[word ipa]`,
/// a bare leading word, then an example sentence. Chinese lines feed the
/// open entry's translation, or backfill a headword from the previous
/// English line when nothing is open.
///
/// Parsing never fails. Lines that fit nowhere are dropped and only show up
/// in [`ParseStats`].
#[derive(Debug, Clone, Default)]
pub struct EntryParser {
    patterns: LinePatterns,
}

impl EntryParser {
    pub fn new() -> Self {
        Self {
            patterns: LinePatterns::new(),
        }
    }

    pub fn parse<'a, I>(&self, lines: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = PageLine<'a>>,
    {
        self.parse_with_stats(lines).0
    }

    pub fn parse_with_stats<'a, I>(&self, lines: I) -> (Vec<Entry>, ParseStats)
    where
        I: IntoIterator<Item = PageLine<'a>>,
    {
        let mut state = ParseState::new(&self.patterns);
        for line in lines {
            state.feed(line);
        }
        state.finish()
    }

    /// Parse the whole recognized text of a single page.
    pub fn parse_page(&self, page: u32, text: &str) -> (Vec<Entry>, ParseStats) {
        self.parse_with_stats(page_lines(page, text))
    }
}

/// Mutable state of one parse pass.
struct ParseState<'p> {
    patterns: &'p LinePatterns,
    current: Option<Entry>,
    prev_line: String,
    entries: Vec<Entry>,
    stats: ParseStats,
}

impl<'p> ParseState<'p> {
    fn new(patterns: &'p LinePatterns) -> Self {
        Self {
            patterns,
            current: None,
            prev_line: String::new(),
            entries: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    fn feed(&mut self, line: PageLine<'_>) {
        self.stats.lines_total += 1;
        let text = line.text.trim();
        if text.is_empty() {
            self.stats.blank_lines += 1;
            return;
        }

        if LinePatterns::is_chinese(text) {
            self.chinese_line(line.page, text);
        } else {
            self.latin_line(line.page, text);
            self.prev_line.clear();
            self.prev_line.push_str(text);
        }
    }

    fn latin_line(&mut self, page: u32, text: &str) {
        if let Some((headword, ipa)) = self.patterns.headword_pair(text) {
            self.stats.pair_headwords += 1;
            self.open(Entry::new(page, headword, ipa));
            return;
        }

        if let Some((headword, ipa)) = self.patterns.bracket_block(text) {
            self.stats.bracket_headwords += 1;
            self.open(Entry::new(page, headword, &ipa));
            return;
        }

        // The same word can reappear at the start of a wrapped line.
        if let Some(word) = self.patterns.leading_word(text) {
            let repeated = self
                .current
                .as_ref()
                .is_some_and(|entry| entry.headword == word.to_lowercase());
            if !repeated {
                self.stats.bare_headwords += 1;
                self.open(Entry::new(page, word, ""));
                return;
            }
        }

        match self.current.as_mut() {
            Some(entry) if entry.example_en.is_empty() && LinePatterns::looks_like_sentence(text) => {
                entry.example_en = text.to_string();
                self.stats.examples_captured += 1;
            }
            _ => {
                self.stats.unmatched_latin_lines += 1;
                debug!(page, line = text, "unmatched latin line");
            }
        }
    }

    fn chinese_line(&mut self, page: u32, text: &str) {
        if let Some(entry) = self.current.as_mut() {
            entry.append_translation(text);
            self.stats.translation_lines += 1;
            if !entry.example_en.is_empty() && entry.example_zh.is_empty() {
                entry.example_zh = text.to_string();
                self.stats.example_translations += 1;
            }
            return;
        }

        match self.patterns.backfill(&self.prev_line) {
            Some((headword, ipa)) => {
                let mut entry = Entry::new(page, headword, ipa);
                entry.append_translation(text);
                self.stats.backfilled_headwords += 1;
                self.current = Some(entry);
            }
            None => {
                self.stats.orphan_chinese_lines += 1;
                debug!(page, line = text, "chinese line with no headword to attach to");
            }
        }
    }

    /// Close the open entry, if any, and make `entry` the open one.
    fn open(&mut self, entry: Entry) {
        if let Some(done) = self.current.replace(entry) {
            self.entries.push(done);
        }
    }

    fn finish(mut self) -> (Vec<Entry>, ParseStats) {
        if let Some(done) = self.current.take() {
            self.entries.push(done);
        }
        let before = self.entries.len();
        self.entries.retain(Entry::is_complete);
        self.stats.entries_filtered = before - self.entries.len();
        (self.entries, self.stats)
    }
}
