use regex::Regex;

/// Line-level patterns used to recognize dictionary structure in OCR text.
///
/// Compiled once per parser; matching never mutates them.
#[derive(Debug, Clone)]
pub struct LinePatterns {
    /// `word [annotation]`
    pair: Regex,
    /// `[word annotation]`, for when OCR loses the word outside the brackets
    bracket: Regex,
    /// a word at the very start of the line
    leading_word: Regex,
    /// a word anywhere in the line
    any_word: Regex,
}

impl Default for LinePatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePatterns {
    pub fn new() -> Self {
        Self {
            pair: Regex::new(r"([A-Za-z][A-Za-z\-']{0,20})\s*\[([^\]]{1,30})\]")
                .expect("pair pattern is valid"),
            bracket: Regex::new(r"\[([A-Za-z][^\]]{1,40})\]").expect("bracket pattern is valid"),
            leading_word: Regex::new(r"^([A-Za-z][A-Za-z\-']{1,20})\b")
                .expect("leading word pattern is valid"),
            any_word: Regex::new(r"\b([A-Za-z][A-Za-z\-']{1,20})\b")
                .expect("word pattern is valid"),
        }
    }

    /// True if the line carries at least one CJK Unified Ideograph.
    pub fn is_chinese(line: &str) -> bool {
        line.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
    }

    /// `apple [ˈæpəl]` → `("apple", "ˈæpəl")`. The annotation is trimmed.
    pub fn headword_pair<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.pair.captures(line)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str().trim()))
    }

    /// `[banana bəˈnænə]` → `("banana", "bəˈnænə")`.
    ///
    /// The annotation is the remaining tokens re-joined with single spaces.
    pub fn bracket_block<'a>(&self, line: &'a str) -> Option<(&'a str, String)> {
        let caps = self.bracket.captures(line)?;
        let mut tokens = caps.get(1)?.as_str().split_whitespace();
        let headword = tokens.next()?;
        let ipa = tokens.collect::<Vec<_>>().join(" ");
        Some((headword, ipa))
    }

    pub fn leading_word<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.leading_word
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn first_word<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.any_word
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Best headword guess from a previous English line: a pair if there is
    /// one, otherwise the first word with an empty annotation.
    pub fn backfill<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        self.headword_pair(line)
            .or_else(|| self.first_word(line).map(|word| (word, "")))
    }

    /// Sentence punctuation somewhere in the line and more than three words.
    pub fn looks_like_sentence(line: &str) -> bool {
        line.contains(['.', '!', '?']) && line.split_whitespace().count() > 3
    }
}
