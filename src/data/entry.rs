use serde::{Deserialize, Serialize};

/// Column order of the persisted table.
pub const CSV_COLUMNS: [&str; 6] = ["page", "headword", "ipa", "chinese", "example_en", "example_zh"];

/// One dictionary record recovered from recognized text.
///
/// Field order matches [`CSV_COLUMNS`]; the CSV writer serializes in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub page: u32,
    pub headword: String,
    pub ipa: String,
    pub chinese: String,
    pub example_en: String,
    pub example_zh: String,
}

impl Entry {
    /// Open a new entry. The headword is stored lowercased and the
    /// pronunciation trimmed.
    pub fn new(page: u32, headword: &str, ipa: &str) -> Self {
        Self {
            page,
            headword: headword.to_lowercase(),
            ipa: ipa.trim().to_string(),
            chinese: String::new(),
            example_en: String::new(),
            example_zh: String::new(),
        }
    }

    /// Append one line of translation, space-joined with what is already there.
    pub fn append_translation(&mut self, line: &str) {
        if !self.chinese.is_empty() {
            self.chinese.push(' ');
        }
        self.chinese.push_str(line);
    }

    /// Whether the entry is worth emitting: a headword of at least two
    /// characters and some translation.
    pub fn is_complete(&self) -> bool {
        self.headword.chars().count() >= 2 && !self.chinese.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_fields() {
        let entry = Entry::new(3, "Apple", "  ˈæpəl ");
        assert_eq!(entry.headword, "apple");
        assert_eq!(entry.ipa, "ˈæpəl");
        assert!(entry.chinese.is_empty());
        assert!(!entry.is_complete());
    }

    #[test]
    fn test_append_translation_joins_with_space() {
        let mut entry = Entry::new(1, "bank", "");
        entry.append_translation("銀行");
        entry.append_translation("河岸");
        assert_eq!(entry.chinese, "銀行 河岸");
        assert!(entry.is_complete());
    }

    #[test]
    fn test_single_letter_headword_is_incomplete() {
        let mut entry = Entry::new(1, "a", "");
        entry.append_translation("一個");
        assert!(!entry.is_complete());
    }
}
