use std::collections::HashSet;

use super::entry::Entry;

/// Number of leading translation characters that take part in the key.
pub const KEY_TRANSLATION_CHARS: usize = 40;

/// Composite identity of an entry: page, headword and the first
/// [`KEY_TRANSLATION_CHARS`] characters of the translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub page: u32,
    pub headword: String,
    pub chinese_prefix: String,
}

impl DedupKey {
    pub fn of(entry: &Entry) -> Self {
        Self {
            page: entry.page,
            headword: entry.headword.clone(),
            chinese_prefix: entry.chinese.chars().take(KEY_TRANSLATION_CHARS).collect(),
        }
    }
}

/// Remembers every key it has seen and rejects repeats.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the entry's key was not seen before.
    pub fn admit(&mut self, entry: &Entry) -> bool {
        self.seen.insert(DedupKey::of(entry))
    }
}

/// Drop exact duplicates, keeping the first occurrence and input order.
pub fn dedup(entries: Vec<Entry>) -> Vec<Entry> {
    let mut dedup = Deduplicator::new();
    entries.into_iter().filter(|e| dedup.admit(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(page: u32, headword: &str, chinese: &str, example_en: &str) -> Entry {
        let mut e = Entry::new(page, headword, "");
        e.chinese = chinese.to_string();
        e.example_en = example_en.to_string();
        e
    }

    #[test]
    fn test_keeps_first_occurrence() {
        let entries = vec![
            entry(1, "cat", "貓", "The cat sat down."),
            entry(1, "dog", "狗", ""),
            entry(1, "cat", "貓", "A different example here."),
        ];
        let unique = dedup(entries);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].headword, "cat");
        assert_eq!(unique[0].example_en, "The cat sat down.");
        assert_eq!(unique[1].headword, "dog");
    }

    #[test]
    fn test_page_is_part_of_key() {
        let unique = dedup(vec![entry(1, "cat", "貓", ""), entry(2, "cat", "貓", "")]);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_only_translation_prefix_counts() {
        let base: String = "字".repeat(KEY_TRANSLATION_CHARS);
        let first = entry(4, "word", &format!("{base}甲"), "");
        let second = entry(4, "word", &format!("{base}乙"), "");
        let third = entry(4, "word", &"字".repeat(KEY_TRANSLATION_CHARS - 1), "");

        let unique = dedup(vec![first.clone(), second, third]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0], first);
    }

    #[test]
    fn test_deduplicator_tracks_seen_keys() {
        let mut dedup = Deduplicator::new();
        let e = entry(1, "cat", "貓", "");
        assert!(dedup.admit(&e));
        assert!(!dedup.admit(&e));
        assert!(dedup.admit(&entry(2, "cat", "貓", "")));
    }
}
