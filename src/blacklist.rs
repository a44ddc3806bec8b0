//! Blacklist filtering for titles and alt texts.
//!
//! Case-insensitive substring containment against a configured keyword
//! list. Applied before a title/alt is buffered, and as a maintenance pass
//! over already-persisted sets recorded under an earlier, laxer policy.

/// Reference keyword list: episode/season markers whose titles spoil
/// serialized content.
pub const DEFAULT_BLACKLIST_KEYWORDS: &[&str] = &["tập", "episode", "season"];

#[derive(Debug, Clone)]
pub struct BlacklistFilter {
    // kept lowercased; containment checks lowercase the candidate once
    keywords: Vec<String>,
}

impl BlacklistFilter {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|kw| kw.to_lowercase()).collect(),
        }
    }

    /// Whether the text contains any configured keyword.
    pub fn is_blacklisted(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }
}

impl Default for BlacklistFilter {
    fn default() -> Self {
        let keywords: Vec<String> = DEFAULT_BLACKLIST_KEYWORDS
            .iter()
            .map(|kw| kw.to_string())
            .collect();
        Self::new(&keywords)
    }
}
