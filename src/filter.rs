//! Hard-stop keyword filter
//!
//! A literal, case-insensitive substring scan. It is applied to the latest
//! user input before inference and to the raw model output after it.

/// Deny-list used when no custom list is configured
pub const DEFAULT_HARD_STOP_KEYWORDS: &[&str] = &[
    "bomb",
    "explosive",
    "illegal drug",
    "hack government",
    "child exploitation",
];

#[derive(Debug, Clone)]
pub struct HardStopFilter {
    keywords: Vec<String>,
}

impl HardStopFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// First deny-listed keyword contained in `text`, if any
    pub fn matched(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Default for HardStopFilter {
    fn default() -> Self {
        Self::new(DEFAULT_HARD_STOP_KEYWORDS)
    }
}
