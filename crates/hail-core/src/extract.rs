//! Best-guess target name extraction from free-text requests.

use std::sync::LazyLock;

use regex::Regex;

/// Phrase patterns tried in order; the first match wins.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bsay\s+hello\s+to\s+(\w+)",
        r"(?i)\bhello\s+to\s+(\w+)",
        r"(?i)\bhi\s+to\s+(\w+)",
        r"(?i)\bgreet\s+(\w+)",
        r"(?i)\bgreeting\s+for\s+(\w+)",
        r"(?i)\bwelcome\s+(?:our\s+guest\s+)?(\w+)",
    ]
    .iter()
    .map(|s| Regex::new(s).unwrap())
    .collect()
});

/// Capitalized words that start requests or name the agents themselves.
const STOPLIST: &[&str] = &[
    "agent", "greeter", "caller", "please", "hello", "hi", "hey", "ask", "say", "get", "call",
    "greet", "welcome", "can", "could", "would", "the", "a", "i",
];

pub trait NameExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<String>;
}

/// Regex phrase matcher with a capitalized-token fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl NameExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        extract_name(text)
    }
}

/// # Examples
///
/// ```
/// use hail_core::extract::extract_name;
///
/// assert_eq!(extract_name("Please greet john").as_deref(), Some("John"));
/// assert_eq!(extract_name("what time is it?"), None);
/// ```
#[must_use]
pub fn extract_name(text: &str) -> Option<String> {
    NAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| capitalize(m.as_str()))
        .or_else(|| capitalized_token(text))
}

fn capitalized_token(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|tok| {
            tok.chars().next().is_some_and(char::is_uppercase)
                && tok.chars().count() > 1
                && !STOPLIST.iter().any(|s| tok.eq_ignore_ascii_case(s))
        })
        .map(str::to_owned)
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
