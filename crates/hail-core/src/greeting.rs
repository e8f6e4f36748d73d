//! Greeting text generation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name used when a request or form carries none.
pub const DEFAULT_NAME: &str = "Friend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreetingStyle {
    Formal,
    #[default]
    Casual,
    Fun,
}

impl GreetingStyle {
    pub const ALL: [Self; 3] = [Self::Formal, Self::Casual, Self::Fun];

    /// Parse a style name, falling back to `Casual` for anything unrecognized.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "formal" => Self::Formal,
            "fun" => Self::Fun,
            _ => Self::Casual,
        }
    }

    /// First style word mentioned in free text, if any.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .find_map(|w| {
                Self::ALL
                    .into_iter()
                    .find(|style| w.eq_ignore_ascii_case(style.as_str()))
            })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Casual => "casual",
            Self::Fun => "fun",
        }
    }
}

impl fmt::Display for GreetingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a styled greeting, appending `message` after a single space when non-empty.
#[must_use]
pub fn resolve(name: &str, style: GreetingStyle, message: Option<&str>) -> String {
    let mut greeting = match style {
        GreetingStyle::Formal => {
            format!("Good day, {name}. It is a pleasure to make your acquaintance.")
        }
        GreetingStyle::Casual => format!("Hi {name}! Great to see you."),
        GreetingStyle::Fun => format!("Hey there, {name}! Ready for an awesome day?"),
    };
    if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
        greeting.push(' ');
        greeting.push_str(message);
    }
    greeting
}

/// The Greeter's plain greeting.
#[must_use]
pub fn greet(name: &str) -> String {
    format!(
        "Hello {name}! This is Agent A (Greeter) responding. I hope you're having a wonderful day!"
    )
}
