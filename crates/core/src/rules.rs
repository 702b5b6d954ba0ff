use std::collections::BTreeSet;

pub const CLOSING_STATEMENT: &str =
    "Thank you for sharing. I hope this reflection was helpful. Goodbye.";

/// Constant limits and safety words that bound a reflection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    pub max_questions: usize,
    pub forbidden_words: BTreeSet<String>,
    pub closing_statement: String,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            max_questions: 5,
            forbidden_words: BTreeSet::from(["why".to_string()]),
            closing_statement: CLOSING_STATEMENT.to_string(),
        }
    }
}

impl SessionRules {
    // Literal token match: the text is split on whitespace and lower-cased,
    // so "why?" or "(why" are not caught.
    pub fn contains_forbidden(&self, text: &str) -> bool {
        text.to_lowercase()
            .split_whitespace()
            .any(|token| self.forbidden_words.contains(token))
    }
}
