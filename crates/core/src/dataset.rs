//! The curated reflection questions and the tone guideline handed to the
//! language model on every regular turn.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub category: String,
}

impl Question {
    pub fn new(id: u32, text: &str, category: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            category: category.to_string(),
        }
    }
}

/// Guideline text passed as the response style for every non-closing turn.
pub const RESPONSE_GUIDELINES: &str = "1. Acknowledge emotion only: Mirror the user's emotional tone nicely.\n\
2. Avoid advice or reassurance: Do not try to fix the problem.\n\
3. Brevity: Keep the response under 8 seconds of spoken time.\n\
4. Forbidden: Never ask 'why'.";

/// Response style used once the session has run out of questions.
pub const CLOSING_STYLE: &str = "Neutral, closing tone.";

/// Response style for the reply to the user's first (intro) utterance.
pub const INTRO_STYLE: &str = "Briefly acknowledge enthusiasm or readiness.";

/// Generic follow-ups used when more turns are requested than curated questions exist.
pub const FALLBACK_QUESTIONS: [&str; 2] = ["What else is coming up?", "Can you say more about that?"];

/// Substituted for any candidate that contains a forbidden word.
pub const SAFE_REPLACEMENT: &str = "What led to that feeling?";

/// Last-resort question if selection fails.
pub const DEFAULT_QUESTION: &str = "What else is on your mind?";

/// The five curated questions, in the order they are asked.
pub fn reflection_dataset() -> Vec<Question> {
    vec![
        Question::new(
            0,
            "Tell me more about something that challenged you recently.",
            "challenge",
        ),
        Question::new(
            1,
            "How has your day-to-day life been affected recently?",
            "impact",
        ),
        Question::new(
            2,
            "Is there a moment this week that made you feel a strong emotion?",
            "emotion",
        ),
        Question::new(
            3,
            "If you could look at this situation from a distance, what would you notice?",
            "perspective",
        ),
        Question::new(
            4,
            "What would you like to carry forward from this reflection?",
            "closing",
        ),
    ]
}
