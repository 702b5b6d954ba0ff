//! Prompt templates used to build the chat context for each turn.
//!
//! Built-in text covers every key. A prompts directory may override any of
//! them with a `<key>.md` file; placeholders use `{name}` syntax.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const SYSTEM_KEY: &str = "system";
pub const TURN_KEY: &str = "turn";
pub const CLOSING_KEY: &str = "closing";
pub const INTRO_KEY: &str = "intro";

const DEFAULT_SYSTEM: &str =
    "You are a wise, reflective AI companion. Guidelines: {guidelines}";

const DEFAULT_TURN: &str =
    "User said: '{user_text}'. Validate their feeling briefly, then ask: '{question}'";

const DEFAULT_CLOSING: &str = "User said: '{user_text}'. This is the final response. \
Reflect on the user's answers throughout the session (available in context). \
Provide a gentle, supportive closing summary and one piece of safe, non-clinical advice. \
IMPORTANT: End with a mandatory disclaimer that you are an AI and this is not professional therapy.";

const DEFAULT_INTRO: &str = "Hello, I'm your audio reflection assistant. \
My role is to guide you through a few reflective questions to help you explore your thoughts and feelings. \
I will listen carefully and respond gently. Are you ready to begin?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub system: String,
    pub turn: String,
    pub closing: String,
    pub intro: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            turn: DEFAULT_TURN.to_string(),
            closing: DEFAULT_CLOSING.to_string(),
            intro: DEFAULT_INTRO.to_string(),
        }
    }
}

impl PromptSet {
    /// Starts from the built-in prompts and replaces any key that has a
    /// matching `.md` file in `dir_path`. Other files are ignored.
    pub fn load(dir_path: &Path) -> Result<Self> {
        let mut prompts = Self::default();

        for entry in fs::read_dir(dir_path)
            .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
        {
            let path = entry?.path();

            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }

            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem for prompt file")?;

            let slot = match key {
                SYSTEM_KEY => &mut prompts.system,
                TURN_KEY => &mut prompts.turn,
                CLOSING_KEY => &mut prompts.closing,
                INTRO_KEY => &mut prompts.intro,
                other => {
                    tracing::warn!("Ignoring unknown prompt file: {}.md", other);
                    continue;
                }
            };

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
            *slot = content.trim_end().to_string();
            tracing::debug!("Loaded prompt override '{}'", key);
        }

        Ok(prompts)
    }

    pub fn system_prompt(&self, guidelines: &str) -> String {
        self.system.replace("{guidelines}", guidelines)
    }

    pub fn turn_prompt(&self, user_text: &str, question: &str) -> String {
        self.turn
            .replace("{user_text}", user_text)
            .replace("{question}", question)
    }

    pub fn closing_prompt(&self, user_text: &str) -> String {
        self.closing.replace("{user_text}", user_text)
    }
}
