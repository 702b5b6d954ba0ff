//! Turn-sequencing policy.
//!
//! Given how many questions have already been asked, decide which prompt to
//! ask next, which tone guideline to hand the language model, and whether the
//! session should close. The policy holds no session state of its own.

use crate::dataset::{
    CLOSING_STYLE, DEFAULT_QUESTION, FALLBACK_QUESTIONS, Question, RESPONSE_GUIDELINES,
    SAFE_REPLACEMENT, reflection_dataset,
};
use crate::rules::SessionRules;
use rand::Rng;
use rand::seq::SliceRandom;

/// The outcome of consulting the policy for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDecision {
    pub next_question: Option<String>,
    pub response_style: String,
    pub should_close: bool,
}

impl TurnDecision {
    fn closing() -> Self {
        Self {
            next_question: None,
            response_style: CLOSING_STYLE.to_string(),
            should_close: true,
        }
    }
}

/// Decides the next move for a session that has asked `question_count` questions.
///
/// Counts past the end of `dataset` (but still under `rules.max_questions`)
/// draw a generic follow-up from [`FALLBACK_QUESTIONS`] using `rng`.
pub fn decide<R: Rng + ?Sized>(
    question_count: usize,
    dataset: &[Question],
    rules: &SessionRules,
    rng: &mut R,
) -> TurnDecision {
    if question_count >= rules.max_questions {
        tracing::debug!(question_count, "question budget exhausted, closing");
        return TurnDecision::closing();
    }

    let mut selected = match dataset.get(question_count) {
        Some(question) => question.text.clone(),
        None => FALLBACK_QUESTIONS
            .choose(rng)
            .map(|q| q.to_string())
            .unwrap_or_else(|| DEFAULT_QUESTION.to_string()),
    };

    if rules.contains_forbidden(&selected) {
        tracing::warn!(question = %selected, "candidate contains a forbidden word, substituting");
        selected = SAFE_REPLACEMENT.to_string();
    }

    TurnDecision {
        next_question: Some(selected),
        response_style: RESPONSE_GUIDELINES.to_string(),
        should_close: false,
    }
}

/// Bundles a dataset and rules so the orchestrator can consult the policy by count alone.
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    pub dataset: Vec<Question>,
    pub rules: SessionRules,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::new(reflection_dataset(), SessionRules::default())
    }
}

impl TurnPolicy {
    pub fn new(dataset: Vec<Question>, rules: SessionRules) -> Self {
        Self { dataset, rules }
    }

    pub fn decide(&self, question_count: usize) -> TurnDecision {
        self.decide_with_rng(question_count, &mut rand::thread_rng())
    }

    pub fn decide_with_rng<R: Rng + ?Sized>(&self, question_count: usize, rng: &mut R) -> TurnDecision {
        decide(question_count, &self.dataset, &self.rules, rng)
    }

    pub fn max_questions(&self) -> usize {
        self.rules.max_questions
    }
}
