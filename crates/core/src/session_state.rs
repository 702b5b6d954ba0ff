use crate::{
    Command,
    dataset::INTRO_STYLE,
    policy::{TurnDecision, TurnPolicy},
    prompts::PromptSet,
    responder::{ChatMessage, Responder, Role},
};
use anyhow::{Context, Result};
use std::fmt;

/// Number of most recent history messages sent along with each prompt.
pub const HISTORY_WINDOW: usize = 4;

/// Spoken in place of a reply when the language model cannot be reached.
pub const CONNECTION_FALLBACK: &str = "I'm having trouble connecting. Let's pause.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionState {
    Landing,
    Intro,
    /// Waiting for the answer to question `n` (1-based).
    Question(usize),
    Close,
}

impl fmt::Display for ReflectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionState::Landing => write!(f, "Landing"),
            ReflectionState::Intro => write!(f, "Intro"),
            ReflectionState::Question(n) => write!(f, "Q{n}"),
            ReflectionState::Close => write!(f, "Close"),
        }
    }
}

/// The context of one reflection session, passed by `&mut` from turn to turn.
pub struct ReflectionSession {
    pub state: ReflectionState,
    pub question_count: usize,
    pub messages: Vec<ChatMessage>,
    policy: TurnPolicy,
    prompts: PromptSet,
}

impl ReflectionSession {
    pub fn new(policy: TurnPolicy, prompts: PromptSet) -> Self {
        Self {
            state: ReflectionState::Landing,
            question_count: 0,
            messages: vec![],
            policy,
            prompts,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ReflectionState::Landing | ReflectionState::Close)
    }

    /// Starts a fresh session and returns the intro greeting to speak.
    pub fn begin(&mut self) -> Command {
        self.question_count = 0;
        self.messages.clear();
        self.state = ReflectionState::Intro;

        let intro = self.prompts.intro.clone();
        self.messages.push(ChatMessage::assistant(intro.clone()));
        tracing::info!("Reflection session started");
        Command::SpeakText(intro)
    }

    /// Abandons the session and returns to the landing state.
    pub fn end(&mut self) {
        tracing::info!(
            "Session ended at {} after {} questions",
            self.state,
            self.question_count
        );
        self.state = ReflectionState::Landing;
        self.messages.clear();
    }

    /// Current question number for display, capped at the session maximum.
    pub fn progress(&self) -> (usize, usize) {
        let max = self.policy.max_questions();
        ((self.question_count + 1).min(max), max)
    }

    fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    fn next_decision(&self) -> TurnDecision {
        if self.state == ReflectionState::Intro {
            // The first answer only signals readiness; ask the opening question.
            let mut decision = self.policy.decide(0);
            if !decision.should_close {
                decision.response_style = INTRO_STYLE.to_string();
            }
            decision
        } else {
            self.policy.decide(self.question_count)
        }
    }

    fn build_context(&self, user_text: &str, decision: &TurnDecision) -> Vec<ChatMessage> {
        let mut context = vec![ChatMessage::system(
            self.prompts.system_prompt(&decision.response_style),
        )];

        let start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        context.extend_from_slice(&self.messages[start..]);

        let prompt = match (&decision.next_question, decision.should_close) {
            (Some(question), false) => self.prompts.turn_prompt(user_text, question),
            _ => self.prompts.closing_prompt(user_text),
        };
        context.push(ChatMessage::user(prompt));
        context
    }

    /// Processes one user utterance.
    ///
    /// Returns `Ok(false)` when the utterance is ignored: the session is not
    /// active, the text is blank, or it repeats the previous user message.
    /// Otherwise the reply is sent to the runtime as a `SpeakText`, or as
    /// `SessionComplete` once the question budget is spent.
    pub async fn handle_utterance<R: Responder + ?Sized>(
        &mut self,
        responder: &R,
        user_text: &str,
        command_tx: tokio::sync::mpsc::Sender<Command>,
    ) -> Result<bool> {
        if !self.is_active() {
            tracing::debug!("Ignoring utterance while in {} state", self.state);
            return Ok(false);
        }

        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Ok(false);
        }
        if self.last_user_message() == Some(user_text) {
            tracing::debug!("Ignoring repeated utterance");
            return Ok(false);
        }

        self.messages.push(ChatMessage::user(user_text));

        let decision = self.next_decision();
        tracing::info!(
            state = %self.state,
            question_count = self.question_count,
            should_close = decision.should_close,
            "Turn decided"
        );

        let context = self.build_context(user_text, &decision);
        let reply = match responder.respond(&context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("LLM error: {:?}", e);
                CONNECTION_FALLBACK.to_string()
            }
        };
        self.messages.push(ChatMessage::assistant(reply.clone()));

        if decision.should_close {
            self.state = ReflectionState::Close;
            command_tx
                .send(Command::SessionComplete(reply))
                .await
                .context("Failed to send SessionComplete command")?;
        } else {
            self.question_count += 1;
            self.state = ReflectionState::Question(self.question_count);
            command_tx
                .send(Command::SpeakText(reply))
                .await
                .context("Failed to send SpeakText command")?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RESPONSE_GUIDELINES, reflection_dataset};
    use crate::responder::MockResponder;
    use crate::rules::SessionRules;

    fn new_session() -> ReflectionSession {
        ReflectionSession::new(TurnPolicy::default(), PromptSet::default())
    }

    #[tokio::test]
    async fn test_intro_answer_asks_first_question() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .withf(|messages| {
                messages[0].content.contains(INTRO_STYLE)
                    && messages
                        .last()
                        .map(|m| m.content.contains("challenged you recently"))
                        .unwrap_or(false)
            })
            .returning(|_| Ok("Glad you're here. What challenged you recently?".to_string()))
            .once();

        let mut session = new_session();
        let intro = session.begin();
        assert!(matches!(intro, Command::SpeakText(ref text) if text.starts_with("Hello")));
        assert_eq!(session.state, ReflectionState::Intro);

        let (command_tx, mut command_rx) = tokio::sync::mpsc::channel(1);
        let handled = session
            .handle_utterance(&mock_responder, "Yes, I'm ready.", command_tx)
            .await
            .unwrap();

        assert!(handled);
        assert_eq!(session.state, ReflectionState::Question(1));
        assert_eq!(session.question_count, 1);
        assert_eq!(
            command_rx.try_recv().expect("A command should have been sent"),
            Command::SpeakText("Glad you're here. What challenged you recently?".to_string())
        );
        // Intro, user answer, assistant reply.
        assert_eq!(session.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_full_session_closes_after_budget() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .returning(|messages| Ok(format!("reply {}", messages.len())));

        let mut session = new_session();
        session.begin();
        let (command_tx, mut command_rx) = tokio::sync::mpsc::channel(16);

        // Intro answer plus four answers walk through questions 1..=5.
        for i in 0..5 {
            session
                .handle_utterance(&mock_responder, &format!("answer {i}"), command_tx.clone())
                .await
                .unwrap();
            assert!(matches!(command_rx.try_recv().unwrap(), Command::SpeakText(_)));
        }
        assert_eq!(session.state, ReflectionState::Question(5));
        assert_eq!(session.progress(), (5, 5));

        session
            .handle_utterance(&mock_responder, "final answer", command_tx.clone())
            .await
            .unwrap();
        assert_eq!(session.state, ReflectionState::Close);
        assert!(matches!(command_rx.try_recv().unwrap(), Command::SessionComplete(_)));
        assert!(!session.is_active());

        // Closed sessions ignore further input.
        let handled = session
            .handle_utterance(&mock_responder, "anything else", command_tx)
            .await
            .unwrap();
        assert!(!handled);
        assert!(command_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_regular_turn_uses_guidelines_and_bounded_history() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .withf(|messages| !messages[messages.len() - 1].content.contains("'fourth'"))
            .returning(|_| Ok("noted".to_string()))
            .times(3);
        mock_responder
            .expect_respond()
            .withf(|messages| {
                // System, HISTORY_WINDOW history entries, composed prompt.
                messages.len() == HISTORY_WINDOW + 2
                    && messages[0].role == Role::System
                    && messages[0].content.contains(RESPONSE_GUIDELINES)
                    && messages[messages.len() - 1].content
                        == "User said: 'fourth'. Validate their feeling briefly, then ask: \
                            'If you could look at this situation from a distance, what would you notice?'"
            })
            .returning(|_| Ok("ok".to_string()))
            .once();

        let mut session = new_session();
        session.begin();
        let (command_tx, _command_rx) = tokio::sync::mpsc::channel(8);
        for text in ["ready", "second", "third", "fourth"] {
            session
                .handle_utterance(&mock_responder, text, command_tx.clone())
                .await
                .unwrap();
        }
        assert_eq!(session.question_count, 4);
    }

    #[tokio::test]
    async fn test_repeated_and_blank_utterances_are_ignored() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .returning(|_| Ok("heard you".to_string()))
            .once();

        let mut session = new_session();
        session.begin();
        let (command_tx, _command_rx) = tokio::sync::mpsc::channel(4);

        assert!(
            session
                .handle_utterance(&mock_responder, "I'm ready", command_tx.clone())
                .await
                .unwrap()
        );
        assert!(
            !session
                .handle_utterance(&mock_responder, "  I'm ready ", command_tx.clone())
                .await
                .unwrap()
        );
        assert!(
            !session
                .handle_utterance(&mock_responder, "   ", command_tx)
                .await
                .unwrap()
        );
        assert_eq!(session.question_count, 1);
    }

    #[tokio::test]
    async fn test_responder_failure_uses_fallback_reply() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let mut session = new_session();
        session.begin();
        let (command_tx, mut command_rx) = tokio::sync::mpsc::channel(1);
        session
            .handle_utterance(&mock_responder, "ready", command_tx)
            .await
            .unwrap();

        assert_eq!(
            command_rx.try_recv().unwrap(),
            Command::SpeakText(CONNECTION_FALLBACK.to_string())
        );
        // The session still advances.
        assert_eq!(session.state, ReflectionState::Question(1));
    }

    #[tokio::test]
    async fn test_landing_session_ignores_input() {
        let mock_responder = MockResponder::new();
        let mut session = new_session();
        let (command_tx, _command_rx) = tokio::sync::mpsc::channel(1);
        let handled = session
            .handle_utterance(&mock_responder, "hello", command_tx)
            .await
            .unwrap();
        assert!(!handled);
        assert_eq!(session.state, ReflectionState::Landing);
    }

    #[tokio::test]
    async fn test_end_resets_to_landing() {
        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .returning(|_| Ok("fine".to_string()));

        let mut session = new_session();
        session.begin();
        let (command_tx, _command_rx) = tokio::sync::mpsc::channel(1);
        session
            .handle_utterance(&mock_responder, "ready", command_tx)
            .await
            .unwrap();

        session.end();
        assert_eq!(session.state, ReflectionState::Landing);
        assert!(session.messages.is_empty());

        // A new session starts from scratch.
        session.begin();
        assert_eq!(session.question_count, 0);
        assert_eq!(session.progress(), (1, 5));
    }

    #[tokio::test]
    async fn test_short_budget_closes_with_closing_prompt() {
        let rules = SessionRules {
            max_questions: 1,
            ..SessionRules::default()
        };
        let policy = TurnPolicy::new(reflection_dataset(), rules);
        let mut session = ReflectionSession::new(policy, PromptSet::default());

        let mut mock_responder = MockResponder::new();
        mock_responder
            .expect_respond()
            .withf(|messages| !messages[0].content.contains("Neutral, closing tone."))
            .returning(|_| Ok("first".to_string()))
            .once();
        mock_responder
            .expect_respond()
            .withf(|messages| {
                messages[0].content.contains("Neutral, closing tone.")
                    && messages[messages.len() - 1]
                        .content
                        .contains("This is the final response.")
            })
            .returning(|_| Ok("Take care.".to_string()))
            .once();

        session.begin();
        let (command_tx, mut command_rx) = tokio::sync::mpsc::channel(2);
        session
            .handle_utterance(&mock_responder, "ready", command_tx.clone())
            .await
            .unwrap();
        session
            .handle_utterance(&mock_responder, "done", command_tx)
            .await
            .unwrap();

        assert!(matches!(command_rx.try_recv().unwrap(), Command::SpeakText(_)));
        assert_eq!(
            command_rx.try_recv().unwrap(),
            Command::SessionComplete("Take care.".to_string())
        );
        assert_eq!(session.state, ReflectionState::Close);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(ReflectionState::Question(3).to_string(), "Q3");
        assert_eq!(ReflectionState::Close.to_string(), "Close");
    }
}
