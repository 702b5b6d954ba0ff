pub mod dataset;
pub mod pacing;
pub mod policy;
pub mod prompts;
pub mod responder;
pub mod rules;
pub mod session_state;

/// Represents commands that the core logic (`ReflectionSession`) issues to the runtime.
///
/// This enum is the primary API for decoupling the session's decision-making
/// from the runtime's execution of side effects (like speaking text).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Command the runtime to speak the given text to the user.
    SpeakText(String),
    /// Command indicating the session is complete, with the closing reply.
    SessionComplete(String),
}
