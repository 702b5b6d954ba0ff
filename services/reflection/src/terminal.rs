//! Terminal runtime: typed lines stand in for transcribed utterances and
//! replies are "spoken" by printing them, then waiting out their playback time.

use reflection_core::Command;
use reflection_core::pacing::{Utterance, playback_estimate};
use std::io::BufRead;
use std::time::Duration;

/// Inputs the session loop receives from the terminal reader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Utterance(String),
    EndSession,
}

pub const END_SESSION_COMMAND: &str = "/end";

/// Parses one typed line. Blank lines produce no input.
pub fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if line.eq_ignore_ascii_case(END_SESSION_COMMAND) {
        Some(Input::EndSession)
    } else {
        Some(Input::Utterance(line.to_string()))
    }
}

/// Spawns a dedicated thread that forwards stdin lines as `Input`s until EOF.
///
/// A plain thread is used so a pending read never holds up runtime shutdown.
pub fn spawn_stdin_reader(input_tx: tokio::sync::mpsc::Sender<Input>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to read from stdin: {}", e);
                    break;
                }
            };
            if let Some(input) = parse_line(&line) {
                if input_tx.blocking_send(input).is_err() {
                    break;
                }
            }
        }
        tracing::debug!("stdin closed");
    })
}

/// Playback pacing applied after each spoken reply.
#[derive(Debug, Clone, Copy)]
pub struct Speaker {
    pacing: bool,
}

impl Speaker {
    pub fn new(pacing: bool) -> Self {
        Self { pacing }
    }

    /// How long to wait after printing `text`.
    pub fn delay_for(&self, text: &str, kind: Utterance) -> Duration {
        if self.pacing {
            playback_estimate(text, kind)
        } else {
            Duration::ZERO
        }
    }

    pub async fn say(&self, text: &str, kind: Utterance) {
        println!("\nAI: {text}\n");
        let delay = self.delay_for(text, kind);
        tracing::debug!("Waiting {:?} for playback", delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Executes a command from the session. Returns `true` once the session is complete.
    pub async fn execute(&self, command: Command) -> bool {
        match command {
            Command::SpeakText(text) => {
                tracing::info!("COMMAND RECEIVED: Speak Text: '{}'", text);
                self.say(&text, Utterance::Turn).await;
                false
            }
            Command::SessionComplete(text) => {
                tracing::info!("COMMAND RECEIVED: Session Complete: '{}'", text);
                self.say(&text, Utterance::Closing).await;
                true
            }
        }
    }
}
