use anyhow::{Context, Result};
use clap::Parser;
use reflection_core::Command;
use reflection_core::pacing::Utterance;
use reflection_core::policy::TurnPolicy;
use reflection_core::prompts::PromptSet;
use reflection_core::responder::OpenAIResponder;
use reflection_core::session_state::ReflectionSession;
use reflection_service::config::Config;
use reflection_service::terminal::{self, END_SESSION_COMMAND, Input, Speaker};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "A short guided reflection session")]
struct Cli {
    /// Directory of `.md` prompt overrides (takes precedence over PROMPTS_DIR)
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    /// Do not wait for estimated playback time after each reply
    #[arg(long)]
    no_pacing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting reflection service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Load Prompts ---
    let prompts = match args.prompts_dir.or(config.prompts_dir) {
        Some(dir) => {
            let prompts = PromptSet::load(&dir).context("Failed to load prompt overrides")?;
            tracing::info!("Loaded prompts from {}", dir.display());
            prompts
        }
        None => PromptSet::default(),
    };

    // --- 5. Initialize API Client ---
    let responder = OpenAIResponder::new(config.openai_api_key, config.chat_model);
    tracing::info!("Using chat model {}", responder.model());

    // --- 6. Session Setup ---
    let (input_tx, mut input_rx) = tokio::sync::mpsc::channel::<Input>(32);
    // Create the command channel to decouple core logic from the runtime.
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(8);

    let speaker = Speaker::new(!args.no_pacing);
    let mut session = ReflectionSession::new(TurnPolicy::default(), prompts);

    // The reader thread is detached; it ends with the process.
    let _reader = terminal::spawn_stdin_reader(input_tx);

    // Each turn runs to completion, including playback, before the next input is taken.
    let session_loop = async move {
        if let Command::SpeakText(intro) = session.begin() {
            speaker.say(&intro, Utterance::Intro).await;
        }
        println!("(Type your answers. Enter {END_SESSION_COMMAND} to stop.)");

        while let Some(input) = input_rx.recv().await {
            match input {
                Input::EndSession => {
                    session.end();
                    println!("Session ended.");
                    break;
                }
                Input::Utterance(text) => {
                    let handled = session
                        .handle_utterance(&responder, &text, command_tx.clone())
                        .await?;
                    if !handled {
                        continue;
                    }
                    let (current, max) = session.progress();
                    tracing::debug!("Question {} of {}", current, max);

                    let Some(command) = command_rx.recv().await else {
                        break;
                    };
                    if speaker.execute(command).await {
                        break;
                    }
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    };

    tokio::select! {
        result = session_loop => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }
    tracing::info!("Shutting down...");
    Ok(())
}
