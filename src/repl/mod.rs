//! Interactive terminal session
//!
//! Read-eval-print loop over the chat engine: rustyline input, streamed
//! output with a librarian status spinner, and a small built-in command
//! set. Ctrl-C during streaming cancels the in-flight send; at the prompt
//! it is ignored.

use crate::config::Config;
use crate::engine::{CancelToken, ChatEngine, EngineConfig, EnginePhase, StreamSink};
use crate::errors::Result;
use crate::librarian::{FileTreeStore, HttpTransport, Librarian};
use crate::prompt::{self, ModelKind};
use crate::session::GeminiSession;
use crate::tools::{CapabilityExecutor, CapabilityRegistry};
use crate::types::ChatMessage;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::sync::Arc;

/// Prompt shown at the input line
const PROMPT: &str = "architect> ";

/// Streams engine output to the terminal
struct TerminalSink {
    spinner: Option<ProgressBar>,
}

impl TerminalSink {
    fn new() -> Self {
        Self { spinner: None }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl StreamSink for TerminalSink {
    fn on_delta(&mut self, delta: &str) {
        self.clear_spinner();
        print!("{}", delta);
        let _ = std::io::stdout().flush();
    }

    fn on_tool_status(&mut self, status: Option<&str>) {
        match status {
            Some(text) => {
                let spinner = self.spinner.get_or_insert_with(|| {
                    let pb = ProgressBar::new_spinner();
                    pb.set_style(
                        ProgressStyle::default_spinner()
                            .template("{spinner:.cyan} {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                    );
                    pb.enable_steady_tick(std::time::Duration::from_millis(100));
                    pb
                });
                spinner.set_message(text.to_string());
            }
            None => self.clear_spinner(),
        }
    }
}

/// Interactive chat session
pub struct ChatRepl {
    editor: DefaultEditor,
    engine: ChatEngine,
    registry: CapabilityRegistry,
    transcript: Vec<ChatMessage>,
    api_key: String,
    model: ModelKind,
    desanitized: bool,
    verbose: bool,
    /// Configuration the current session was built with
    session_stamp: (ModelKind, bool),
}

impl ChatRepl {
    /// Build the full stack: transport, cache, librarian, engine, session
    pub fn new(
        api_key: String,
        model: ModelKind,
        desanitized: bool,
        verbose: bool,
    ) -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| crate::errors::ArchitectError::Generic(e.to_string()))?;

        let transport = Arc::new(HttpTransport::new()?);
        let cache_dir = Config::cache_dir()?;
        let librarian = Librarian::new(transport, Box::new(FileTreeStore::new(cache_dir)))
            .with_verbose(verbose);
        let executor = CapabilityExecutor::new(librarian).with_verbose(verbose);

        let registry = CapabilityRegistry::new();
        let session = Self::build_session(&api_key, model, desanitized, &registry, &[])?;

        let engine = ChatEngine::new(Box::new(session), executor).with_config(EngineConfig {
            verbose,
            ..Default::default()
        });

        Ok(Self {
            editor,
            engine,
            registry,
            transcript: Vec::new(),
            api_key,
            model,
            desanitized,
            verbose,
            session_stamp: (model, desanitized),
        })
    }

    fn build_session(
        api_key: &str,
        model: ModelKind,
        desanitized: bool,
        registry: &CapabilityRegistry,
        history: &[ChatMessage],
    ) -> Result<GeminiSession> {
        GeminiSession::new(
            api_key,
            model.id(),
            prompt::system_instruction(model.id(), desanitized),
            registry.declarations(),
            history,
        )
    }

    /// Recreate the session when model or safety mode changed since the
    /// last send. Recreation only happens between sends.
    fn refresh_session_if_needed(&mut self) -> Result<()> {
        let desired = (self.model, self.desanitized);
        if desired == self.session_stamp {
            return Ok(());
        }

        let session = Self::build_session(
            &self.api_key,
            self.model,
            self.desanitized,
            &self.registry,
            &self.transcript,
        )?;
        self.engine.replace_session(Box::new(session));
        self.session_stamp = desired;

        if self.verbose {
            eprintln!(
                "[ENGINE] Session recreated: model={}, desanitized={}",
                self.model.label(),
                self.desanitized
            );
        }
        Ok(())
    }

    /// Show welcome banner
    pub fn show_welcome(&self) {
        println!("{}", prompt::WELCOME_MESSAGE_TEXT.cyan());
        println!(
            "{}",
            format!(
                "\nModel: {} | Environment: {} | /help for commands\n",
                self.model.label(),
                if self.desanitized {
                    "DESANITIZED"
                } else {
                    "SANITIZED"
                }
            )
            .dimmed()
        );
    }

    /// Run the interactive loop until /exit or EOF
    pub async fn run(&mut self) -> Result<()> {
        self.show_welcome();

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let input = line.trim().to_string();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&input);

                    if input.starts_with('/') {
                        if !self.handle_command(&input) {
                            break;
                        }
                        continue;
                    }

                    self.send(&input).await?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("{}", format!("Input error: {}", e).red());
                    break;
                }
            }
        }

        println!("{}", "Mission Architect signing off.".dimmed());
        Ok(())
    }

    /// Handle a slash command; returns false to exit
    fn handle_command(&mut self, input: &str) -> bool {
        let mut parts = input.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let argument = parts.next().unwrap_or("").trim();

        match command {
            "/exit" | "/quit" => return false,
            "/help" => {
                println!("Commands:");
                println!("  /model <flash|pro>   switch model tier");
                println!("  /safe <on|off>       toggle sanitized environment mode");
                println!("  /clear               forget the conversation");
                println!("  /exit                leave");
            }
            "/model" => match ModelKind::parse(argument) {
                Some(model) => {
                    self.model = model;
                    println!("Model set to {}.", model.label());
                }
                None => println!("Unknown model '{}'. Use flash or pro.", argument),
            },
            "/safe" => match argument {
                "on" => {
                    self.desanitized = false;
                    println!("Environment: SANITIZED (LOCKED).");
                }
                "off" => {
                    self.desanitized = true;
                    println!("Environment: DESANITIZED (UNSAFE).");
                }
                _ => println!("Usage: /safe <on|off>"),
            },
            "/clear" => {
                self.transcript.clear();
                // Force a fresh session on the next send
                self.session_stamp = (self.model, !self.desanitized);
                self.refresh_session_if_needed().ok();
                println!("Conversation cleared.");
            }
            other => println!("Unknown command: {}", other),
        }
        true
    }

    /// Send one message and stream the reply to the terminal
    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.refresh_session_if_needed()?;

        self.transcript.push(ChatMessage::user(text));
        let mut reply = ChatMessage::streaming_model(self.model.id());

        let cancel = CancelToken::new();
        let watcher_token = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher_token.cancel();
            }
        });

        let mut sink = TerminalSink::new();
        sink.on_tool_status(Some("Model thinking..."));

        let outcome = self.engine.send_message(text, &cancel, &mut sink).await;
        watcher.abort();
        sink.clear_spinner();
        println!();

        let outcome = outcome?;
        reply.text = outcome.text.clone();
        reply.is_streaming = false;
        reply.token_usage = outcome.usage;
        self.transcript.push(reply);

        match outcome.phase {
            EnginePhase::Completed => {
                if self.verbose {
                    if let Some(usage) = outcome.usage {
                        eprintln!(
                            "[ENGINE] Turns: {} | Tokens: {} prompt / {} response",
                            outcome.turns, usage.prompt_tokens, usage.response_tokens
                        );
                    }
                }
            }
            EnginePhase::Aborted => {
                println!("{}", "Generation aborted.".yellow());
            }
            EnginePhase::Failed => {
                println!("{}", "The send did not complete; see message above.".red());
            }
            _ => {}
        }

        Ok(())
    }
}
