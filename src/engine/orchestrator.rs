//! Multi-turn chat engine
//!
//! One `send_message` call drives up to [`EngineConfig::max_turns`]
//! round-trips with the model session. Capability invocations detected in
//! a turn are dispatched sequentially in emission order, their results
//! packaged as the next turn's input. A per-send ledger suppresses
//! repeated invocations; cancellation is observed at chunk boundaries.

use crate::engine::cancel::CancelToken;
use crate::engine::state::{EnginePhase, PhaseEvent};
use crate::engine::StreamSink;
use crate::errors::{ArchitectError, Result};
use crate::session::ModelSession;
use crate::tools::CapabilityExecutor;
use crate::types::{CapabilityInvocation, TokenUsage, TurnInput};
use futures_util::StreamExt;
use std::collections::HashSet;

/// Maximum turns per send: the model gets this many round-trips to stop
/// requesting tools before the partial answer is declared final
pub const MAX_TURNS: usize = 5;

/// Marker appended to the visible text on cancellation
pub const ABORT_MARKER: &str = "**[GENERATION ABORTED]**";

/// Message used when the pre-flight connectivity probe fails
pub const OFFLINE_MESSAGE: &str = "**OFFLINE MODE:**\n\nI cannot contact the neural engine \
     because your device is offline. Please check your internet connection.";

/// Message used when the connection drops mid-transmission
pub const NETWORK_LOST_MESSAGE: &str =
    "**NETWORK ERROR**\n\nConnection lost during transmission. Please check your internet.";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum turns per send
    pub max_turns: usize,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: MAX_TURNS,
            verbose: false,
        }
    }
}

/// Terminal result of one send
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Full visible text, including any trailing abort/failure marker
    pub text: String,

    /// Terminal phase: Completed, Aborted, or Failed
    pub phase: EnginePhase,

    /// Usage metadata from the last chunk that reported it
    pub usage: Option<TokenUsage>,

    /// Model version the API verified, when reported
    pub model_version: Option<String>,

    /// Number of turns consumed
    pub turns: usize,
}

/// The conversation engine
pub struct ChatEngine {
    session: Box<dyn ModelSession>,
    executor: CapabilityExecutor,
    config: EngineConfig,
    phase: EnginePhase,
}

impl ChatEngine {
    pub fn new(session: Box<dyn ModelSession>, executor: CapabilityExecutor) -> Self {
        Self {
            session,
            executor,
            config: EngineConfig::default(),
            phase: EnginePhase::Idle,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Current phase
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Active model identifier
    pub fn model_id(&self) -> &str {
        self.session.model_id()
    }

    /// Swap in a fresh session (model, safety mode, or session change).
    /// Only valid between sends; pending work is never discarded because
    /// the engine is single-flight.
    pub fn replace_session(&mut self, session: Box<dyn ModelSession>) {
        self.session = session;
        self.phase = EnginePhase::Idle;
    }

    /// Drive one full send: turns, tool dispatch, and termination.
    ///
    /// Always returns an outcome; transport failures and cancellation are
    /// encoded in its phase with partial text preserved.
    pub async fn send_message(
        &mut self,
        text: &str,
        cancel: &CancelToken,
        sink: &mut dyn StreamSink,
    ) -> Result<ChatOutcome> {
        self.phase = EnginePhase::Idle;

        let mut accumulated = String::new();
        let mut usage: Option<TokenUsage> = None;
        let mut model_version: Option<String> = None;
        let mut turn_count = 0usize;

        // Dedup ledger lives exactly as long as this call
        let mut ledger: HashSet<String> = HashSet::new();

        if !self.session.preflight().await {
            self.phase = self.phase.transition(PhaseEvent::PreflightFailed)?;
            sink.on_delta(OFFLINE_MESSAGE);
            return Ok(ChatOutcome {
                text: OFFLINE_MESSAGE.to_string(),
                phase: self.phase,
                usage: None,
                model_version: None,
                turns: 0,
            });
        }

        let mut input = TurnInput::UserText(text.to_string());

        while turn_count < self.config.max_turns {
            turn_count += 1;

            if self.phase == EnginePhase::Idle {
                self.phase = self.phase.transition(PhaseEvent::SendStarted)?;
            }

            let mut stream = match self.session.send_stream(input.clone()).await {
                Ok(stream) => stream,
                Err(e) => {
                    self.phase = self.phase.transition(PhaseEvent::TransportFailed)?;
                    let message = classify_send_failure(&e);
                    append_notice(&mut accumulated, &message, sink);
                    return Ok(self.outcome(accumulated, usage, model_version, turn_count));
                }
            };
            self.phase = self.phase.transition(PhaseEvent::StreamOpened)?;

            let mut turn_text = String::new();
            let mut invocations: Vec<CapabilityInvocation> = Vec::new();

            while let Some(item) = stream.next().await {
                // Cancellation is observed at chunk boundaries only
                if cancel.is_cancelled() {
                    self.phase = self.phase.transition(PhaseEvent::CancelRequested)?;
                    append_notice(&mut accumulated, ABORT_MARKER, sink);
                    return Ok(self.outcome(accumulated, usage, model_version, turn_count));
                }

                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        self.phase = self.phase.transition(PhaseEvent::TransportFailed)?;
                        let message = classify_stream_failure(&e);
                        append_notice(&mut accumulated, &message, sink);
                        return Ok(self.outcome(accumulated, usage, model_version, turn_count));
                    }
                };

                if !chunk.text.is_empty() {
                    turn_text.push_str(&chunk.text);
                    accumulated.push_str(&chunk.text);
                    sink.on_delta(&chunk.text);
                }
                if let Some(chunk_usage) = chunk.usage {
                    usage = Some(chunk_usage);
                }
                if chunk.model_version.is_some() {
                    model_version = chunk.model_version;
                }

                if let Some(call) = chunk.invocations.first() {
                    let module = call.arg_opt("module_name").unwrap_or("Documentation");
                    sink.on_tool_status(Some(&format!("Librarian: Fetching {}...", module)));
                } else if chunk.text.len() > 5 {
                    sink.on_tool_status(None);
                }

                invocations.extend(chunk.invocations);
            }

            self.session.record_reply(&turn_text, &invocations);

            if invocations.is_empty() {
                self.phase = self.phase.transition(PhaseEvent::StreamExhausted)?;
                break;
            }

            if turn_count >= self.config.max_turns {
                // Cap reached with tools still requested: the partial
                // accumulated text is the final answer. There is no next
                // turn to feed results into, so nothing is dispatched.
                if self.config.verbose {
                    eprintln!(
                        "[ENGINE] Turn cap reached with {} pending invocations, stopping.",
                        invocations.len()
                    );
                }
                self.phase = self.phase.transition(PhaseEvent::StreamExhausted)?;
                break;
            }

            if self.config.verbose {
                eprintln!(
                    "[ENGINE] Executing {} capabilities. Turn: {}",
                    invocations.len(),
                    turn_count
                );
            }

            self.phase = self.phase.transition(PhaseEvent::InvocationsDetected)?;

            // One result per invocation, in emission order
            let mut results = Vec::with_capacity(invocations.len());
            for call in &invocations {
                let fingerprint = self.executor.fingerprint(call);
                let result = if ledger.contains(&fingerprint) {
                    if self.config.verbose {
                        eprintln!("[ENGINE] Duplicate invocation blocked: {}", fingerprint);
                    }
                    crate::types::InvocationResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: self.executor.duplicate_notice(call),
                    }
                } else {
                    ledger.insert(fingerprint);
                    self.executor.execute(call).await
                };
                results.push(result);
            }

            sink.on_tool_status(None);
            self.phase = self.phase.transition(PhaseEvent::ResultsReady)?;
            input = TurnInput::CapabilityResults(results);
        }

        if !self.phase.is_terminal() {
            self.phase = EnginePhase::Completed;
        }

        Ok(self.outcome(accumulated, usage, model_version, turn_count))
    }

    fn outcome(
        &self,
        text: String,
        usage: Option<TokenUsage>,
        model_version: Option<String>,
        turns: usize,
    ) -> ChatOutcome {
        ChatOutcome {
            text,
            phase: self.phase,
            usage,
            model_version,
            turns,
        }
    }
}

/// Append a terminal notice after any partial text, mirroring it to the
/// sink so the live view matches the outcome
fn append_notice(accumulated: &mut String, notice: &str, sink: &mut dyn StreamSink) {
    let delta = if accumulated.is_empty() {
        notice.to_string()
    } else {
        format!("\n\n{}", notice)
    };
    accumulated.push_str(&delta);
    sink.on_tool_status(None);
    sink.on_delta(&delta);
}

/// Classify a failure of the turn's network call into user-facing text
fn classify_send_failure(err: &ArchitectError) -> String {
    if err.is_network() {
        return NETWORK_LOST_MESSAGE.to_string();
    }

    let detail = err.to_string();
    let hint = if detail.contains("400") || detail.contains("INVALID_ARGUMENT") {
        "The documentation might be too large (Payload Limit)."
    } else if detail.contains("413") {
        "The request payload was too large (413)."
    } else if detail.contains("429") {
        "You are sending requests too fast (Rate Limit)."
    } else if detail.contains("503") {
        "The AI model is currently overloaded."
    } else {
        "Check your API connection."
    };

    format!(
        "**LIBRARIAN ERROR:** The Librarian crashed while fetching data.\n\n\
         **Details:** {}\n\
         **Hint:** {}",
        detail, hint
    )
}

/// Classify a mid-stream failure into user-facing text
fn classify_stream_failure(err: &ArchitectError) -> String {
    if err.is_network() {
        NETWORK_LOST_MESSAGE.to_string()
    } else {
        format!("**SYSTEM ERROR**\n\n{}", err)
    }
}
