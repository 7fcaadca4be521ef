//! Conversation engine
//!
//! Owns the multi-turn send loop: streams a turn, collects capability
//! invocations, dispatches them, feeds results back as the next turn's
//! input, and enforces the turn cap and cancellation.

pub mod cancel;
pub mod orchestrator;
pub mod state;

pub use cancel::CancelToken;
pub use orchestrator::{ChatEngine, ChatOutcome, EngineConfig};
pub use state::{EnginePhase, PhaseEvent};

/// Live output of an in-flight send
///
/// The engine pushes text deltas and librarian status lines here while
/// streaming; the terminal REPL renders them, tests record them.
pub trait StreamSink {
    /// A text delta arrived; append it to the visible partial answer
    fn on_delta(&mut self, delta: &str);

    /// Librarian activity changed: `Some` while a fetch is announced,
    /// `None` once meaningful text resumes
    fn on_tool_status(&mut self, status: Option<&str>);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl StreamSink for NullSink {
    fn on_delta(&mut self, _delta: &str) {}
    fn on_tool_status(&mut self, _status: Option<&str>) {}
}
