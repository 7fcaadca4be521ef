//! Model session boundary
//!
//! The chat engine talks to the model exclusively through the
//! [`ModelSession`] trait: one `send_stream` per turn yielding a finite,
//! non-restartable chunk stream. The production implementation streams
//! from the Gemini API; tests substitute scripted sessions.

pub mod gemini;
pub mod parser;

pub use gemini::{check_connectivity, validate_api_key, GeminiSession};
pub use parser::SseParser;

use crate::errors::Result;
use crate::types::{CapabilityInvocation, StreamChunk, TurnInput};
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// A finite stream of response chunks for one turn
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// One long-lived conversation with the model.
///
/// The session owns the turn history. After consuming a turn's stream the
/// caller reports the reply via [`ModelSession::record_reply`] so the
/// next turn carries the full transcript.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Active model identifier
    fn model_id(&self) -> &str;

    /// Cheap connectivity probe run before the first turn of a send.
    /// Default assumes the backend is reachable.
    async fn preflight(&self) -> bool {
        true
    }

    /// Send one turn's input and return its response stream
    async fn send_stream(&mut self, input: TurnInput) -> Result<ChunkStream>;

    /// Append the model's reply to the session history
    fn record_reply(&mut self, text: &str, invocations: &[CapabilityInvocation]);
}
