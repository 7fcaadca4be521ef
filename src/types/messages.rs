//! Message types for the conversation engine
//!
//! Defines the structured values exchanged between the chat engine,
//! the model session, and the capability executor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Conversation roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human operator
    User,
    /// The model
    Model,
}

/// Token accounting reported by the model per chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub response_tokens: u32,
    pub total_tokens: u32,
}

/// A single transcript entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Stable message id
    pub id: Uuid,

    /// Who produced the message
    pub role: Role,

    /// Message text (may grow while streaming)
    pub text: String,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// True while the model is still streaming into this message
    pub is_streaming: bool,

    /// Model id that produced the message, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,

    /// Usage metadata from the final chunk, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl ChatMessage {
    /// Create a finished user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            model_used: None,
            token_usage: None,
        }
    }

    /// Create an empty model message that will accumulate streamed text
    pub fn streaming_model(model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Model,
            text: String::new(),
            timestamp: Utc::now(),
            is_streaming: true,
            model_used: Some(model.into()),
            token_usage: None,
        }
    }

    /// Create a finished model message (system notices, offline banner)
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            model_used: None,
            token_usage: None,
        }
    }
}

/// A capability invocation the model emitted mid-stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityInvocation {
    /// Correlation id assigned by the model, echoed back with the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Capability name (one of the registered capabilities)
    pub name: String,

    /// Arguments as emitted by the model
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
}

impl CapabilityInvocation {
    /// Fetch a string argument, empty when absent or non-string
    pub fn arg_str(&self, key: &str) -> &str {
        self.args.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Fetch an optional string argument
    pub fn arg_opt(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }
}

/// The result of one capability invocation, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Echoed correlation id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Capability name
    pub name: String,

    /// Result payload, always plain text
    pub result: String,
}

/// One unit of the model's streamed response
///
/// Chunks must be applied to the accumulating response in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Text delta for this chunk (may be empty on pure tool chunks)
    pub text: String,

    /// Capability invocations carried by this chunk
    pub invocations: Vec<CapabilityInvocation>,

    /// Usage metadata, usually only on the final chunk
    pub usage: Option<TokenUsage>,

    /// Model version string the API verified for this response
    pub model_version: Option<String>,
}

impl StreamChunk {
    /// Plain text chunk
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Input for one conversational turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    /// The user's message text (first turn of a send)
    UserText(String),

    /// Capability results packaged for the model (follow-up turns)
    CapabilityResults(Vec<InvocationResult>),
}
