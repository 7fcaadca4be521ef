//! Gemini API streaming session
//!
//! Implements [`ModelSession`] over the Gemini REST API with server-sent
//! event streaming. The session keeps the full content history and is
//! recreated wholesale whenever model id, safety mode, or session
//! identity changes; recreation only ever happens between sends.

use crate::errors::{ArchitectError, Result};
use crate::session::parser::SseParser;
use crate::session::{ChunkStream, ModelSession};
use crate::types::{
    CapabilityInvocation, ChatMessage, Role, StreamChunk, TokenUsage, TurnInput,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Gemini API host
pub const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Request timeout for non-streaming calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling temperature: the Librarian reads source, it does not improvise
const TEMPERATURE: f64 = 0.1;

/// One content block of the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<ContentPart>,
}

/// A single part: text, capability invocation, or invocation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContentPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<WireFunctionCall>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<WireFunctionResponse>,
}

impl ContentPart {
    fn text_part(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireFunctionCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireFunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

/// Streamed response chunk as it appears on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChunk {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
    model_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireCandidate {
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

/// Decode one SSE payload into a [`StreamChunk`].
///
/// Text is extracted part-by-part so chunks that carry only a function
/// call produce an empty delta instead of an error.
pub(crate) fn decode_chunk(payload: &str) -> Result<StreamChunk> {
    let wire: WireChunk = serde_json::from_str(payload)
        .map_err(|e| ArchitectError::StreamingError(format!("Failed to parse chunk: {}", e)))?;

    let mut chunk = StreamChunk {
        model_version: wire.model_version,
        ..Default::default()
    };

    if let Some(usage) = wire.usage_metadata {
        chunk.usage = Some(TokenUsage {
            prompt_tokens: usage.prompt_token_count.unwrap_or(0),
            response_tokens: usage.candidates_token_count.unwrap_or(0),
            total_tokens: usage.total_token_count.unwrap_or(0),
        });
    }

    if let Some(content) = wire.candidates.into_iter().next().and_then(|c| c.content) {
        for part in content.parts {
            if let Some(text) = part.text {
                chunk.text.push_str(&text);
            }
            if let Some(call) = part.function_call {
                chunk.invocations.push(CapabilityInvocation {
                    id: call.id,
                    name: call.name,
                    args: call.args,
                });
            }
        }
    }

    Ok(chunk)
}

/// Map transcript messages into wire history, dropping entries that are
/// still streaming or empty
pub(crate) fn map_history(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .filter(|m| !m.is_streaming && !m.text.trim().is_empty())
        .map(|m| Content {
            role: match m.role {
                Role::User => "user".to_string(),
                Role::Model => "model".to_string(),
            },
            parts: vec![ContentPart::text_part(m.text.clone())],
        })
        .collect()
}

/// Streaming Gemini session
pub struct GeminiSession {
    client: reqwest::Client,
    api_key: String,
    model: String,
    system_instruction: String,
    tools: Value,
    history: Vec<Content>,
}

impl GeminiSession {
    /// Create a session seeded with prior transcript history
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
        tools: Value,
        history_messages: &[ChatMessage],
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ArchitectError::HttpError)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            system_instruction: system_instruction.into(),
            tools,
            history: map_history(history_messages),
        })
    }

    fn request_body(&self) -> Value {
        json!({
            "contents": self.history,
            "systemInstruction": { "parts": [{ "text": self.system_instruction }] },
            "tools": self.tools,
            "generationConfig": { "temperature": TEMPERATURE },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" }
            ]
        })
    }

    fn content_for(input: TurnInput) -> Content {
        match input {
            TurnInput::UserText(text) => Content {
                role: "user".to_string(),
                parts: vec![ContentPart::text_part(text)],
            },
            TurnInput::CapabilityResults(results) => Content {
                role: "user".to_string(),
                parts: results
                    .into_iter()
                    .map(|r| ContentPart {
                        function_response: Some(WireFunctionResponse {
                            id: r.id,
                            name: r.name,
                            response: json!({ "result": r.result }),
                        }),
                        ..Default::default()
                    })
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl ModelSession for GeminiSession {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn preflight(&self) -> bool {
        check_connectivity(&self.client).await
    }

    async fn send_stream(&mut self, input: TurnInput) -> Result<ChunkStream> {
        self.history.push(Self::content_for(input));

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            API_BASE, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&self.request_body())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ArchitectError::StreamingError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|result| {
                result.map_err(|e| {
                    ArchitectError::StreamingError(format!("connection error: {}", e))
                })
            })
            .scan(SseParser::new(), |parser, item| {
                let decoded: Vec<Result<StreamChunk>> = match item {
                    Ok(bytes) => match parser.add_bytes(&bytes) {
                        Ok(payloads) => payloads
                            .iter()
                            .filter(|p| p.as_str() != "[DONE]")
                            .map(|p| decode_chunk(p))
                            .collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Err(e) => vec![Err(e)],
                };
                futures_util::future::ready(Some(futures_util::stream::iter(decoded)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    fn record_reply(&mut self, text: &str, invocations: &[CapabilityInvocation]) {
        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(ContentPart::text_part(text));
        }
        for call in invocations {
            parts.push(ContentPart {
                function_call: Some(WireFunctionCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Default::default()
            });
        }
        if !parts.is_empty() {
            self.history.push(Content {
                role: "model".to_string(),
                parts,
            });
        }
    }
}

/// One-shot key validation: a minimal generate call, pass/fail only
pub async fn validate_api_key(api_key: &str, model: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        API_BASE, model, api_key
    );
    let body = json!({ "contents": [{ "parts": [{ "text": "ping" }] }] });

    match client.post(&url).json(&body).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Pre-flight connectivity probe.
///
/// Any HTTP response from the API host counts as online; only a
/// transport-level failure (DNS, no route) reports offline.
pub async fn check_connectivity(client: &reqwest::Client) -> bool {
    client
        .get(API_BASE)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .is_ok()
}
