//! Integration tests for the conversation engine
//!
//! Drives the full send loop against scripted model sessions and a fake
//! GitHub transport, without any network access.

use async_trait::async_trait;
use mission_architect::engine::{
    CancelToken, ChatEngine, EngineConfig, EnginePhase, StreamSink,
};
use mission_architect::engine::orchestrator::{ABORT_MARKER, OFFLINE_MESSAGE};
use mission_architect::errors::{ArchitectError, Result};
use mission_architect::librarian::tree::TreeResponse;
use mission_architect::librarian::{
    EntryKind, GitHubTransport, Librarian, MemoryTreeStore, RepoConfig, TreeEntry, HIDDEN_BODY,
};
use mission_architect::session::{ChunkStream, ModelSession};
use mission_architect::tools::executor::DUPLICATE_DOCS_NOTICE;
use mission_architect::tools::{CapabilityExecutor, FRAMEWORK_DOCS, SSE_DOCS};
use mission_architect::types::{CapabilityInvocation, StreamChunk, TurnInput};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Transport serving an in-memory repository
struct FakeRepo {
    files: HashMap<String, String>,
}

impl FakeRepo {
    fn new(files: Vec<(&str, String)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl GitHubTransport for FakeRepo {
    async fn fetch_tree(&self, _config: &RepoConfig) -> Result<TreeResponse> {
        let mut paths: Vec<&String> = self.files.keys().collect();
        paths.sort();
        Ok(TreeResponse {
            tree: paths
                .into_iter()
                .map(|p| TreeEntry {
                    path: p.clone(),
                    kind: EntryKind::Blob,
                    size: self.files.get(p).map(|c| c.len() as u64),
                })
                .collect(),
            truncated: false,
        })
    }

    async fn fetch_raw(&self, url: &str) -> Result<String> {
        let path = url
            .rsplit_once("/develop/")
            .map(|(_, p)| p)
            .unwrap_or_default();
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ArchitectError::RawFetch {
                url: url.to_string(),
            })
    }
}

/// Scripted model session: a fixed queue of turns, each a list of chunk
/// results, plus captured inputs for assertions
struct ScriptedSession {
    turns: Mutex<VecDeque<Vec<Result<StreamChunk>>>>,
    inputs: Arc<Mutex<Vec<TurnInput>>>,
    online: bool,
    send_failure: Option<String>,
}

impl ScriptedSession {
    fn new(turns: Vec<Vec<Result<StreamChunk>>>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            inputs: Arc::new(Mutex::new(Vec::new())),
            online: true,
            send_failure: None,
        }
    }

    fn offline() -> Self {
        let mut session = Self::new(vec![]);
        session.online = false;
        session
    }

    fn failing_send(detail: &str) -> Self {
        let mut session = Self::new(vec![]);
        session.send_failure = Some(detail.to_string());
        session
    }

    fn inputs_handle(&self) -> Arc<Mutex<Vec<TurnInput>>> {
        Arc::clone(&self.inputs)
    }
}

#[async_trait]
impl ModelSession for ScriptedSession {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn preflight(&self) -> bool {
        self.online
    }

    async fn send_stream(&mut self, input: TurnInput) -> Result<ChunkStream> {
        self.inputs.lock().unwrap().push(input);

        if let Some(detail) = &self.send_failure {
            return Err(ArchitectError::StreamingError(detail.clone()));
        }

        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(Box::pin(futures_util::stream::iter(turn)))
    }

    fn record_reply(&mut self, _text: &str, _invocations: &[CapabilityInvocation]) {}
}

/// Sink recording everything, optionally cancelling after the first delta
#[derive(Default)]
struct RecordingSink {
    deltas: Vec<String>,
    statuses: Vec<Option<String>>,
    cancel_on_first_delta: Option<CancelToken>,
}

impl StreamSink for RecordingSink {
    fn on_delta(&mut self, delta: &str) {
        if self.deltas.is_empty() {
            if let Some(token) = &self.cancel_on_first_delta {
                token.cancel();
            }
        }
        self.deltas.push(delta.to_string());
    }

    fn on_tool_status(&mut self, status: Option<&str>) {
        self.statuses.push(status.map(String::from));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn docs_call(id: &str, module: &str) -> CapabilityInvocation {
    let mut args = HashMap::new();
    args.insert("framework".to_string(), serde_json::json!("MOOSE"));
    args.insert("module_name".to_string(), serde_json::json!(module));
    CapabilityInvocation {
        id: Some(id.to_string()),
        name: FRAMEWORK_DOCS.to_string(),
        args,
    }
}

fn sse_call(id: &str, category: &str) -> CapabilityInvocation {
    let mut args = HashMap::new();
    args.insert("category".to_string(), serde_json::json!(category));
    CapabilityInvocation {
        id: Some(id.to_string()),
        name: SSE_DOCS.to_string(),
        args,
    }
}

fn tool_chunk(calls: Vec<CapabilityInvocation>) -> StreamChunk {
    StreamChunk {
        invocations: calls,
        ..Default::default()
    }
}

fn engine_with(session: ScriptedSession, files: Vec<(&str, String)>) -> ChatEngine {
    let librarian = Librarian::new(
        Arc::new(FakeRepo::new(files)),
        Box::new(MemoryTreeStore::new()),
    );
    ChatEngine::new(Box::new(session), CapabilityExecutor::new(librarian))
        .with_config(EngineConfig::default())
}

fn airboss_source() -> String {
    "--- Airboss recovery.\nfunction AIRBOSS:New(carriername)\n  return self\nend\n".to_string()
}

fn big_lua_source() -> String {
    let mut source = String::from("--- Big module header.\nfunction BIG:Run()\n");
    for i in 0..2400 {
        source.push_str(&format!("  local filler_{} = {}\n", i, i));
    }
    source.push_str("end\n");
    assert!(source.len() > 50_000);
    source
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_turn_completes_with_accumulated_text() {
    let session = ScriptedSession::new(vec![vec![
        Ok(StreamChunk::text("The Airboss class ")),
        Ok(StreamChunk::text("manages carrier recovery.")),
    ]]);
    let mut engine = engine_with(session, vec![]);

    let mut sink = RecordingSink::default();
    let outcome = engine
        .send_message("What is Airboss?", &CancelToken::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Completed);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.text, "The Airboss class manages carrier recovery.");
    assert_eq!(sink.deltas.len(), 2);
}

#[tokio::test]
async fn test_tool_turn_feeds_result_back_and_completes() {
    let session = ScriptedSession::new(vec![
        vec![
            Ok(StreamChunk::text("Let me fetch that. ")),
            Ok(tool_chunk(vec![docs_call("call-1", "Airboss")])),
        ],
        vec![Ok(StreamChunk::text("Airboss:New(carriername) creates it."))],
    ]);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![("Ops/Airboss.lua", airboss_source())]);

    let mut sink = RecordingSink::default();
    let outcome = engine
        .send_message("How do I create an Airboss?", &CancelToken::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Completed);
    assert_eq!(outcome.turns, 2);
    assert!(outcome.text.ends_with("creates it."));

    // The second turn's input carries exactly one result for call-1,
    // whose payload is the annotated source
    let inputs = inputs.lock().unwrap();
    assert_eq!(inputs.len(), 2);
    match &inputs[1] {
        TurnInput::CapabilityResults(results) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].id.as_deref(), Some("call-1"));
            assert!(results[0].result.starts_with("[Librarian Source Metadata]"));
            assert!(results[0].result.contains("File: Ops/Airboss.lua"));
            // 4KB-class file: no compression applied
            assert!(!results[0].result.contains(HIDDEN_BODY));
        }
        other => panic!("expected capability results, got {:?}", other),
    }

    // Librarian status surfaced while the tool chunk streamed
    assert!(sink
        .statuses
        .iter()
        .flatten()
        .any(|s| s == "Librarian: Fetching Airboss..."));
}

#[tokio::test]
async fn test_large_file_result_is_skeletonized() {
    let session = ScriptedSession::new(vec![
        vec![Ok(tool_chunk(vec![docs_call("call-1", "Big")]))],
        vec![Ok(StreamChunk::text("Done."))],
    ]);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![("Ops/Big.lua", big_lua_source())]);

    engine
        .send_message("Analyze Big", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    let inputs = inputs.lock().unwrap();
    match &inputs[1] {
        TurnInput::CapabilityResults(results) => {
            let body = &results[0].result;
            assert!(body.contains(HIDDEN_BODY));
            // Declarations and doc comments preserved verbatim
            assert!(body.contains("function BIG:Run()"));
            assert!(body.contains("--- Big module header."));
            assert!(!body.contains("filler_2399"));
        }
        other => panic!("expected capability results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_invocation_suppressed_within_send() {
    // The model asks for the same module on two consecutive turns
    let session = ScriptedSession::new(vec![
        vec![Ok(tool_chunk(vec![docs_call("call-1", "Airboss")]))],
        vec![Ok(tool_chunk(vec![docs_call("call-2", "airboss")]))],
        vec![Ok(StreamChunk::text("Understood."))],
    ]);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![("Ops/Airboss.lua", airboss_source())]);

    let outcome = engine
        .send_message("Airboss?", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(outcome.phase, EnginePhase::Completed);

    let inputs = inputs.lock().unwrap();
    let first = match &inputs[1] {
        TurnInput::CapabilityResults(results) => results[0].result.clone(),
        other => panic!("expected capability results, got {:?}", other),
    };
    let second = match &inputs[2] {
        TurnInput::CapabilityResults(results) => results[0].result.clone(),
        other => panic!("expected capability results, got {:?}", other),
    };

    assert!(first.starts_with("[Librarian Source Metadata]"));
    assert_eq!(second, DUPLICATE_DOCS_NOTICE);
}

#[tokio::test]
async fn test_mixed_invocations_preserve_order() {
    let session = ScriptedSession::new(vec![
        vec![Ok(tool_chunk(vec![
            sse_call("call-1", "timer"),
            docs_call("call-2", "Airboss"),
        ]))],
        vec![Ok(StreamChunk::text("Done."))],
    ]);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![("Ops/Airboss.lua", airboss_source())]);

    engine
        .send_message("timers and airboss", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    let inputs = inputs.lock().unwrap();
    match &inputs[1] {
        TurnInput::CapabilityResults(results) => {
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].id.as_deref(), Some("call-1"));
            assert!(results[0].result.contains("timer.scheduleFunction"));
            assert_eq!(results[1].id.as_deref(), Some("call-2"));
            assert!(results[1].result.contains("Airboss.lua"));
        }
        other => panic!("expected capability results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_turn_cap_terminates_at_five() {
    // Every turn requests a fresh module; the loop must stop at turn 5
    let turns: Vec<Vec<Result<StreamChunk>>> = (0..10)
        .map(|i| {
            vec![
                Ok(StreamChunk::text(format!("turn {} ", i + 1))),
                Ok(tool_chunk(vec![docs_call(
                    &format!("call-{}", i),
                    &format!("Module{}", i),
                )])),
            ]
        })
        .collect();
    let session = ScriptedSession::new(turns);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![]);

    let outcome = engine
        .send_message("loop forever", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Completed);
    assert_eq!(outcome.turns, 5);
    assert_eq!(outcome.text, "turn 1 turn 2 turn 3 turn 4 turn 5 ");
    // Five sends total: the cap turn's invocations are never dispatched
    assert_eq!(inputs.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_cancellation_appends_marker_and_stops() {
    let session = ScriptedSession::new(vec![vec![
        Ok(StreamChunk::text("Fetching Airboss")),
        Ok(StreamChunk::text(" ... more text that must never arrive")),
        Ok(tool_chunk(vec![docs_call("call-1", "Airboss")])),
    ]]);
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![("Ops/Airboss.lua", airboss_source())]);

    let cancel = CancelToken::new();
    let mut sink = RecordingSink {
        cancel_on_first_delta: Some(cancel.clone()),
        ..Default::default()
    };

    let outcome = engine
        .send_message("Airboss?", &cancel, &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Aborted);
    assert_eq!(outcome.text, format!("Fetching Airboss\n\n{}", ABORT_MARKER));
    // No tool dispatch, no further turns after the abort
    assert_eq!(inputs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_failure_classified_with_rate_hint() {
    let session = ScriptedSession::failing_send("HTTP 429: quota exceeded");
    let mut engine = engine_with(session, vec![]);

    let outcome = engine
        .send_message("hello", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Failed);
    assert!(outcome.text.starts_with("**LIBRARIAN ERROR:**"));
    assert!(outcome.text.contains("HTTP 429"));
    assert!(outcome.text.contains("Rate Limit"));
}

#[tokio::test]
async fn test_mid_stream_failure_preserves_partial_text() {
    let session = ScriptedSession::new(vec![vec![
        Ok(StreamChunk::text("Partial answer")),
        Err(ArchitectError::StreamingError(
            "connection error: reset by peer".to_string(),
        )),
    ]]);
    let mut engine = engine_with(session, vec![]);

    let outcome = engine
        .send_message("hello", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Failed);
    assert!(outcome.text.starts_with("Partial answer"));
    assert!(outcome.text.contains("**NETWORK ERROR**"));
}

#[tokio::test]
async fn test_offline_preflight_short_circuits() {
    let session = ScriptedSession::offline();
    let inputs = session.inputs_handle();
    let mut engine = engine_with(session, vec![]);

    let outcome = engine
        .send_message("hello", &CancelToken::new(), &mut RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(outcome.phase, EnginePhase::Failed);
    assert_eq!(outcome.text, OFFLINE_MESSAGE);
    assert_eq!(outcome.turns, 0);
    assert!(inputs.lock().unwrap().is_empty());
}
