//! Engine phase machine
//!
//! Deterministic finite state machine for one `send_message` call.
//! Every phase change goes through [`EnginePhase::transition`], so an
//! impossible edge surfaces as an error instead of a silent skip.

use crate::errors::{ArchitectError, Result};
use serde::{Deserialize, Serialize};

/// Phases of one send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnginePhase {
    /// No send in flight
    Idle,

    /// Request for the current turn is being issued
    Sending,

    /// Consuming the current turn's response stream
    Streaming,

    /// Dispatching capability invocations collected from the turn
    ExecutingTools,

    /// Final answer delivered (terminal)
    Completed,

    /// User cancelled mid-stream (terminal, not an error)
    Aborted,

    /// Transport failure ended the send (terminal)
    Failed,
}

/// Events that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A turn request is about to be issued
    SendStarted,

    /// The response stream opened
    StreamOpened,

    /// The turn's stream finished and carried invocations
    InvocationsDetected,

    /// All invocation results are packaged for the next turn
    ResultsReady,

    /// The turn's stream finished with no pending invocations
    StreamExhausted,

    /// Cancellation observed at a chunk boundary
    CancelRequested,

    /// Transport-level failure (send or mid-stream)
    TransportFailed,

    /// Connectivity probe failed before any send
    PreflightFailed,
}

impl EnginePhase {
    /// Check if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnginePhase::Completed | EnginePhase::Aborted | EnginePhase::Failed
        )
    }

    /// Attempt phase transition with validation
    ///
    /// Valid transitions:
    /// 1. Idle           → Sending        (SendStarted)
    /// 2. Idle           → Failed         (PreflightFailed)
    /// 3. Sending        → Streaming      (StreamOpened)
    /// 4. Sending        → Failed         (TransportFailed)
    /// 5. Streaming      → ExecutingTools (InvocationsDetected)
    /// 6. Streaming      → Completed      (StreamExhausted)
    /// 7. Streaming      → Aborted        (CancelRequested)
    /// 8. Streaming      → Failed         (TransportFailed)
    /// 9. ExecutingTools → Sending        (ResultsReady)
    pub fn transition(&self, event: PhaseEvent) -> Result<EnginePhase> {
        use EnginePhase::*;
        use PhaseEvent::*;

        let next = match (self, event) {
            (Idle, SendStarted) => Sending,
            (Idle, PreflightFailed) => Failed,

            (Sending, StreamOpened) => Streaming,
            (Sending, TransportFailed) => Failed,

            (Streaming, InvocationsDetected) => ExecutingTools,
            (Streaming, StreamExhausted) => Completed,
            (Streaming, CancelRequested) => Aborted,
            (Streaming, TransportFailed) => Failed,

            (ExecutingTools, ResultsReady) => Sending,

            (from, _) => {
                return Err(ArchitectError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_single_turn() {
        let phase = EnginePhase::Idle
            .transition(PhaseEvent::SendStarted)
            .unwrap()
            .transition(PhaseEvent::StreamOpened)
            .unwrap()
            .transition(PhaseEvent::StreamExhausted)
            .unwrap();
        assert_eq!(phase, EnginePhase::Completed);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_tool_turn_loops_back_to_sending() {
        let phase = EnginePhase::Streaming
            .transition(PhaseEvent::InvocationsDetected)
            .unwrap()
            .transition(PhaseEvent::ResultsReady)
            .unwrap();
        assert_eq!(phase, EnginePhase::Sending);
        assert!(!phase.is_terminal());
    }

    #[test]
    fn test_cancellation_only_from_streaming() {
        assert_eq!(
            EnginePhase::Streaming
                .transition(PhaseEvent::CancelRequested)
                .unwrap(),
            EnginePhase::Aborted
        );
        assert!(EnginePhase::Idle
            .transition(PhaseEvent::CancelRequested)
            .is_err());
    }

    #[test]
    fn test_preflight_failure_from_idle() {
        assert_eq!(
            EnginePhase::Idle
                .transition(PhaseEvent::PreflightFailed)
                .unwrap(),
            EnginePhase::Failed
        );
    }

    #[test]
    fn test_terminal_phases_reject_events() {
        for phase in [
            EnginePhase::Completed,
            EnginePhase::Aborted,
            EnginePhase::Failed,
        ] {
            assert!(phase.is_terminal());
            assert!(phase.transition(PhaseEvent::SendStarted).is_err());
        }
    }
}
