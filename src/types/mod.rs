//! Core types shared across the engine, session, and librarian

pub mod messages;

pub use messages::{
    CapabilityInvocation, ChatMessage, InvocationResult, Role, StreamChunk, TokenUsage, TurnInput,
};
