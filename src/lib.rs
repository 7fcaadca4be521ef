//! Mission Architect - DCS Mission Building Assistant
//!
//! A terminal assistant that answers MOOSE and DML scripting questions by
//! fetching their real Lua source from GitHub on demand instead of
//! relying on memorized knowledge.
//!
//! # Architecture
//!
//! - **librarian**: tree cache, fuzzy resolution, source compression
//! - **session**: streaming model session boundary
//! - **engine**: multi-turn conversation loop with capability dispatch
//! - **repl**: interactive terminal surface

pub mod errors;
pub mod types;

pub mod librarian;
pub mod session;
pub mod tools;

pub mod engine;

pub mod cli;
pub mod config;
pub mod prompt;
pub mod repl;

// Re-export commonly used types
pub use errors::{ArchitectError, Result};
