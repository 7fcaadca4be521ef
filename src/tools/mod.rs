//! Capability surface exposed to the model
//!
//! Two named capabilities with enum-constrained arguments: framework
//! source fetch and Hard Deck definitions. Each invocation name selects a
//! handler with a statically known argument shape.

pub mod executor;
pub mod registry;

pub use executor::CapabilityExecutor;
pub use registry::{CapabilityRegistry, CapabilitySchema, FRAMEWORK_DOCS, SSE_DOCS};
