//! Capability registry with declaration schemas
//!
//! Maintains the registry of capabilities offered to the model, with the
//! parameter schemas shipped in every session request.
//!
//! Capabilities:
//! - get_framework_docs: fetch raw Lua source from MOOSE or DML
//! - get_sse_docs: fetch Hard Deck SSE definitions

use serde_json::{json, Value};
use std::collections::HashMap;

/// Capability name: framework source fetch
pub const FRAMEWORK_DOCS: &str = "get_framework_docs";

/// Capability name: Hard Deck definitions
pub const SSE_DOCS: &str = "get_sse_docs";

/// Capability declaration
#[derive(Debug, Clone)]
pub struct CapabilitySchema {
    /// Capability name
    pub name: String,

    /// Description shown to the model
    pub description: String,

    /// Parameter schema
    pub parameters: Value,
}

impl CapabilitySchema {
    /// Create new capability schema
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Capability registry
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    /// Map of capability name to schema
    capabilities: HashMap<String, CapabilitySchema>,
}

impl CapabilityRegistry {
    /// Create new registry with all capabilities
    pub fn new() -> Self {
        let mut registry = Self {
            capabilities: HashMap::new(),
        };

        registry.register_framework_docs();
        registry.register_sse_docs();

        registry
    }

    /// Register get_framework_docs
    fn register_framework_docs(&mut self) {
        let schema = CapabilitySchema::new(
            FRAMEWORK_DOCS,
            "Fetches RAW LUA SOURCE CODE from the official GitHub repositories (MOOSE or DML). \
             Use this to analyze function definitions and header comments directly. \
             Semantic Compression is applied to large files.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "framework": {
                        "type": "STRING",
                        "description": "Framework name ('MOOSE' or 'DML').",
                        "enum": ["MOOSE", "DML"]
                    },
                    "module_name": {
                        "type": "STRING",
                        "description": "Name of the module/class to search for (e.g., 'Airboss', 'cloneZones'). The system performs a fuzzy search on the file tree."
                    },
                    "branch": {
                        "type": "STRING",
                        "description": "Required for MOOSE. 'STABLE' (Master) or 'DEVELOP'. Default is DEVELOP.",
                        "enum": ["STABLE", "DEVELOP"]
                    }
                },
                "required": ["framework", "module_name"]
            }),
        );
        self.capabilities.insert(FRAMEWORK_DOCS.to_string(), schema);
    }

    /// Register get_sse_docs
    fn register_sse_docs(&mut self) {
        let schema = CapabilitySchema::new(
            SSE_DOCS,
            "Fetches the Safe Standard Scripting Engine (SSE) Hard Deck Definitions. \
             Use this when the user needs to use standard DCS classes like Group, Unit, \
             Timer, or Trigger. Do not rely on training data for these classes.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "category": {
                        "type": "STRING",
                        "description": "The SSE Class category to retrieve.",
                        "enum": ["Group", "Unit", "trigger", "timer", "coalition", "All"]
                    }
                },
                "required": ["category"]
            }),
        );
        self.capabilities.insert(SSE_DOCS.to_string(), schema);
    }

    /// Get capability schema by name
    pub fn get(&self, name: &str) -> Option<&CapabilitySchema> {
        self.capabilities.get(name)
    }

    /// Check if capability exists
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Get all capability names
    pub fn names(&self) -> Vec<String> {
        self.capabilities.keys().cloned().collect()
    }

    /// Get total number of capabilities
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Build the tools payload shipped with every session request
    pub fn declarations(&self) -> Value {
        // Stable order: framework docs first
        let mut declarations = Vec::new();
        for name in [FRAMEWORK_DOCS, SSE_DOCS] {
            if let Some(schema) = self.capabilities.get(name) {
                declarations.push(json!({
                    "name": schema.name,
                    "description": schema.description,
                    "parameters": schema.parameters
                }));
            }
        }
        json!([{ "functionDeclarations": declarations }])
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
