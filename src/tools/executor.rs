//! Capability dispatch
//!
//! Routes a capability invocation to its handler and produces exactly one
//! text result per invocation. Fingerprinting lives here too: the engine
//! uses it to suppress duplicate executions within one send.

use crate::librarian::{harddeck, Librarian};
use crate::tools::registry::{FRAMEWORK_DOCS, SSE_DOCS};
use crate::types::{CapabilityInvocation, InvocationResult};
use std::collections::BTreeMap;

/// Notice substituted for a repeated framework-docs invocation
pub const DUPLICATE_DOCS_NOTICE: &str = "SYSTEM ALERT: You have already fetched this module. \
     Do not fetch it again. Use the data previously provided.";

/// Notice substituted for a repeated Hard Deck invocation
pub const DUPLICATE_SSE_NOTICE: &str =
    "SYSTEM ALERT: SSE Definitions for this category are already in context.";

/// Executes capability invocations against the Librarian and Hard Deck
pub struct CapabilityExecutor {
    librarian: Librarian,
    verbose: bool,
}

impl CapabilityExecutor {
    pub fn new(librarian: Librarian) -> Self {
        Self {
            librarian,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Normalized identity of an invocation, for duplicate suppression.
    ///
    /// Framework fetches normalize to upper case so `airboss` and
    /// `Airboss` collapse to one fetch; Hard Deck categories are already
    /// schema-constrained.
    pub fn fingerprint(&self, call: &CapabilityInvocation) -> String {
        match call.name.as_str() {
            FRAMEWORK_DOCS => format!(
                "{}:{}:{}",
                call.arg_str("framework"),
                call.arg_str("module_name"),
                call.arg_opt("branch").unwrap_or("")
            )
            .to_uppercase(),
            SSE_DOCS => format!("SSE:{}", call.arg_str("category")),
            other => {
                // Unknown capability: args in key order keep this stable
                let args: BTreeMap<&String, &serde_json::Value> = call.args.iter().collect();
                format!(
                    "{}:{}",
                    other,
                    serde_json::to_string(&args).unwrap_or_default()
                )
            }
        }
    }

    /// Notice text substituted when an invocation repeats within one send
    pub fn duplicate_notice(&self, call: &CapabilityInvocation) -> String {
        match call.name.as_str() {
            SSE_DOCS => DUPLICATE_SSE_NOTICE.to_string(),
            _ => DUPLICATE_DOCS_NOTICE.to_string(),
        }
    }

    /// Execute one invocation and package its result.
    ///
    /// Never fails: handler-level problems come back as `ERROR:` text the
    /// model reads on the next turn.
    pub async fn execute(&self, call: &CapabilityInvocation) -> InvocationResult {
        if self.verbose {
            eprintln!("[ENGINE] Executing capability: {}", call.name);
        }

        let result = match call.name.as_str() {
            FRAMEWORK_DOCS => {
                self.librarian
                    .get_framework_docs(
                        call.arg_str("framework"),
                        call.arg_str("module_name"),
                        call.arg_opt("branch"),
                    )
                    .await
            }
            SSE_DOCS => harddeck::lookup(call.arg_str("category")),
            other => format!("ERROR: Unknown capability: {}", other),
        };

        InvocationResult {
            id: call.id.clone(),
            name: call.name.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ArchitectError, Result};
    use crate::librarian::{GitHubTransport, MemoryTreeStore, RepoConfig};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct EmptyTransport;

    #[async_trait]
    impl GitHubTransport for EmptyTransport {
        async fn fetch_tree(
            &self,
            _config: &RepoConfig,
        ) -> Result<crate::librarian::tree::TreeResponse> {
            Ok(crate::librarian::tree::TreeResponse {
                tree: vec![],
                truncated: false,
            })
        }

        async fn fetch_raw(&self, url: &str) -> Result<String> {
            Err(ArchitectError::RawFetch {
                url: url.to_string(),
            })
        }
    }

    fn executor() -> CapabilityExecutor {
        CapabilityExecutor::new(Librarian::new(
            Arc::new(EmptyTransport),
            Box::new(MemoryTreeStore::new()),
        ))
    }

    fn docs_call(framework: &str, module: &str, branch: Option<&str>) -> CapabilityInvocation {
        let mut args = HashMap::new();
        args.insert("framework".to_string(), serde_json::json!(framework));
        args.insert("module_name".to_string(), serde_json::json!(module));
        if let Some(branch) = branch {
            args.insert("branch".to_string(), serde_json::json!(branch));
        }
        CapabilityInvocation {
            id: Some("call-1".to_string()),
            name: FRAMEWORK_DOCS.to_string(),
            args,
        }
    }

    #[test]
    fn test_fingerprint_normalizes_case() {
        let exec = executor();
        let a = exec.fingerprint(&docs_call("moose", "airboss", Some("develop")));
        let b = exec.fingerprint(&docs_call("MOOSE", "Airboss", Some("DEVELOP")));
        assert_eq!(a, b);
        assert_eq!(a, "MOOSE:AIRBOSS:DEVELOP");
    }

    #[test]
    fn test_fingerprint_missing_branch() {
        let exec = executor();
        let fp = exec.fingerprint(&docs_call("MOOSE", "Airboss", None));
        assert_eq!(fp, "MOOSE:AIRBOSS:");
    }

    #[test]
    fn test_sse_fingerprint_and_notice() {
        let exec = executor();
        let mut args = HashMap::new();
        args.insert("category".to_string(), serde_json::json!("timer"));
        let call = CapabilityInvocation {
            id: None,
            name: SSE_DOCS.to_string(),
            args,
        };

        assert_eq!(exec.fingerprint(&call), "SSE:timer");
        assert_eq!(exec.duplicate_notice(&call), DUPLICATE_SSE_NOTICE);
    }

    #[tokio::test]
    async fn test_sse_dispatch() {
        let exec = executor();
        let mut args = HashMap::new();
        args.insert("category".to_string(), serde_json::json!("Group"));
        let call = CapabilityInvocation {
            id: Some("call-9".to_string()),
            name: SSE_DOCS.to_string(),
            args,
        };

        let result = exec.execute(&call).await;
        assert_eq!(result.id.as_deref(), Some("call-9"));
        assert_eq!(result.name, SSE_DOCS);
        assert!(result.result.contains("Group.getByName"));
    }

    #[tokio::test]
    async fn test_unknown_capability_reports_error() {
        let exec = executor();
        let call = CapabilityInvocation {
            id: None,
            name: "format_disk".to_string(),
            args: HashMap::new(),
        };

        let result = exec.execute(&call).await;
        assert_eq!(result.result, "ERROR: Unknown capability: format_disk");
    }
}
