//! The Librarian: on-demand framework documentation
//!
//! Resolves a framework/module query to real Lua source fetched from
//! GitHub: maps the framework to a repository, obtains the (cached) file
//! tree, fuzzy-resolves the module to a file, downloads the raw content,
//! and compresses oversized files into skeleton form.
//!
//! Every failure is returned as inline `ERROR:` text rather than a fault:
//! the result re-enters the conversation as content the model reads, so
//! the loop must keep going with the model informed.

pub mod compressor;
pub mod harddeck;
pub mod repos;
pub mod resolver;
pub mod tree;

pub use compressor::{LuaCompressor, COMPRESSION_THRESHOLD, HIDDEN_BODY};
pub use repos::RepoConfig;
pub use resolver::ResolvedModule;
pub use tree::{
    EntryKind, FileTreeStore, GitHubTransport, HttpTransport, MemoryTreeStore, TreeCache,
    TreeEntry, TreeStore,
};

use crate::errors::ArchitectError;
use std::sync::Arc;

/// Documentation resolver over the tree cache, fuzzy matcher, and
/// compressor
pub struct Librarian {
    transport: Arc<dyn GitHubTransport>,
    cache: TreeCache,
    compressor: LuaCompressor,
    verbose: bool,
}

impl Librarian {
    pub fn new(transport: Arc<dyn GitHubTransport>, store: Box<dyn TreeStore>) -> Self {
        Self {
            transport,
            cache: TreeCache::new(store),
            compressor: LuaCompressor::new(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self.cache = self.cache.with_verbose(verbose);
        self.compressor = self.compressor.clone().with_verbose(verbose);
        self
    }

    /// Fetch (possibly compressed) source for a module of a framework.
    ///
    /// The returned string is either the annotated source or an `ERROR:`
    /// line; it is fed back to the model verbatim either way.
    pub async fn get_framework_docs(
        &self,
        framework: &str,
        module_name: &str,
        branch: Option<&str>,
    ) -> String {
        let branch_label = branch.unwrap_or(repos::DEFAULT_BRANCH_LABEL);

        let config = match repos::lookup(framework, branch_label) {
            Some(config) => config,
            None => {
                return format!(
                    "ERROR: Invalid Framework/Branch configuration: {} [{}]",
                    framework, branch_label
                );
            }
        };

        let entries = match self.cache.get_tree(self.transport.as_ref(), &config).await {
            Ok(entries) => entries,
            Err(e) => return format!("ERROR: {}", e),
        };

        let entry = match resolver::find_in_tree(&entries, module_name) {
            Some(entry) => entry,
            None => {
                let suggestions = resolver::suggest(&entries, module_name);
                return format!(
                    "ERROR: Module '{}' not found in {}. Did you mean: {}?",
                    module_name,
                    config.repo,
                    suggestions.join(", ")
                );
            }
        };

        let module = ResolvedModule::new(&config, &entry.path);
        if self.verbose {
            eprintln!("[LIBRARIAN] Fetching raw source: {}", module.raw_url);
        }

        let mut content = match self.transport.fetch_raw(&module.raw_url).await {
            Ok(content) => content,
            Err(e @ ArchitectError::RawFetch { .. }) => return format!("ERROR: {}", e),
            Err(e) => return format!("ERROR: Librarian System Exception: {}", e),
        };

        let original_size = content.len();
        if self
            .compressor
            .should_compress(&module.file_path, original_size)
        {
            if self.verbose {
                eprintln!(
                    "[LIBRARIAN] Compressing {} ({} bytes)...",
                    module.file_path, original_size
                );
            }
            content = self.compressor.compress(&content);
        } else if self.verbose {
            eprintln!(
                "[LIBRARIAN] Skipping compression for {} (size: {})",
                module.file_path, original_size
            );
        }

        format!(
            "[Librarian Source Metadata]\n\
             Repo: {}/{}\n\
             Branch: {}\n\
             File: {}\n\
             Original Size: {} bytes\n\
             Raw URL: {}\n\
             --------------------------------------------------\n\
             {}",
            config.owner, config.repo, config.branch, module.file_path, original_size,
            module.raw_url, content
        )
    }
}
