//! Fuzzy file resolution over a repository tree
//!
//! Layered best-effort matching of a human-style module name to a Lua
//! file, applied in fixed priority order: exact basename, path suffix,
//! then loose substring. Each tier short-circuits.

use crate::librarian::repos::RepoConfig;
use crate::librarian::tree::{EntryKind, TreeEntry};

/// Maximum number of suggestions offered when resolution fails
pub const MAX_SUGGESTIONS: usize = 5;

/// A resolved module: repository path plus its raw-content URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub file_path: String,
    pub raw_url: String,
}

impl ResolvedModule {
    pub fn new(config: &RepoConfig, path: &str) -> Self {
        Self {
            file_path: path.to_string(),
            raw_url: config.raw_url(path),
        }
    }
}

/// Normalize a module query: lowercase, trim, strip a trailing `.lua`
fn clean_query(query: &str) -> String {
    let q = query.trim().to_lowercase();
    q.strip_suffix(".lua").unwrap_or(&q).to_string()
}

/// Find the best-matching entry for a module query.
///
/// Matching tiers, first hit wins:
/// 1. exact basename (`<query>.lua` or `<query>`)
/// 2. path suffix (`.../<query>.lua`)
/// 3. loose substring over `.lua` blobs
pub fn find_in_tree<'a>(entries: &'a [TreeEntry], query: &str) -> Option<&'a TreeEntry> {
    let clean = clean_query(query);
    if clean.is_empty() {
        return None;
    }

    let exact_name = format!("{}.lua", clean);
    if let Some(hit) = entries.iter().find(|e| {
        let name = e.basename().to_lowercase();
        name == exact_name || name == clean
    }) {
        return Some(hit);
    }

    let suffix = format!("/{}.lua", clean);
    if let Some(hit) = entries
        .iter()
        .find(|e| e.path.to_lowercase().ends_with(&suffix))
    {
        return Some(hit);
    }

    // Loose tier: riskier, restricted to Lua blobs
    entries.iter().find(|e| {
        e.kind == EntryKind::Blob
            && e.path.ends_with(".lua")
            && e.path.to_lowercase().contains(&clean)
    })
}

/// Suggest up to [`MAX_SUGGESTIONS`] alternative paths for a failed query.
///
/// Filters entries whose path contains the first three characters of the
/// normalized query and ends in `.lua`, in listing order.
pub fn suggest(entries: &[TreeEntry], query: &str) -> Vec<String> {
    let clean = clean_query(query);
    let stem: String = clean.chars().take(3).collect();
    if stem.is_empty() {
        return Vec::new();
    }

    entries
        .iter()
        .filter(|e| e.path.to_lowercase().contains(&stem) && e.path.ends_with(".lua"))
        .take(MAX_SUGGESTIONS)
        .map(|e| e.path.clone())
        .collect()
}
