//! Repository tree listing with TTL cache
//!
//! Fetches the recursive file tree for a repository and caches it to
//! respect GitHub's unauthenticated rate limit (60 req/hr). Staleness is
//! purely timestamp-based; no conditional requests are issued.

use crate::errors::{ArchitectError, Result};
use crate::librarian::repos::RepoConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

/// Prefix for tree cache keys
pub const CACHE_PREFIX: &str = "mission-architect-tree-";

/// Cache lifetime: 24 hours
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tree entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// One entry of a repository's recursive listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// '/'-separated path from the repository root
    pub path: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    /// Final path segment
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Tree listing as returned by the upstream endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeEntry>,

    /// Upstream sets this when the listing was cut short (repo too large).
    /// A truncated listing is still usable, just possibly incomplete.
    #[serde(default)]
    pub truncated: bool,
}

/// Cached tree record: listing plus fetch time (epoch millis)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTree {
    timestamp: i64,
    tree: Vec<TreeEntry>,
}

/// Key-value store for cached tree listings
///
/// Writes are best-effort: the cache layer swallows put failures and
/// serves the freshly fetched entries regardless.
pub trait TreeStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// In-memory store, shared across resolver calls for the process lifetime
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeStore for MemoryTreeStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut records) = self.records.write() {
            records.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut records) = self.records.write() {
            records.remove(key);
        }
    }
}

/// File-backed store: one JSON blob per key under a cache directory
#[derive(Debug, Clone)]
pub struct FileTreeStore {
    dir: PathBuf,
}

impl FileTreeStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain only repo coordinates, but keep filenames safe
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl TreeStore for FileTreeStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// Network boundary for GitHub fetches
///
/// Abstracted so the cache and librarian can be exercised against
/// scripted transports in tests.
#[async_trait]
pub trait GitHubTransport: Send + Sync {
    /// Fetch the recursive tree listing for a repository
    async fn fetch_tree(&self, config: &RepoConfig) -> Result<TreeResponse>;

    /// Fetch raw file content from an absolute URL
    async fn fetch_raw(&self, url: &str) -> Result<String>;
}

/// Real transport over reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mission-architect/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ArchitectError::HttpError)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GitHubTransport for HttpTransport {
    async fn fetch_tree(&self, config: &RepoConfig) -> Result<TreeResponse> {
        let response = self.client.get(config.tree_url()).send().await?;
        let status = response.status().as_u16();

        if status == 403 || status == 429 {
            return Err(ArchitectError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ArchitectError::Upstream { status });
        }

        Ok(response.json::<TreeResponse>().await?)
    }

    async fn fetch_raw(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ArchitectError::RawFetch {
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// TTL cache over the tree listing endpoint
pub struct TreeCache {
    store: Box<dyn TreeStore>,
    ttl: Duration,
    verbose: bool,
}

impl TreeCache {
    /// Create a cache with the default 24h TTL
    pub fn new(store: Box<dyn TreeStore>) -> Self {
        Self {
            store,
            ttl: CACHE_TTL,
            verbose: false,
        }
    }

    /// Override the TTL (tests)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable verbose diagnostics
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Return the tree listing for a repository, from cache when fresh.
    ///
    /// Cache corruption is treated as a miss: the record is cleared and a
    /// refetch is issued. Store write failures are swallowed; the fetched
    /// entries are returned either way.
    pub async fn get_tree(
        &self,
        transport: &dyn GitHubTransport,
        config: &RepoConfig,
    ) -> Result<Vec<TreeEntry>> {
        let key = config.cache_key();

        if let Some(blob) = self.store.get(&key) {
            match serde_json::from_str::<CachedTree>(&blob) {
                Ok(cached) if self.is_fresh(cached.timestamp) => {
                    if self.verbose {
                        eprintln!("[CACHE] Loaded {} tree from cache.", config.repo);
                    }
                    return Ok(cached.tree);
                }
                Ok(_) => {
                    // Expired: fall through to refetch, record will be overwritten
                }
                Err(_) => {
                    if self.verbose {
                        eprintln!("[CACHE] Invalid cache record, clearing.");
                    }
                    self.store.remove(&key);
                }
            }
        }

        if self.verbose {
            eprintln!(
                "[CACHE] Fetching fresh tree for {}/{}...",
                config.repo, config.branch
            );
        }

        let response = transport.fetch_tree(config).await?;

        if response.truncated {
            eprintln!(
                "[CACHE] Warning: repository tree for {} is truncated upstream (too large).",
                config.repo
            );
        }

        let record = CachedTree {
            timestamp: chrono::Utc::now().timestamp_millis(),
            tree: response.tree.clone(),
        };
        match serde_json::to_string(&record) {
            Ok(blob) => {
                if self.store.put(&key, &blob).is_err() && self.verbose {
                    eprintln!("[CACHE] Failed to cache tree (storage quota).");
                }
            }
            Err(_) => {
                if self.verbose {
                    eprintln!("[CACHE] Failed to serialize tree record.");
                }
            }
        }

        Ok(response.tree)
    }

    fn is_fresh(&self, timestamp_millis: i64) -> bool {
        let age = chrono::Utc::now().timestamp_millis() - timestamp_millis;
        age >= 0 && (age as u128) < self.ttl.as_millis()
    }
}
