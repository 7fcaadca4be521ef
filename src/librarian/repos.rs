//! Framework to repository mapping
//!
//! Static table of the GitHub repositories backing each supported
//! scripting framework, one entry per (framework, branch-label) pair.

/// A concrete GitHub repository coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoConfig {
    pub owner: &'static str,
    pub repo: &'static str,
    pub branch: &'static str,
}

impl RepoConfig {
    /// Cache key for the tree listing of this repository
    pub fn cache_key(&self) -> String {
        format!(
            "{}{}-{}-{}",
            super::tree::CACHE_PREFIX,
            self.owner,
            self.repo,
            self.branch
        )
    }

    /// API URL for the recursive tree listing
    pub fn tree_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/git/trees/{}?recursive=1",
            self.owner, self.repo, self.branch
        )
    }

    /// Unauthenticated raw-content URL for a file in this repository
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner, self.repo, self.branch, path
        )
    }
}

const MOOSE_STABLE: RepoConfig = RepoConfig {
    owner: "FlightControl-Master",
    repo: "MOOSE",
    branch: "master",
};

const MOOSE_DEVELOP: RepoConfig = RepoConfig {
    owner: "FlightControl-Master",
    repo: "MOOSE",
    branch: "develop",
};

// DML publishes from 'main' only
const DML_MAIN: RepoConfig = RepoConfig {
    owner: "csofranz",
    repo: "DML",
    branch: "main",
};

/// Default MOOSE branch label when the model omits one
pub const DEFAULT_BRANCH_LABEL: &str = "DEVELOP";

/// Resolve a framework name and branch label to a repository coordinate.
///
/// Lookup is case-insensitive. DML requests collapse to its single `MAIN`
/// config regardless of the requested branch label.
pub fn lookup(framework: &str, branch_label: &str) -> Option<RepoConfig> {
    let fw = framework.trim().to_uppercase();
    let mut branch = branch_label.trim().to_uppercase();

    if fw == "DML" {
        branch = "MAIN".to_string();
    }

    match (fw.as_str(), branch.as_str()) {
        ("MOOSE", "STABLE") => Some(MOOSE_STABLE),
        ("MOOSE", "DEVELOP") => Some(MOOSE_DEVELOP),
        ("DML", "MAIN") => Some(DML_MAIN),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moose_branch_labels() {
        assert_eq!(lookup("MOOSE", "STABLE").unwrap().branch, "master");
        assert_eq!(lookup("MOOSE", "DEVELOP").unwrap().branch, "develop");
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("moose", "develop"), lookup("MOOSE", "DEVELOP"));
    }

    #[test]
    fn test_dml_collapses_branch() {
        // Any branch label maps to DML's single main config
        assert_eq!(lookup("DML", "DEVELOP").unwrap().branch, "main");
        assert_eq!(lookup("DML", "STABLE").unwrap().branch, "main");
        assert_eq!(lookup("DML", "MAIN").unwrap().branch, "main");
    }

    #[test]
    fn test_unknown_framework() {
        assert!(lookup("CTLD", "MAIN").is_none());
        assert!(lookup("MOOSE", "RELEASE").is_none());
    }

    #[test]
    fn test_urls() {
        let config = lookup("MOOSE", "DEVELOP").unwrap();
        assert_eq!(
            config.tree_url(),
            "https://api.github.com/repos/FlightControl-Master/MOOSE/git/trees/develop?recursive=1"
        );
        assert_eq!(
            config.raw_url("Moose Development/Moose/Ops/Airboss.lua"),
            "https://raw.githubusercontent.com/FlightControl-Master/MOOSE/develop/Moose Development/Moose/Ops/Airboss.lua"
        );
    }

    #[test]
    fn test_cache_key() {
        let config = lookup("DML", "MAIN").unwrap();
        assert_eq!(config.cache_key(), "mission-architect-tree-csofranz-DML-main");
    }
}
