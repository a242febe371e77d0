use serde::Serialize;

/// Parsed target of a run: either an existing pull request or a
/// two-branch comparison with no pull request behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    PullRequest {
        owner: String,
        repo: String,
        number: u64,
    },
    Compare {
        owner: String,
        repo: String,
        base: String,
        head: String,
    },
}

/// Metadata about a pull request fetched from the GitHub API.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    /// PR number (e.g., 42)
    pub number: u64,
    /// Current PR title
    pub title: String,
    /// Current PR body, absent when the author left it empty
    pub body: Option<String>,
    /// Canonical browser URL of the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
}

/// One changed file as reported by the GitHub API. Serialized verbatim
/// into the generation prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedFile {
    /// File path (e.g., "src/auth/config.rs")
    pub path: String,
    /// Change status reported by the host ("added", "modified", ...)
    pub status: String,
    /// Lines added in this file
    pub additions: u64,
    /// Lines deleted in this file
    pub deletions: u64,
    /// Total changed lines
    pub changes: u64,
    /// Unified-diff excerpt, truncated to bound prompt size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Maximum characters of patch text kept per file.
pub const PATCH_EXCERPT_LIMIT: usize = 1000;

/// Truncate a raw patch to the excerpt limit, counting characters rather
/// than bytes so multibyte patches never split a boundary.
pub fn truncate_patch(patch: String) -> String {
    if patch.chars().count() <= PATCH_EXCERPT_LIMIT {
        patch
    } else {
        patch.chars().take(PATCH_EXCERPT_LIMIT).collect()
    }
}
