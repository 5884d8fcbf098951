//! The strategy's repo-surface helper (spec §4.H execute handler step 4:
//! "commit, push, open PR (or push to existing branch) via the Strategy's
//! repo-surface helper"). Git execution and PR creation are themselves
//! non-goals of the core (spec §1) — this trait is the named seam the
//! dispatcher calls through; a real implementation shells out to `git` and
//! the forge's API, which live outside this specification.

use async_trait::async_trait;

use crate::error::AgentError;

#[derive(Clone, Debug, Default)]
pub struct PullRequestHandle {
    pub url: String,
    pub number: i64,
    pub branch_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct DiffStats {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}

#[async_trait]
pub trait RepoSurface: Send + Sync {
    /// Clones `repo` (owner/name) into `working_dir` at `branch` (the
    /// default branch for a new request, or the persisted `prBranchName`
    /// for a follow-up, spec §4.H step 2).
    async fn clone_at(
        &self,
        repo: &str,
        working_dir: &std::path::Path,
        branch: &str,
    ) -> Result<(), AgentError>;

    /// Commits and pushes the working tree on a fresh branch, then opens a
    /// PR against the repo's default branch.
    async fn open_pull_request(
        &self,
        working_dir: &std::path::Path,
        title: &str,
        body: &str,
    ) -> Result<PullRequestHandle, AgentError>;

    /// Commits and pushes to an existing branch (follow-up to an already-open
    /// PR); does not open a new PR (spec §4.H step 4, scenario 4).
    async fn push_to_existing(
        &self,
        working_dir: &std::path::Path,
        branch_name: &str,
    ) -> Result<DiffStats, AgentError>;
}

/// No-op repo surface for tests and for deployments that haven't wired a
/// real git/forge implementation yet. Never mutates anything on disk.
#[derive(Default)]
pub struct NoopRepoSurface;

#[async_trait]
impl RepoSurface for NoopRepoSurface {
    async fn clone_at(
        &self,
        _repo: &str,
        working_dir: &std::path::Path,
        _branch: &str,
    ) -> Result<(), AgentError> {
        std::fs::create_dir_all(working_dir)
            .map_err(|e| AgentError::Execution(format!("create working dir: {e}")))
    }

    async fn open_pull_request(
        &self,
        _working_dir: &std::path::Path,
        title: &str,
        _body: &str,
    ) -> Result<PullRequestHandle, AgentError> {
        Ok(PullRequestHandle {
            url: format!("https://example.invalid/pr/{title}"),
            number: 1,
            branch_name: "warden/noop".to_string(),
        })
    }

    async fn push_to_existing(
        &self,
        _working_dir: &std::path::Path,
        _branch_name: &str,
    ) -> Result<DiffStats, AgentError> {
        Ok(DiffStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_clone_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let surface = NoopRepoSurface;
        surface.clone_at("acme/api", &target, "main").await.unwrap();
        assert!(target.exists());
    }
}
