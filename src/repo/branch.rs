// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Branch lifecycle.
//!
//! Starting, tracking, pruning, and syncing branches of a working copy.
//! Tracking is only ever established between a local and a remote branch
//! that point at the same commit. A diverged pair is reported, never forced.

use crate::repo::{git::gitcall, GitRef, Repo, RepoError, Result};

use git2::BranchType;
use tracing::{info, instrument};

impl Repo {
    /// Start branch `branch` from HEAD, or check it out if it exists.
    ///
    /// When `tracking` is set, the branch is bound to `<remote>/<branch>`,
    /// pushing it first if the remote does not carry it yet. Nothing touches
    /// the network when `offline` is set, which also skips tracking.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::TrackingConflict`] if the remote carries a
    ///   branch of the same name on a different commit.
    /// - Return [`RepoError::Git`] if any git invocation fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn start(
        &self,
        remote: &str,
        branch: &str,
        depth: u32,
        tracking: bool,
        offline: bool,
    ) -> Result<()> {
        if self.has_local_branch(branch)? {
            info!(" - Branch {branch} already exists");
            self.checkout_branch(branch).await?;
        } else {
            if !offline {
                self.ensure_remote(remote)?;
                self.fetch(remote, None, depth).await?;
            }

            info!(" - Create branch {branch}");
            self.create_local_branch(branch)?;
            self.checkout_branch(branch).await?;
        }

        if tracking && !offline {
            self.track_remote_branch(remote, branch).await?;
        }

        Ok(())
    }

    /// Bind local branch `branch` to `<remote>/<branch>`.
    ///
    /// Existing tracking is left alone.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::TrackingConflict`] if both branches point at
    ///   different commits.
    pub fn ensure_tracking(&self, remote: &str, branch: &str) -> Result<()> {
        let repository = self.open()?;
        let mut local = repository.find_branch(branch, BranchType::Local)?;
        if local.upstream().is_ok() {
            info!(" - Tracking branch already exists");
            return Ok(());
        }

        let upstream = format!("{remote}/{branch}");
        let remote_commit = repository
            .find_branch(&upstream, BranchType::Remote)?
            .get()
            .target();
        if local.get().target() != remote_commit {
            return Err(RepoError::TrackingConflict {
                path: self.path.clone(),
                remote: remote.to_string(),
                branch: branch.to_string(),
            });
        }

        info!(" - Track {upstream}");
        local.set_upstream(Some(&upstream))?;

        Ok(())
    }

    /// Delete local branch `branch`.
    ///
    /// A checked out `branch` is left for the default ref first. Without
    /// `force`, git refuses to delete a branch with unmerged commits.
    #[instrument(skip(self), level = "debug")]
    pub async fn prune_local(&self, branch: &str, force: bool) -> Result<()> {
        if !self.has_local_branch(branch)? {
            info!(" - Local branch {branch} does not exist");
            return Ok(());
        }

        if self.is_on_branch(branch)? {
            self.checkout_default().await?;
        }

        info!(" - Delete local branch {branch}");
        let flag = if force { "-D" } else { "-d" };
        gitcall(&self.path, ["branch", flag, branch]).await?;

        Ok(())
    }

    /// Delete branch `branch` on `remote` through a push.
    #[instrument(skip(self), level = "debug")]
    pub async fn prune_remote(&self, remote: &str, branch: &str) -> Result<()> {
        self.ensure_remote(remote)?;
        if !self.remote_has_ref(remote, &GitRef::branch(branch)).await? {
            info!(" - Remote branch {remote}/{branch} does not exist");
            return Ok(());
        }

        info!(" - Delete remote branch {remote}/{branch}");
        gitcall(&self.path, ["push", remote, "--delete", branch]).await?;

        Ok(())
    }

    /// Merge or rebase `<remote>/<branch>` into the checked out branch.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::DetachedHeadUnexpected`] if HEAD is detached.
    pub async fn pull(&self, remote: &str, branch: &str, rebase: bool) -> Result<()> {
        if self.is_detached()? {
            return Err(RepoError::DetachedHeadUnexpected {
                path: self.path.clone(),
                action: format!("pull {remote}/{branch}"),
            });
        }

        let mode = if rebase { "--rebase" } else { "--no-rebase" };
        info!(" - Pull {remote}/{branch} ({})", mode.trim_start_matches('-'));
        let output = gitcall(&self.path, ["pull", mode, remote, branch]).await?;
        if !output.is_empty() {
            info!("{output}");
        }

        Ok(())
    }

    /// Bring the default branch up to date with `upstream`, then push it to
    /// `fork`.
    ///
    /// Nothing is pushed if pulling fails.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::UnsupportedRef`] if the default ref is not a
    ///   branch.
    #[instrument(skip(self), level = "debug")]
    pub async fn sync(&self, upstream: &str, fork: &str, rebase: bool) -> Result<()> {
        let GitRef::Branch(branch) = &self.default_ref else {
            return Err(RepoError::UnsupportedRef {
                path: self.path.clone(),
                action: "sync".into(),
                reference: self.default_ref.to_string(),
            });
        };

        self.ensure_remote(upstream)?;
        self.ensure_remote(fork)?;
        self.pull(upstream, branch, rebase).await?;

        info!(" - Push {branch} to {fork}");
        gitcall(&self.path, ["push", fork, branch.as_str()]).await?;

        Ok(())
    }

    async fn track_remote_branch(&self, remote: &str, branch: &str) -> Result<()> {
        if self.remote_has_ref(remote, &GitRef::branch(branch)).await? {
            self.fetch(remote, Some(&GitRef::branch(branch)), 0).await?;
            return self.ensure_tracking(remote, branch);
        }

        info!(" - Push {branch} to {remote}");
        gitcall(&self.path, ["push", "-u", remote, branch]).await?;

        Ok(())
    }

    fn create_local_branch(&self, branch: &str) -> Result<()> {
        let repository = self.open()?;
        let head = repository.head()?.peel_to_commit()?;
        repository.branch(branch, &head, false)?;

        Ok(())
    }
}
