// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reconciliation state machine.
//!
//! To __herd__ a working copy is to bring it to the state its manifest entry
//! describes. A missing working copy is created from scratch inside a
//! [`CreatedDir`] scope, so a failed clone never leaves a half-initialized
//! directory behind. An existing working copy is reconciled in place and is
//! never deleted, no matter what fails.
//!
//! A handle built [`Repo::with_upstream`] keeps a second remote next to the
//! primary one. Tags missing on the primary remote are taken from it, and a
//! missing tag is only fatal once neither remote carries it.

use crate::repo::{git::gitcall, scope::CreatedDir, GitRef, Repo, RepoError, Result};

use git2::Repository;
use tracing::{info, instrument, warn};

impl Repo {
    /// Reconcile working copy with its default ref.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::MissingRef`] if a fresh clone cannot find its
    ///   branch on the remote, or its tag on any remote. The directory is
    ///   removed.
    /// - Return [`RepoError::UnknownRef`] if the default ref is unknown.
    /// - Return [`RepoError::RemoteUrlConflict`] if the remote name is taken
    ///   by another URL.
    /// - Return [`RepoError::TrackingConflict`] if the local branch diverged
    ///   from an untracked remote branch of the same name.
    /// - Return [`RepoError::Git`] if any git invocation fails.
    #[instrument(skip(self, url), level = "debug")]
    pub async fn herd(&self, url: &str, depth: u32, rebase: bool) -> Result<()> {
        let reference = self.default_ref.clone();
        if self.exists() {
            self.reconcile_remotes(&self.desired_remotes(url))?;
            self.herd_existing(&reference, depth, rebase).await?;
        } else {
            self.herd_fresh(url, &reference, depth).await?;
        }

        self.update_submodules(depth).await
    }

    /// Reconcile working copy with branch `branch`.
    ///
    /// Falls back to [`Repo::herd`] against the default ref if neither the
    /// remote nor the working copy carries the branch, so a stale feature
    /// branch degrades to the default ref rather than failing.
    #[instrument(skip(self, url), level = "debug")]
    pub async fn herd_branch(&self, url: &str, branch: &str, depth: u32, rebase: bool) -> Result<()> {
        let reference = GitRef::branch(branch);
        if !self.exists() {
            return match self.herd_fresh(url, &reference, depth).await {
                Err(error @ (RepoError::MissingRef { .. } | RepoError::Git { .. })) => {
                    warn!("{error}");
                    self.fall_back(url, depth, rebase).await
                }
                result => {
                    result?;
                    self.update_submodules(depth).await
                }
            };
        }

        self.reconcile_remotes(&self.desired_remotes(url))?;
        let on_remote = self.remote_has_ref(&self.remote, &reference).await?;
        if !on_remote && !self.has_local_branch(branch)? {
            warn!("branch {branch:?} does not exist on remote {:?}", self.remote);
            return self.fall_back(url, depth, rebase).await;
        }

        // INVARIANT: Only name the branch in the fetch if the remote has it.
        let fetched = on_remote.then_some(&reference);
        self.fetch(&self.remote, fetched, depth).await?;
        self.settle_branch(branch, rebase).await?;
        self.update_submodules(depth).await
    }

    /// Reconcile working copy with tag `tag`.
    ///
    /// Falls back to [`Repo::herd`] against the default ref if no remote
    /// carries the tag.
    #[instrument(skip(self, url), level = "debug")]
    pub async fn herd_tag(&self, url: &str, tag: &str, depth: u32, rebase: bool) -> Result<()> {
        let reference = GitRef::tag(tag);
        if !self.exists() {
            return match self.herd_fresh(url, &reference, depth).await {
                Err(error @ RepoError::MissingRef { .. }) => {
                    warn!("{error}");
                    self.fall_back(url, depth, rebase).await
                }
                result => {
                    result?;
                    self.update_submodules(depth).await
                }
            };
        }

        self.reconcile_remotes(&self.desired_remotes(url))?;
        let Some(remote) = self.tag_remote(&reference).await? else {
            warn!("tag {tag:?} does not exist on remote {:?}", self.remote);
            return self.fall_back(url, depth, rebase).await;
        };

        self.fetch(remote, Some(&reference), depth).await?;
        self.checkout_detached(&reference).await?;
        self.update_submodules(depth).await
    }

    /// Fetch from `remote`.
    ///
    /// Full history with every tag when `depth` is zero. Otherwise only
    /// `reference` is fetched, at `depth` commits of history. The remote
    /// tracking refs are updated either way.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, remote: &str, reference: Option<&GitRef>, depth: u32) -> Result<()> {
        let mut args = vec!["fetch".to_string(), remote.to_string()];
        match (reference, depth) {
            (_, 0) => info!(" - Fetch from {remote}"),
            (None, depth) => {
                info!(" - Fetch from {remote} with depth {depth}");
                args.push(format!("--depth={depth}"));
            }
            (Some(reference), depth) => {
                info!(" - Fetch from {remote} {} with depth {depth}", reference.short_name());
                args.push(refspec(reference));
                args.push(format!("--depth={depth}"));
            }
        }
        args.extend(["--prune".to_string(), "--tags".to_string()]);

        let output = gitcall(&self.path, args).await?;
        if !output.is_empty() {
            info!("{output}");
        }

        Ok(())
    }

    /// Check out `reference` detached, unless HEAD already sits on it.
    pub(crate) async fn checkout_detached(&self, reference: &GitRef) -> Result<()> {
        let target = reference.full_name();
        if self.is_detached()? && self.current_commit(false)? == self.resolve_commit(&target)? {
            info!(" - On correct commit");
            return Ok(());
        }

        info!(" - Check out {target}");
        self.ensure_no_changes(&format!("check out {target}"))?;
        gitcall(&self.path, ["checkout", target.as_str()]).await?;

        Ok(())
    }

    /// Check out local branch `branch`, unless it is already checked out.
    pub(crate) async fn checkout_branch(&self, branch: &str) -> Result<()> {
        if self.is_on_branch(branch)? {
            info!(" - Branch {branch} already checked out");
            return Ok(());
        }

        info!(" - Check out branch {branch}");
        self.ensure_no_changes(&format!("check out branch {branch}"))?;
        gitcall(&self.path, ["checkout", branch]).await?;

        Ok(())
    }

    /// Create local branch `branch` tracking `<remote>/<branch>` and check
    /// it out.
    pub(crate) async fn checkout_tracking(&self, remote: &str, branch: &str) -> Result<()> {
        if !self.has_remote_branch(remote, branch)? {
            return Err(self.missing_ref(remote, &GitRef::branch(branch)));
        }

        info!(" - Create branch {branch} tracking {remote}/{branch}");
        let upstream = format!("{remote}/{branch}");
        gitcall(
            &self.path,
            ["checkout", "--track", "-b", branch, upstream.as_str()],
        )
        .await?;

        Ok(())
    }

    /// Check out the default ref, creating its local branch if needed.
    pub(crate) async fn checkout_default(&self) -> Result<()> {
        match &self.default_ref {
            GitRef::Branch(branch) if self.has_local_branch(branch)? => {
                self.checkout_branch(branch).await
            }
            GitRef::Branch(branch) => {
                self.ensure_no_changes(&format!("check out branch {branch}"))?;
                self.checkout_tracking(&self.remote, branch).await
            }
            reference @ (GitRef::Tag(_) | GitRef::Commit(_)) => {
                self.checkout_detached(reference).await
            }
            reference @ GitRef::Unknown(_) => Err(self.unknown_ref(reference)),
        }
    }

    /// Bring checked out branch in line with its remote counterpart.
    ///
    /// The remote must have been fetched already.
    pub(crate) async fn settle_branch(&self, branch: &str, rebase: bool) -> Result<()> {
        if !self.has_local_branch(branch)? {
            self.ensure_no_changes(&format!("check out branch {branch}"))?;
            return self.checkout_tracking(&self.remote, branch).await;
        }

        self.checkout_branch(branch).await?;
        if !self.has_remote_branch(&self.remote, branch)? {
            info!(" - No remote branch {}/{branch}", self.remote);
            return Ok(());
        }

        self.ensure_tracking(&self.remote, branch)?;
        self.pull(&self.remote, branch, rebase).await
    }

    async fn herd_fresh(&self, url: &str, reference: &GitRef, depth: u32) -> Result<()> {
        info!(" - Initialize repository at {:?}", self.path.display());
        let scope = CreatedDir::create(&self.path)?;
        if let Err(error) = self.init_with_remotes(url) {
            return scope.finish(Err(error));
        }

        match reference {
            GitRef::Unknown(_) => scope.keep(Err(self.unknown_ref(reference))),
            known => scope.finish(self.clone_ref(known, depth).await),
        }
    }

    async fn clone_ref(&self, reference: &GitRef, depth: u32) -> Result<()> {
        match reference {
            GitRef::Branch(branch) => {
                self.require_remote_ref(reference).await?;
                self.fetch(&self.remote, Some(reference), depth).await?;
                self.checkout_tracking(&self.remote, branch).await
            }
            GitRef::Tag(_) => self.fetch_tag(reference, depth).await,
            GitRef::Commit(sha) => {
                self.fetch(&self.remote, None, depth).await?;
                info!(" - Check out commit {sha}");
                gitcall(&self.path, ["checkout", sha.as_str()]).await?;
                Ok(())
            }
            GitRef::Unknown(_) => Err(self.unknown_ref(reference)),
        }
    }

    async fn herd_existing(&self, reference: &GitRef, depth: u32, rebase: bool) -> Result<()> {
        match reference {
            GitRef::Branch(branch) => {
                self.fetch(&self.remote, Some(reference), depth).await?;
                self.settle_branch(branch, rebase).await
            }
            GitRef::Tag(_) => self.fetch_tag(reference, depth).await,
            GitRef::Commit(_) => {
                self.fetch(&self.remote, None, depth).await?;
                self.checkout_detached(reference).await
            }
            GitRef::Unknown(_) => Err(self.unknown_ref(reference)),
        }
    }

    async fn fall_back(&self, url: &str, depth: u32, rebase: bool) -> Result<()> {
        info!(" - Fall back to {}", self.default_ref);
        self.herd(url, depth, rebase).await
    }

    async fn require_remote_ref(&self, reference: &GitRef) -> Result<()> {
        if self.remote_has_ref(&self.remote, reference).await? {
            return Ok(());
        }

        Err(self.missing_ref(&self.remote, reference))
    }

    /// Fetch tag `reference` from whichever remote carries it and check it
    /// out detached.
    async fn fetch_tag(&self, reference: &GitRef, depth: u32) -> Result<()> {
        let Some(remote) = self.tag_remote(reference).await? else {
            return Err(self.missing_ref(&self.remote, reference));
        };

        self.fetch(remote, Some(reference), depth).await?;
        self.checkout_detached(reference).await
    }

    /// Name of the remote carrying tag `reference`, primary remote first.
    async fn tag_remote(&self, reference: &GitRef) -> Result<Option<&str>> {
        if self.remote_has_ref(&self.remote, reference).await? {
            return Ok(Some(self.remote.as_str()));
        }

        let Some((upstream, _)) = &self.upstream else {
            return Ok(None);
        };

        if self.remote_has_ref(upstream, reference).await? {
            warn!("{reference} missing on remote {:?}, taking it from {upstream:?}", self.remote);
            return Ok(Some(upstream.as_str()));
        }

        Ok(None)
    }

    fn init_with_remotes(&self, url: &str) -> Result<()> {
        let repository = Repository::init(&self.path)?;
        for (name, url) in self.desired_remotes(url) {
            info!(" - Create remote {name} {url}");
            repository.remote(name, url)?;
        }

        Ok(())
    }

    /// Check if HEAD is attached to local branch `branch`.
    pub(crate) fn is_on_branch(&self, branch: &str) -> Result<bool> {
        let repository = self.open()?;
        let on_branch = match repository.head() {
            Ok(head) => head.is_branch() && head.shorthand() == Some(branch),
            Err(_) => false,
        };

        Ok(on_branch)
    }

    fn resolve_commit(&self, target: &str) -> Result<String> {
        let repository = self.open()?;
        let commit = repository.revparse_single(target)?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}

fn refspec(reference: &GitRef) -> String {
    match reference {
        GitRef::Branch(branch) => branch.clone(),
        GitRef::Tag(tag) => format!("+refs/tags/{tag}:refs/tags/{tag}"),
        GitRef::Commit(sha) | GitRef::Unknown(sha) => sha.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn refspec_by_ref_kind() {
        assert_eq!(refspec(&GitRef::branch("main")), "main");
        assert_eq!(refspec(&GitRef::tag("v1")), "+refs/tags/v1:refs/tags/v1");
    }
}
