// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository engine.
//!
//! A [`Repo`] binds one on-disk working copy to the remote and default ref it
//! should be reconciled against. Everything the engine knows about the
//! working copy is recomputed by inspection on each call. Nothing is cached,
//! because another process or an earlier step of the same command may have
//! changed it in between.
//!
//! # Split of Responsibilities
//!
//! Read-only inspection goes through libgit2, opened fresh per query and
//! never held across an `.await`. Network access and anything that rewrites
//! the work tree goes through the external `git` binary, see [`git`].
//!
//! # Submodules
//!
//! - [`refs`]: closed ref classification.
//! - [`herd`]: the reconciliation state machine.
//! - [`remotes`]: remote reconciliation by URL.
//! - [`branch`]: branch lifecycle, tracking, pruning, and syncing.
//! - [`maintain`]: resets, cleaning, stashing, and informational output.
//! - [`submodule`]: nested sub-repository handling.

pub mod branch;
pub mod herd;
pub mod maintain;
pub mod refs;
pub mod remotes;
pub mod submodule;

pub(crate) mod git;
pub(crate) mod scope;

pub use refs::GitRef;

use crate::repo::git::{gitcall, gitcall_any_line};

use git2::{BranchType, ErrorCode, Repository, RepositoryState, Status, StatusOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Working copy handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    path: PathBuf,
    remote: String,
    default_ref: GitRef,
    recursive: bool,
    upstream: Option<(String, String)>,
}

impl Repo {
    /// Construct new working copy handle.
    ///
    /// Does not touch the file system.
    pub fn new(path: impl Into<PathBuf>, remote: impl Into<String>, default_ref: GitRef) -> Self {
        Self {
            path: path.into(),
            remote: remote.into(),
            default_ref,
            recursive: false,
            upstream: None,
        }
    }

    /// Reconcile nested sub-repositories along with the working copy.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Second remote `remote` at `url` to keep alongside the primary one.
    ///
    /// It is created together with a fresh working copy and consulted for
    /// tags the primary remote does not carry.
    pub fn with_upstream(mut self, remote: impl Into<String>, url: impl Into<String>) -> Self {
        self.upstream = Some((remote.into(), url.into()));
        self
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn remote(&self) -> &str {
        self.remote.as_str()
    }

    pub fn default_ref(&self) -> &GitRef {
        &self.default_ref
    }

    /// Check if working copy exists, i.e., `<path>/.git` is present.
    pub fn exists(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Check if tracked files carry uncommitted changes.
    ///
    /// Untracked files and submodules are not considered here.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if libgit2 cannot read the status.
    pub fn has_changes(&self) -> Result<bool> {
        let repository = self.open()?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = repository.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != Status::CURRENT))
    }

    /// Check if a rebase was started and never finished.
    pub fn is_rebase_in_progress(&self) -> Result<bool> {
        Ok(matches!(
            self.open()?.state(),
            RepositoryState::Rebase
                | RepositoryState::RebaseInteractive
                | RepositoryState::RebaseMerge
                | RepositoryState::ApplyMailboxOrRebase
        ))
    }

    /// Check for at least one untracked or deleted file.
    ///
    /// Stops reading after the first line git prints.
    pub async fn has_untracked_files(&self) -> Result<bool> {
        gitcall_any_line(
            &self.path,
            ["ls-files", "-o", "-d", "--exclude-standard"],
        )
        .await
    }

    /// Check if working copy is dirty.
    ///
    /// A missing working copy is never dirty. Otherwise it is dirty when
    /// tracked files changed, a rebase is in progress, or anything is
    /// untracked.
    pub async fn is_dirty(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }

        if self.has_changes()? || self.is_rebase_in_progress()? {
            return Ok(true);
        }

        self.has_untracked_files().await
    }

    /// Check if working copy may be reconciled.
    ///
    /// Valid if it does not exist yet, or it is not dirty and none of its
    /// submodules are dirty.
    #[instrument(skip(self), level = "debug")]
    pub async fn is_valid(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }

        if self.is_dirty().await? {
            debug!("{:?} is dirty", self.path.display());
            return Ok(false);
        }

        Ok(!self.has_dirty_submodules()?)
    }

    /// Refuse `action` unless working copy is valid.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::InvalidState`] if working copy is not valid.
    pub async fn ensure_valid(&self, action: &str) -> Result<()> {
        if self.is_valid().await? {
            return Ok(());
        }

        Err(RepoError::InvalidState {
            path: self.path.clone(),
            action: action.to_string(),
        })
    }

    pub fn is_detached(&self) -> Result<bool> {
        Ok(self.open()?.head_detached()?)
    }

    /// Name of checked out branch.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::DetachedHeadUnexpected`] if HEAD is detached.
    pub fn current_branch(&self) -> Result<String> {
        let repository = self.open()?;
        if repository.head_detached()? {
            return Err(RepoError::DetachedHeadUnexpected {
                path: self.path.clone(),
                action: "read current branch".into(),
            });
        }

        let head = repository.head()?;
        Ok(head.shorthand().unwrap_or_default().to_string())
    }

    /// Commit id of HEAD, abbreviated when `short` is set.
    pub fn current_commit(&self, short: bool) -> Result<String> {
        let repository = self.open()?;
        let commit = repository.head()?.peel_to_commit()?;
        if short {
            let short_id = commit.as_object().short_id()?;
            return Ok(short_id.as_str().unwrap_or_default().to_string());
        }

        Ok(commit.id().to_string())
    }

    /// Branch name, or `detached @ <short sha>`.
    pub fn current_ref_description(&self) -> Result<String> {
        if self.is_detached()? {
            return Ok(format!("detached @ {}", self.current_commit(true)?));
        }

        self.current_branch()
    }

    /// Check for local branch `branch`.
    pub fn has_local_branch(&self, branch: &str) -> Result<bool> {
        Ok(self.local_branch_commit(branch)?.is_some())
    }

    /// Check for remote tracking ref `<remote>/<branch>` as of the last fetch.
    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> Result<bool> {
        Ok(self.remote_branch_commit(remote, branch)?.is_some())
    }

    /// Ask `remote` itself whether it carries `reference`.
    ///
    /// Only branches and tags can be asked for. Commits and unknown refs
    /// are never advertised.
    pub async fn remote_has_ref(&self, remote: &str, reference: &GitRef) -> Result<bool> {
        let kind = match reference {
            GitRef::Branch(_) => "--heads",
            GitRef::Tag(_) => "--tags",
            GitRef::Commit(_) | GitRef::Unknown(_) => return Ok(false),
        };

        let output = gitcall(
            &self.path,
            ["ls-remote", kind, remote, reference.full_name().as_str()],
        )
        .await?;

        Ok(!output.trim().is_empty())
    }

    /// Commits ahead and behind the upstream of the checked out branch.
    ///
    /// Returns `None` when HEAD is detached or the branch has no upstream.
    pub fn new_commits(&self) -> Result<Option<(usize, usize)>> {
        let repository = self.open()?;
        if repository.head_detached()? {
            return Ok(None);
        }

        let head = repository.head()?;
        let Some(name) = head.shorthand() else {
            return Ok(None);
        };

        let branch = repository.find_branch(name, BranchType::Local)?;
        let upstream = match branch.upstream() {
            Ok(upstream) => upstream,
            Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let (Some(local), Some(remote)) = (branch.get().target(), upstream.get().target()) else {
            return Ok(None);
        };

        Ok(Some(repository.graph_ahead_behind(local, remote)?))
    }

    /// Strict ISO 8601 commit timestamp of HEAD.
    pub async fn current_timestamp(&self) -> Result<String> {
        gitcall(&self.path, ["log", "-1", "--format=%cI"]).await
    }

    /// Every `(name, url)` remote this handle expects, primary first.
    pub(crate) fn desired_remotes<'a>(&'a self, url: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut remotes = vec![(self.remote.as_str(), url)];
        if let Some((name, upstream_url)) = &self.upstream {
            remotes.push((name.as_str(), upstream_url.as_str()));
        }

        remotes
    }

    pub(crate) fn open(&self) -> Result<Repository> {
        Ok(Repository::open(&self.path)?)
    }

    pub(crate) fn local_branch_commit(&self, branch: &str) -> Result<Option<git2::Oid>> {
        let repository = self.open()?;
        let commit = match repository.find_branch(branch, BranchType::Local) {
            Ok(branch) => branch.get().target(),
            Err(error) if error.code() == ErrorCode::NotFound => None,
            Err(error) => return Err(error.into()),
        };

        Ok(commit)
    }

    pub(crate) fn remote_branch_commit(
        &self,
        remote: &str,
        branch: &str,
    ) -> Result<Option<git2::Oid>> {
        let repository = self.open()?;
        let name = format!("{remote}/{branch}");
        let commit = match repository.find_branch(&name, BranchType::Remote) {
            Ok(branch) => branch.get().target(),
            Err(error) if error.code() == ErrorCode::NotFound => None,
            Err(error) => return Err(error.into()),
        };

        Ok(commit)
    }

    /// Refuse `action` if a remote named `remote` is not configured.
    pub(crate) fn ensure_remote(&self, remote: &str) -> Result<()> {
        match self.open()?.find_remote(remote) {
            Ok(_) => Ok(()),
            Err(error) if error.code() == ErrorCode::NotFound => Err(RepoError::MissingRemote {
                path: self.path.clone(),
                remote: remote.to_string(),
            }),
            Err(error) => Err(error.into()),
        }
    }

    /// Refuse `action` if tracked files carry uncommitted changes.
    pub(crate) fn ensure_no_changes(&self, action: &str) -> Result<()> {
        if self.has_changes()? {
            return Err(RepoError::CheckoutConflict {
                path: self.path.clone(),
                action: action.to_string(),
            });
        }

        Ok(())
    }

    pub(crate) fn missing_ref(&self, remote: &str, reference: &GitRef) -> RepoError {
        RepoError::MissingRef {
            path: self.path.clone(),
            remote: remote.to_string(),
            reference: reference.to_string(),
        }
    }

    pub(crate) fn unknown_ref(&self, reference: &GitRef) -> RepoError {
        RepoError::UnknownRef {
            path: self.path.clone(),
            reference: reference.to_string(),
        }
    }
}

/// Repository engine error types.
///
/// Every variant names the working copy it concerns.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Remote is not configured for working copy.
    #[error("{path:?}: remote {remote:?} does not exist")]
    MissingRemote { path: PathBuf, remote: String },

    /// Desired ref cannot be found on remote.
    #[error("{path:?}: {reference} does not exist on remote {remote:?}")]
    MissingRef {
        path: PathBuf,
        remote: String,
        reference: String,
    },

    /// Uncommitted changes block a checkout.
    #[error("{path:?}: cannot {action}, uncommitted changes would be overwritten")]
    CheckoutConflict { path: PathBuf, action: String },

    /// Remote name already claimed by another URL.
    #[error("{path:?}: remote {remote:?} points at {actual:?}, expected {expected:?}")]
    RemoteUrlConflict {
        path: PathBuf,
        remote: String,
        expected: String,
        actual: String,
    },

    /// Operation needs a checked out branch.
    #[error("{path:?}: cannot {action} with detached HEAD")]
    DetachedHeadUnexpected { path: PathBuf, action: String },

    /// Ref is neither a branch, a tag, nor a commit id.
    #[error("{path:?}: unknown ref {reference:?}")]
    UnknownRef { path: PathBuf, reference: String },

    /// Operation is only defined for some kinds of ref.
    #[error("{path:?}: cannot {action} on {reference}, only branches are supported")]
    UnsupportedRef {
        path: PathBuf,
        action: String,
        reference: String,
    },

    /// Local and remote branch differ, so tracking was not set.
    #[error("{path:?}: {branch:?} and {remote}/{branch} point at different commits, refusing to track")]
    TrackingConflict {
        path: PathBuf,
        remote: String,
        branch: String,
    },

    /// Working copy must be clean before a destructive operation.
    #[error("{path:?}: cannot {action}, working copy is dirty or mid-rebase")]
    InvalidState { path: PathBuf, action: String },

    /// No commit matched a timestamp reset.
    #[error("{path:?}: no commit on {reference} at or before {timestamp}")]
    NoCommitBefore {
        path: PathBuf,
        reference: String,
        timestamp: String,
    },

    /// External git invocation failed.
    #[error("{path:?}: {action} failed: {message}")]
    Git {
        path: PathBuf,
        action: String,
        status: Option<i32>,
        message: String,
    },

    /// External command run inside working copy failed.
    #[error("{path:?}: command {command:?} failed with status {status:?}")]
    Command {
        path: PathBuf,
        command: String,
        status: Option<i32>,
    },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RepoError {
    /// Process exit code to report for this error.
    ///
    /// Propagates the status of a failed git invocation where known.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Git {
                status: Some(status),
                ..
            }
            | Self::Command {
                status: Some(status),
                ..
            } if *status != 0 => *status,
            _ => 1,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = RepoError> = std::result::Result<T, E>;
