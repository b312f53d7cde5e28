// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Resets, cleaning, stashing, and informational output.

use crate::repo::{git::gitcall, GitRef, Repo, RepoError, Result};

use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Which branches [`Repo::branches`] lists.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BranchScope {
    #[default]
    Local,
    Remote,
    All,
}

impl Repo {
    /// Hard reset working copy onto the default ref as the remote has it.
    #[instrument(skip(self), level = "debug")]
    pub async fn reset(&self, depth: u32) -> Result<()> {
        match &self.default_ref {
            GitRef::Branch(branch) => {
                self.fetch(&self.remote, Some(&self.default_ref), depth).await?;
                self.checkout_default().await?;
                let upstream = format!("{}/{branch}", self.remote);
                info!(" - Reset to {upstream}");
                gitcall(&self.path, ["reset", "--hard", upstream.as_str()]).await?;
            }
            reference @ GitRef::Tag(_) => {
                self.fetch(&self.remote, Some(reference), depth).await?;
                self.checkout_detached(reference).await?;
                self.reset_hard(&reference.full_name()).await?;
            }
            reference @ GitRef::Commit(sha) => {
                self.fetch(&self.remote, None, depth).await?;
                self.checkout_detached(reference).await?;
                self.reset_hard(sha).await?;
            }
            reference @ GitRef::Unknown(_) => return Err(self.unknown_ref(reference)),
        }

        Ok(())
    }

    /// Hard reset working copy onto the last commit of the default ref made
    /// at or before `timestamp`, detaching HEAD.
    ///
    /// With `author` set, only commits by that author are considered.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::NoCommitBefore`] if no commit qualifies.
    #[instrument(skip(self), level = "debug")]
    pub async fn reset_timestamp(
        &self,
        timestamp: &str,
        author: Option<&str>,
        depth: u32,
    ) -> Result<()> {
        let target = match &self.default_ref {
            GitRef::Branch(branch) => {
                self.fetch(&self.remote, Some(&self.default_ref), depth).await?;
                format!("{}/{branch}", self.remote)
            }
            reference @ GitRef::Tag(_) => {
                self.fetch(&self.remote, Some(reference), depth).await?;
                reference.full_name()
            }
            GitRef::Commit(sha) => {
                self.fetch(&self.remote, None, depth).await?;
                sha.clone()
            }
            reference @ GitRef::Unknown(_) => return Err(self.unknown_ref(reference)),
        };

        let mut args = vec![
            "log".to_string(),
            "-1".to_string(),
            "--format=%H".to_string(),
            format!("--before={timestamp}"),
        ];
        if let Some(author) = author {
            args.push(format!("--author={author}"));
        }
        args.push(target.clone());

        let sha = gitcall(&self.path, args).await?;
        if sha.is_empty() {
            return Err(RepoError::NoCommitBefore {
                path: self.path.clone(),
                reference: target,
                timestamp: timestamp.to_string(),
            });
        }

        self.checkout_detached(&GitRef::Commit(sha.clone())).await?;
        self.reset_hard(&sha).await
    }

    /// Discard untracked files, local changes, and any rebase in progress.
    ///
    /// `args` are extra `git clean` flags, e.g. `dx`.
    #[instrument(skip(self), level = "debug")]
    pub async fn clean(&self, args: &str) -> Result<()> {
        let flags = format!("-f{args}");
        info!(" - Clean project");
        gitcall(&self.path, ["clean", flags.as_str()]).await?;
        self.reset_hard("HEAD").await?;

        if self.is_rebase_in_progress()? {
            info!(" - Abort rebase in progress");
            gitcall(&self.path, ["rebase", "--abort"]).await?;
        }

        if self.recursive {
            self.clean_submodules().await?;
        }

        Ok(())
    }

    /// Stash uncommitted changes to tracked files.
    pub async fn stash(&self) -> Result<()> {
        if !self.has_changes()? {
            info!(" - No changes to stash");
            return Ok(());
        }

        info!(" - Stash current changes");
        gitcall(&self.path, ["stash"]).await?;

        Ok(())
    }

    /// Verbose status report of working copy.
    pub async fn status_verbose(&self) -> Result<String> {
        gitcall(&self.path, ["status", "-vv"]).await
    }

    /// Branch listing of working copy.
    pub async fn branches(&self, scope: BranchScope) -> Result<String> {
        match scope {
            BranchScope::Local => gitcall(&self.path, ["branch"]).await,
            BranchScope::Remote => gitcall(&self.path, ["branch", "-r"]).await,
            BranchScope::All => gitcall(&self.path, ["branch", "-a"]).await,
        }
    }

    /// Run `command` through `sh -c` inside working copy with `env` set.
    ///
    /// Output goes straight to the terminal. The child is killed if the
    /// future is dropped.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Command`] if the command exits unsuccessfully.
    #[instrument(skip(self, env), level = "debug")]
    pub async fn run_command(&self, command: &str, env: &[(String, String)]) -> Result<()> {
        info!(" - Run {command:?}");
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.path)
            .envs(env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(RepoError::Command {
                path: self.path.clone(),
                command: command.to_string(),
                status: status.code(),
            });
        }

        Ok(())
    }

    async fn reset_hard(&self, target: &str) -> Result<()> {
        gitcall(&self.path, ["reset", "--hard", target]).await?;
        Ok(())
    }
}
