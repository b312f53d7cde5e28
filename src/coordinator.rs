// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Fork/upstream coordination.
//!
//! Every command operates on one [`Project`] at a time through the functions
//! here. A project without a fork maps onto a single [`Repo`]. A project with
//! a fork maps onto two handles of the same working copy: the __fork__ handle
//! reconciled against the fork remote, which is where work happens, and the
//! __upstream__ handle that is only ever fetched from or pulled from.
//!
//! # Fork Order
//!
//! For a forked project, reconciliation always runs in this order:
//!
//! 1. Reconcile both remotes against the working copy, or create both of
//!    them for a fresh one.
//! 2. Herd against the fork remote. Tags the fork lacks come from upstream.
//! 3. Fetch, and only fetch, the upstream remote.
//!
//! Any failure stops the sequence, so nothing is pushed after a failed pull.

use crate::{
    manifest::{Fork, Project},
    repo::{maintain::BranchScope, GitRef, Repo, RepoError, Result},
};

use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Options for [`herd`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HerdOptions {
    /// Herd this branch instead of the configured ref.
    pub branch: Option<String>,

    /// Herd this tag instead of the configured ref.
    pub tag: Option<String>,

    /// Override configured depth.
    pub depth: Option<u32>,

    /// Rebase instead of merge when pulling.
    pub rebase: bool,
}

/// Which side [`prune`] deletes a branch on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PruneScope {
    #[default]
    Local,
    Remote,
    All,
}

impl Project {
    /// Handle on working copy bound to the project remote.
    pub fn repo(&self) -> Repo {
        Repo::new(self.full_path(), &self.remote, self.reference.clone()).recursive(self.recursive)
    }

    /// Handle on working copy bound to the fork remote, if there is a fork.
    ///
    /// The project remote rides along as upstream of the handle.
    pub fn fork_repo(&self) -> Option<Repo> {
        self.fork.as_ref().map(|fork| {
            Repo::new(self.full_path(), &fork.remote_name, self.reference.clone())
                .recursive(self.recursive)
                .with_upstream(&self.remote, &self.url)
        })
    }

    /// Variables exposed to commands run inside the working copy.
    pub fn command_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("CORRAL_PATH".into(), self.root.to_string_lossy().into_owned()),
            ("PROJECT_PATH".into(), self.full_path().to_string_lossy().into_owned()),
            ("PROJECT_NAME".into(), self.name.clone()),
            ("PROJECT_REMOTE".into(), self.remote.clone()),
            ("PROJECT_REF".into(), self.reference.full_name()),
        ];
        if let Some(fork) = &self.fork {
            env.push(("FORK_REMOTE".into(), fork.remote_name.clone()));
        }

        env
    }

    fn remote_pairs<'a>(&'a self, fork: &'a Fork) -> [(&'a str, &'a str); 2] {
        [
            (fork.remote_name.as_str(), fork.url.as_str()),
            (self.remote.as_str(), self.url.as_str()),
        ]
    }
}

/// Collect paths of projects that may not be reconciled right now.
pub async fn invalid_projects(projects: &[Project]) -> Result<Vec<PathBuf>> {
    let mut invalid = Vec::new();
    for project in projects {
        if !project.repo().is_valid().await? {
            invalid.push(project.path.clone());
        }
    }

    Ok(invalid)
}

/// Reconcile project with its manifest entry.
///
/// # Errors
///
/// - Return [`RepoError::InvalidState`] if the working copy is dirty.
/// - Return any error of [`Repo::herd`].
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn herd(project: &Project, options: &HerdOptions) -> Result<()> {
    info!("{}", project.path.display());
    let repo = project.repo();
    repo.ensure_valid("herd").await?;

    let (Some(fork), Some(fork_repo)) = (&project.fork, project.fork_repo()) else {
        let depth = options.depth.unwrap_or(project.depth);
        return herd_with(&repo, &project.url, options, depth).await;
    };

    info!(" - Herd fork {}", fork.name);
    herd_with(&fork_repo, &fork.url, options, 0).await?;

    info!(" - Fetch upstream {}", project.name);
    repo.fetch(&project.remote, None, 0).await
}

/// Bring the fork of a project up to date with upstream.
///
/// Herds the project first, then pulls upstream into the default branch and
/// pushes the result to the fork.
///
/// # Errors
///
/// - Return [`RepoError::UnsupportedRef`] if the default ref is not a branch.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn sync(project: &Project, rebase: bool) -> Result<()> {
    let Some(fork_repo) = project.fork_repo() else {
        info!("{} has no fork, skipping", project.path.display());
        return Ok(());
    };

    if !project.reference.is_branch() {
        return Err(RepoError::UnsupportedRef {
            path: project.full_path(),
            action: "sync".into(),
            reference: project.reference.to_string(),
        });
    }

    let options = HerdOptions {
        rebase,
        ..Default::default()
    };
    herd(project, &options).await?;
    fork_repo.sync(&project.remote, fork_repo.remote(), rebase).await
}

/// Hard reset project onto its upstream default ref.
///
/// With `timestamp` set, resets onto the last commit at or before it
/// instead, honoring the project's timestamp author. A missing project is
/// herded.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn reset(project: &Project, timestamp: Option<&str>) -> Result<()> {
    let repo = project.repo();
    if !repo.exists() {
        return herd(project, &HerdOptions::default()).await;
    }

    repo.ensure_valid("reset").await?;
    let depth = match &project.fork {
        Some(fork) => {
            repo.reconcile_remotes(&project.remote_pairs(fork))?;
            0
        }
        None => project.depth,
    };

    info!("{}", project.path.display());
    match timestamp {
        Some(timestamp) => {
            repo.reset_timestamp(timestamp, project.timestamp_author.as_deref(), depth)
                .await
        }
        None => repo.reset(depth).await,
    }
}

/// Commit timestamp of the working copy of `project`.
pub async fn timestamp(project: &Project) -> Result<String> {
    project.repo().current_timestamp().await
}

/// Fetch project remote, and fork remote for forks.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn fetch(project: &Project) -> Result<()> {
    let repo = project.repo();
    if !skip_missing(&repo) {
        return Ok(());
    }

    if let Some(fork_repo) = project.fork_repo() {
        fork_repo.fetch(fork_repo.remote(), None, 0).await?;
        return repo.fetch(&project.remote, None, 0).await;
    }

    let reference = match &project.reference {
        reference @ (GitRef::Branch(_) | GitRef::Tag(_)) => Some(reference),
        GitRef::Commit(_) | GitRef::Unknown(_) => None,
    };
    repo.fetch(&project.remote, reference, project.depth).await
}

/// Start branch in project, on the fork remote for forks.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn start(project: &Project, branch: &str, tracking: bool, offline: bool) -> Result<()> {
    let repo = project.repo();
    if !skip_missing(&repo) {
        return Ok(());
    }

    info!("{}", project.path.display());
    match project.fork_repo() {
        Some(fork_repo) => {
            fork_repo
                .start(fork_repo.remote(), branch, 0, tracking, offline)
                .await
        }
        None => {
            repo.start(&project.remote, branch, project.depth, tracking, offline)
                .await
        }
    }
}

/// Delete branch of project locally, remotely, or both.
///
/// Remote deletion happens on the fork remote for forks.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn prune(project: &Project, branch: &str, force: bool, scope: PruneScope) -> Result<()> {
    let repo = project.repo();
    if !skip_missing(&repo) {
        return Ok(());
    }

    info!("{}", project.path.display());
    if matches!(scope, PruneScope::Local | PruneScope::All) {
        repo.ensure_valid("prune").await?;
        repo.prune_local(branch, force).await?;
    }

    if matches!(scope, PruneScope::Remote | PruneScope::All) {
        let remote = project
            .fork
            .as_ref()
            .map_or(project.remote.as_str(), |fork| fork.remote_name.as_str());
        repo.prune_remote(remote, branch).await?;
    }

    Ok(())
}

/// Discard changes of project.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn clean(project: &Project, args: &str, recursive: bool) -> Result<()> {
    let repo = project.repo().recursive(recursive);
    if !skip_missing(&repo) {
        return Ok(());
    }

    info!("{}", project.path.display());
    repo.clean(args).await
}

/// Stash changes of project.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn stash(project: &Project) -> Result<()> {
    let repo = project.repo();
    if !skip_missing(&repo) {
        return Ok(());
    }

    info!("{}", project.path.display());
    repo.stash().await
}

/// Run shell command inside project.
///
/// Failure is only reported as a warning when `ignore_errors` is set.
#[instrument(skip(project), fields(project = %project.path.display()), level = "debug")]
pub async fn forall(project: &Project, command: &str, ignore_errors: bool) -> Result<()> {
    let repo = project.repo();
    if !skip_missing(&repo) {
        return Ok(());
    }

    info!("{}", project.path.display());
    match repo.run_command(command, &project.command_env()).await {
        Err(error @ RepoError::Command { .. }) if ignore_errors => {
            warn!("{error}");
            Ok(())
        }
        result => result,
    }
}

/// One line summary of project: path, dirty marker, ref, and divergence.
pub async fn status_line(project: &Project, width: usize) -> Result<String> {
    let repo = project.repo();
    let path = project.path.display().to_string();
    if !repo.exists() {
        return Ok(format!("{path:<width$} (not herded)"));
    }

    let marker = if repo.is_dirty().await? { "*" } else { "" };
    let mut line = format!(
        "{:<width$} {}",
        format!("{path}{marker}"),
        repo.current_ref_description()?
    );
    let divergence = repo.new_commits()?.filter(|&(ahead, behind)| ahead != 0 || behind != 0);
    if let Some((ahead, behind)) = divergence {
        line.push_str(&format!(" +{ahead}/-{behind}"));
    }

    Ok(line)
}

/// Verbose status of project.
pub async fn diff(project: &Project) -> Result<Option<String>> {
    let repo = project.repo();
    if !repo.exists() {
        return Ok(None);
    }

    Ok(Some(repo.status_verbose().await?))
}

/// Branch listing of project.
pub async fn branches(project: &Project, scope: BranchScope) -> Result<Option<String>> {
    let repo = project.repo();
    if !repo.exists() {
        return Ok(None);
    }

    Ok(Some(repo.branches(scope).await?))
}

async fn herd_with(repo: &Repo, url: &str, options: &HerdOptions, depth: u32) -> Result<()> {
    match (&options.branch, &options.tag) {
        (Some(branch), _) => repo.herd_branch(url, branch, depth, options.rebase).await,
        (None, Some(tag)) => repo.herd_tag(url, tag, depth, options.rebase).await,
        (None, None) => repo.herd(url, depth, options.rebase).await,
    }
}

// INVARIANT: Commands other than herd and reset never create working copies.
fn skip_missing(repo: &Repo) -> bool {
    if repo.exists() {
        return true;
    }

    info!("{} has not been herded yet, skipping", repo.path().display());
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, Source};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn fido() -> Project {
        let manifest: Manifest = Manifest::new(
            "/work",
            r#"
                [defaults]
                ref = "refs/heads/main"
                remote = "upstream"
                source = "github"

                [[source]]
                name = "github"
                url = "https://github.com"

                [[group]]
                name = "dogs"

                [[group.project]]
                name = "jrgoodle/fido"
                path = "dogs/fido"
                fork = { name = "me/fido", remote = "origin" }
            "#
            .parse()
            .unwrap(),
        )
        .unwrap();

        manifest.groups[0].projects[0].clone()
    }

    #[test]
    fn fork_repo_uses_fork_remote() {
        let project = fido();
        let fork_repo = project.fork_repo().unwrap();

        assert_eq!(fork_repo.remote(), "origin");
        assert_eq!(fork_repo.path(), Path::new("/work/dogs/fido"));
        assert_eq!(project.repo().remote(), "upstream");
        assert_eq!(project.source, Source::new("github", "https://github.com"));

        let Some(fork) = &project.fork else {
            panic!("fido is forked");
        };
        assert_eq!(
            fork_repo.desired_remotes(&fork.url),
            project.remote_pairs(fork).to_vec()
        );
    }

    #[test]
    fn command_env_names_fork_remote() {
        let env = fido().command_env();
        assert_eq!(
            env,
            vec![
                ("CORRAL_PATH".to_string(), "/work".to_string()),
                ("PROJECT_PATH".into(), "/work/dogs/fido".into()),
                ("PROJECT_NAME".into(), "jrgoodle/fido".into()),
                ("PROJECT_REMOTE".into(), "upstream".into()),
                ("PROJECT_REF".into(), "refs/heads/main".into()),
                ("FORK_REMOTE".into(), "origin".into()),
            ]
        );
    }

    #[test]
    fn remote_pairs_put_fork_first() {
        let project = fido();
        let Some(fork) = &project.fork else {
            panic!("fido is forked");
        };

        assert_eq!(
            project.remote_pairs(fork),
            [
                ("origin", "https://github.com/me/fido.git"),
                ("upstream", "https://github.com/jrgoodle/fido.git"),
            ]
        );
    }
}
