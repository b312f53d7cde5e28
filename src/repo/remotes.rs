// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote reconciliation.
//!
//! Remotes are matched by the URL they resolve to, not by name. A remote that
//! already points at a desired URL under another name is renamed, so that
//! remote names stay canonical across manifest edits. A desired name that
//! is taken by a different URL is a conflict and is never overwritten.

use crate::repo::{Repo, RepoError, Result};

use git2::{ErrorCode, Repository};
use tracing::{info, instrument};

impl Repo {
    /// Reconcile remotes of working copy with `desired` `(name, url)` pairs.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::RemoteUrlConflict`] if a desired remote name
    ///   points at another URL after renaming.
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self), level = "debug")]
    pub fn reconcile_remotes(&self, desired: &[(&str, &str)]) -> Result<()> {
        let repository = self.open()?;
        for (name, url) in desired {
            rename_by_url(&repository, name, url)?;
        }

        for (name, url) in desired {
            match repository.find_remote(name) {
                Ok(remote) => {
                    let actual = remote.url().unwrap_or_default();
                    if actual != *url {
                        return Err(RepoError::RemoteUrlConflict {
                            path: self.path.clone(),
                            remote: name.to_string(),
                            expected: url.to_string(),
                            actual: actual.to_string(),
                        });
                    }
                }
                Err(error) if error.code() == ErrorCode::NotFound => {
                    info!(" - Create remote {name} {url}");
                    repository.remote(name, url)?;
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(())
    }
}

// INVARIANT: Never rename onto a name that is already taken.
fn rename_by_url(repository: &Repository, name: &str, url: &str) -> Result<()> {
    let remotes = repository.remotes()?;
    let names = remotes.iter().flatten().collect::<Vec<_>>();
    if names.contains(&name) {
        return Ok(());
    }

    for existing in names {
        let remote = repository.find_remote(existing)?;
        if remote.url() == Some(url) {
            info!(" - Rename remote {existing} to {name}");
            repository.remote_rename(existing, name)?;
            return Ok(());
        }
    }

    Ok(())
}
