// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Create-or-fail directory scope.
//!
//! A fresh working copy is created under a [`CreatedDir`]. Whatever the
//! creation produced is removed again if and only if the scoped work fails.
//! Successful work keeps everything. There is no `Drop` rollback, so a unit
//! killed mid-operation leaves its directory as is.

use crate::repo::Result;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory created for a fresh working copy.
#[derive(Debug)]
pub(crate) struct CreatedDir {
    rollback: PathBuf,
}

impl CreatedDir {
    /// Create `path` and every missing parent.
    ///
    /// The rollback target is `path` itself. Missing parents are created but
    /// never rolled back, as sibling working copies may be cloned into them
    /// concurrently. When `path` already existed (e.g. an empty placeholder),
    /// only the `.git` directory that the scoped work creates inside it is
    /// rolled back.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Io`](crate::repo::RepoError::Io) if directory
    ///   creation fails.
    pub(crate) fn create(path: &Path) -> Result<Self> {
        let rollback = if path.exists() {
            path.join(".git")
        } else {
            path.to_path_buf()
        };
        mkdirp::mkdirp(path)?;
        debug!("created {:?}, rollback target {:?}", path.display(), rollback.display());

        Ok(Self { rollback })
    }

    /// Close scope with the outcome of the work done inside it.
    pub(crate) fn finish<T>(self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.remove();
        }

        result
    }

    /// Close scope keeping the directory, regardless of outcome.
    pub(crate) fn keep<T>(self, result: Result<T>) -> Result<T> {
        result
    }

    fn remove(&self) {
        warn!("remove {:?}", self.rollback.display());
        if let Err(error) = std::fs::remove_dir_all(&self.rollback) {
            warn!("failed to remove {:?}: {error}", self.rollback.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RepoError;
    use sealed_test::prelude::*;

    fn failure() -> Result<()> {
        Err(RepoError::MissingRemote {
            path: PathBuf::from("cats"),
            remote: "origin".into(),
        })
    }

    #[sealed_test]
    fn failure_removes_created_directory_only() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        let target = root.join("black-cats").join("kit");
        let scope = CreatedDir::create(&target)?;
        assert!(target.is_dir());

        assert!(scope.finish(failure()).is_err());
        assert!(!target.exists());
        assert!(root.join("black-cats").is_dir());

        Ok(())
    }

    #[sealed_test]
    fn success_keeps_directory() -> anyhow::Result<()> {
        let target = std::env::current_dir()?.join("kit");
        let scope = CreatedDir::create(&target)?;
        scope.finish(Ok(()))?;
        assert!(target.is_dir());

        Ok(())
    }

    #[sealed_test]
    fn existing_directory_only_loses_git_dir() -> anyhow::Result<()> {
        let target = std::env::current_dir()?.join("kit");
        std::fs::create_dir_all(target.join(".git"))?;
        std::fs::write(target.join("notes.txt"), "keep me")?;

        let scope = CreatedDir::create(&target)?;
        assert!(scope.finish(failure()).is_err());
        assert!(target.join("notes.txt").is_file());
        assert!(!target.join(".git").exists());

        Ok(())
    }

    #[sealed_test]
    fn keep_ignores_failure() -> anyhow::Result<()> {
        let target = std::env::current_dir()?.join("kit");
        let scope = CreatedDir::create(&target)?;
        assert!(scope.keep(failure()).is_err());
        assert!(target.is_dir());

        Ok(())
    }
}
