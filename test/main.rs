// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    IndexEntry, IndexTime, Oid, Repository, RepositoryInitOptions, Tree,
};
use std::path::{Path, PathBuf};

pub(crate) struct RepoFixture {
    path: PathBuf,
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new(path: impl AsRef<Path>, kind: RepoKind) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        opts.bare(kind.is_bare());
        let repo = Repository::init_opts(path.as_ref(), &opts)?;
        Self::configure(&repo)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            repo,
        })
    }

    /// Bare copy of `upstream` at `path`, sharing its history.
    pub(crate) fn fork_of(upstream: &RepoFixture, path: impl AsRef<Path>) -> Result<Self> {
        let repo = RepoBuilder::new()
            .bare(true)
            .clone(&upstream.url(), path.as_ref())?;
        Self::configure(&repo)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            repo,
        })
    }

    /// Fixture over an existing repository, e.g., a herded working copy.
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())?;
        Self::configure(&repo)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            repo,
        })
    }

    // INVARIANT: Always provide valid name and email.
    //   - Git will complain if this is not set in CI/CD environments.
    fn configure(repo: &Repository) -> Result<()> {
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(())
    }

    pub(crate) fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub(crate) fn head(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    pub(crate) fn branch_commit(&self, branch: &str) -> Result<Oid> {
        let branch = self.repo.find_branch(branch, git2::BranchType::Local)?;
        Ok(branch.get().peel_to_commit()?.id())
    }

    /// Create branch `name` at HEAD.
    pub(crate) fn branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head, false)?;

        Ok(())
    }

    /// Create lightweight tag `name` at HEAD.
    pub(crate) fn tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel(git2::ObjectType::Commit)?;
        self.repo.tag_lightweight(name, &head, false)?;

        Ok(())
    }

    /// Write HEAD out to the work tree, discarding anything in the way.
    pub(crate) fn checkout_head(&self) -> Result<()> {
        self.repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    /// Register `submodule` at `path` and commit it.
    pub(crate) fn add_submodule(&self, submodule: &RepoFixture, path: &str) -> Result<Oid> {
        let mut entry = self.repo.submodule(&submodule.url(), Path::new(path), true)?;
        entry.clone(None)?;
        entry.add_finalize()?;

        let tree_oid = self.repo.index()?.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        self.commit_tree(&tree, format!("chore: add submodule {path}"))
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<Oid> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename.as_ref().to_string_lossy().into_owned().into_bytes(),
        };

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_frombuffer(&entry, contents.as_ref().as_bytes())?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        self.commit_tree(&tree, format!("chore: add {:?}", filename.as_ref()))
    }

    fn commit_tree(&self, tree: &Tree<'_>, message: impl AsRef<str>) -> Result<Oid> {
        // INVARIANT: Always determine latest parent commits to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        // INVARIANT: Commit to HEAD by appending to obtained parent commits.
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message.as_ref(),
            tree,
            &parents,
        )?;

        Ok(oid)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) enum RepoKind {
    #[default]
    Bare,

    Normal,
}

impl RepoKind {
    pub(crate) fn is_bare(&self) -> bool {
        match self {
            Self::Bare => true,
            Self::Normal => false,
        }
    }
}
