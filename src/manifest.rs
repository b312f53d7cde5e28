// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manifest model.
//!
//! Typed, fully resolved view of a [`ManifestDefinition`]. Every project
//! field cascades by precedence: project value, then group value, then the
//! manifest defaults. A group's effective defaults are computed once, when
//! the group is resolved. All of it is read-only value data, rebuilt from
//! configuration on every invocation.
//!
//! # Fixed Versions
//!
//! A manifest can be written back out as a __snapshot__. An unresolved
//! snapshot keeps the symbolic refs of the manifest. A resolved snapshot
//! replaces them with the commit id each working copy currently sits on, so
//! the exact state can be checked out again later.

use crate::{
    config::{
        ConfigError, DefaultsDefinition, ForkDefinition, GroupDefinition, ManifestDefinition,
        Overrides, ProjectDefinition, SourceDefinition,
    },
    path::{manifest_path, version_path},
    repo::GitRef,
};

use git2::Repository;
use glob::Pattern;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Hosting origin used to build clone URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    /// Construct new source.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Prefix that repository names are appended to.
    ///
    /// `ssh://git@github.com` becomes `git@github.com:`. Anything else gets a
    /// single trailing slash.
    pub fn url_prefix(&self) -> String {
        match self.url.strip_prefix("ssh://") {
            Some(host) => format!("{}:", host.trim_end_matches('/')),
            None => format!("{}/", self.url.trim_end_matches('/')),
        }
    }

    /// Clone URL of repository `name` on this source.
    pub fn repo_url(&self, name: &str) -> String {
        format!("{}{name}.git", self.url_prefix())
    }
}

impl From<&SourceDefinition> for Source {
    fn from(definition: &SourceDefinition) -> Self {
        Self::new(&definition.name, &definition.url)
    }
}

/// Effective defaults at one level of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub reference: GitRef,
    pub remote: String,
    pub source: String,
    pub depth: u32,
    pub recursive: bool,
    pub timestamp_author: Option<String>,
}

impl Defaults {
    /// Apply `overrides` on top of these defaults.
    pub fn cascade(&self, overrides: &Overrides) -> Self {
        Self {
            reference: overrides
                .reference
                .as_deref()
                .map(GitRef::classify)
                .unwrap_or_else(|| self.reference.clone()),
            remote: overrides
                .remote
                .clone()
                .unwrap_or_else(|| self.remote.clone()),
            source: overrides
                .source
                .clone()
                .unwrap_or_else(|| self.source.clone()),
            depth: overrides.depth.unwrap_or(self.depth),
            recursive: overrides.recursive.unwrap_or(self.recursive),
            timestamp_author: overrides
                .timestamp_author
                .clone()
                .or_else(|| self.timestamp_author.clone()),
        }
    }
}

impl From<&DefaultsDefinition> for Defaults {
    fn from(definition: &DefaultsDefinition) -> Self {
        Self {
            reference: GitRef::classify(&definition.reference),
            remote: definition.remote.clone(),
            source: definition.source.clone(),
            depth: definition.depth,
            recursive: definition.recursive,
            timestamp_author: definition.timestamp_author.clone(),
        }
    }
}

/// Second remote bound to the working copy of its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    pub name: String,
    pub remote_name: String,
    pub path: PathBuf,
    pub url: String,
}

/// Fully resolved project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub group: String,
    pub name: String,
    pub path: PathBuf,
    pub reference: GitRef,
    pub remote: String,
    pub depth: u32,
    pub recursive: bool,
    pub timestamp_author: Option<String>,
    pub source: Source,
    pub url: String,
    pub fork: Option<Fork>,
}

impl Project {
    /// Resolve raw project of raw group against manifest defaults.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::UnknownSource`] if the effective source is
    ///   not declared.
    /// - Return [`ManifestError::ForkRemoteCollision`] if the fork remote
    ///   name equals the project remote name.
    pub fn resolve(
        root: impl AsRef<Path>,
        group: &GroupDefinition,
        project: &ProjectDefinition,
        defaults: &DefaultsDefinition,
        sources: &[Source],
    ) -> Result<Self> {
        let group_defaults = Defaults::from(defaults).cascade(&group.overrides);
        Self::resolve_in(root, &group.name, &group_defaults, project, sources)
    }

    /// Resolve raw project against already effective group defaults.
    pub fn resolve_in(
        root: impl AsRef<Path>,
        group: &str,
        group_defaults: &Defaults,
        project: &ProjectDefinition,
        sources: &[Source],
    ) -> Result<Self> {
        let effective = group_defaults.cascade(&project.overrides);
        if let Some(fork) = project.fork.as_ref().filter(|fork| fork.remote == effective.remote) {
            return Err(ManifestError::ForkRemoteCollision {
                project: project.name.clone(),
                remote: fork.remote.clone(),
            });
        }

        let source = find_source(sources, &effective.source, &project.name)?;
        let path = PathBuf::from(&project.path);
        let fork = match &project.fork {
            Some(fork) => Some(Fork {
                name: fork.name.clone(),
                remote_name: fork.remote.clone(),
                path: path.clone(),
                url: source.repo_url(&fork.name),
            }),
            None => None,
        };

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            group: group.to_string(),
            name: project.name.clone(),
            url: source.repo_url(&project.name),
            path,
            reference: effective.reference,
            remote: effective.remote,
            depth: effective.depth,
            recursive: effective.recursive,
            timestamp_author: effective.timestamp_author,
            source,
            fork,
        })
    }

    /// Absolute location of working copy.
    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.path)
    }

    /// Serializable form of project with every field spelled out.
    ///
    /// When `resolved` is set, the ref is the commit id the working copy
    /// currently sits on instead of the configured ref.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::MissingProject`] if `resolved` is set and the
    ///   working copy does not exist.
    /// - Return [`ManifestError::Git2`] if HEAD cannot be read.
    pub fn to_snapshot(&self, resolved: bool) -> Result<ProjectDefinition> {
        let reference = if resolved {
            self.current_commit()?
        } else {
            self.reference.full_name()
        };

        Ok(ProjectDefinition {
            name: self.name.clone(),
            path: self.path.to_string_lossy().into_owned(),
            overrides: Overrides {
                reference: Some(reference),
                remote: Some(self.remote.clone()),
                source: Some(self.source.name.clone()),
                depth: Some(self.depth),
                recursive: Some(self.recursive),
                timestamp_author: self.timestamp_author.clone(),
            },
            fork: self.fork.as_ref().map(|fork| ForkDefinition {
                name: fork.name.clone(),
                remote: fork.remote_name.clone(),
            }),
        })
    }

    fn current_commit(&self) -> Result<String> {
        let full_path = self.full_path();
        if !full_path.join(".git").exists() {
            return Err(ManifestError::MissingProject(self.path.clone()));
        }

        let repository = Repository::open(&full_path)?;
        let commit = repository.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}

/// Group of projects, ordered by path.
///
/// The source named by [`Group::defaults`] is only looked up for projects
/// that inherit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub defaults: Defaults,
    pub projects: Vec<Project>,
}

impl Group {
    /// Resolve raw group and all of its projects.
    pub fn resolve(
        root: impl AsRef<Path>,
        group: &GroupDefinition,
        defaults: &DefaultsDefinition,
        sources: &[Source],
    ) -> Result<Self> {
        let effective = Defaults::from(defaults).cascade(&group.overrides);

        let mut projects = group
            .projects
            .iter()
            .map(|project| {
                Project::resolve_in(root.as_ref(), &group.name, &effective, project, sources)
            })
            .collect::<Result<Vec<_>>>()?;
        projects.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Self {
            name: group.name.clone(),
            defaults: effective,
            projects,
        })
    }
}

/// Fully resolved manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub root: PathBuf,
    pub definition: ManifestDefinition,
    pub sources: Vec<Source>,
    pub groups: Vec<Group>,
}

impl Manifest {
    /// Resolve manifest definition rooted at `root`.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::DuplicatePath`] if two projects share a
    ///   path.
    /// - Return any error of [`Group::resolve`].
    pub fn new(root: impl Into<PathBuf>, definition: ManifestDefinition) -> Result<Self> {
        let root = root.into();
        let sources = definition
            .sources
            .iter()
            .map(Source::from)
            .collect::<Vec<_>>();
        let groups = definition
            .groups
            .iter()
            .map(|group| Group::resolve(&root, group, &definition.defaults, &sources))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for project in groups.iter().flat_map(|group| group.projects.iter()) {
            if !seen.insert(project.path.clone()) {
                return Err(ManifestError::DuplicatePath(project.path.clone()));
            }
        }

        Ok(Self {
            root,
            definition,
            sources,
            groups,
        })
    }

    /// Load live manifest, or fixed version `version` of it, at `root`.
    #[instrument(skip(root), level = "debug")]
    pub fn load(root: impl AsRef<Path>, version: Option<&str>) -> Result<Self> {
        let path = manifest_path(root.as_ref(), version);
        debug!("load manifest {:?}", path.display());
        let data = std::fs::read_to_string(&path).map_err(|error| ManifestError::Read {
            path: path.clone(),
            error,
        })?;

        Self::new(root.as_ref(), data.parse()?)
    }

    /// Every project of every group, in group order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.groups.iter().flat_map(|group| group.projects.iter())
    }

    /// Select projects by group and project patterns.
    ///
    /// Project patterns match project names or paths and take precedence
    /// over group patterns. Without any pattern, everything is selected.
    /// Patterns are globs.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::Pattern`] if a pattern is not a valid glob.
    /// - Return [`ManifestError::UnknownSelector`] if a pattern matches
    ///   nothing.
    pub fn select(&self, groups: &[String], projects: &[String]) -> Result<Vec<Project>> {
        if !projects.is_empty() {
            let patterns = compile(projects)?;
            return Ok(self
                .projects()
                .filter(|project| {
                    patterns.iter().any(|(_, pattern)| {
                        pattern.matches(&project.name)
                            || pattern.matches(project.path.to_string_lossy().as_ref())
                    })
                })
                .cloned()
                .collect());
        }

        if !groups.is_empty() {
            let patterns = compile(groups)?;
            for (raw, pattern) in &patterns {
                if !self.groups.iter().any(|group| pattern.matches(&group.name)) {
                    return Err(ManifestError::UnknownSelector(raw.clone()));
                }
            }

            return Ok(self
                .groups
                .iter()
                .filter(|group| patterns.iter().any(|(_, pattern)| pattern.matches(&group.name)))
                .flat_map(|group| group.projects.iter().cloned())
                .collect());
        }

        Ok(self.projects().cloned().collect())
    }

    /// Serializable form of the whole manifest.
    ///
    /// Group overrides are folded into each project, so the snapshot does
    /// not depend on cascading.
    pub fn to_snapshot(&self, resolved: bool) -> Result<ManifestDefinition> {
        let groups = self
            .groups
            .iter()
            .map(|group| {
                Ok(GroupDefinition {
                    name: group.name.clone(),
                    overrides: Overrides::default(),
                    projects: group
                        .projects
                        .iter()
                        .map(|project| project.to_snapshot(resolved))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ManifestDefinition {
            defaults: self.definition.defaults.clone(),
            sources: self.definition.sources.clone(),
            groups,
        })
    }

    /// Write resolved snapshot as fixed version `version`.
    ///
    /// Every project must exist on disk.
    #[instrument(skip(self), level = "debug")]
    pub fn write_snapshot(&self, version: &str) -> Result<PathBuf> {
        let snapshot = self.to_snapshot(true)?;
        let path = version_path(&self.root, version);
        let write_error = |error| ManifestError::Write {
            path: path.clone(),
            error,
        };

        if let Some(parent) = path.parent() {
            mkdirp::mkdirp(parent).map_err(write_error)?;
        }
        std::fs::write(&path, snapshot.to_string()).map_err(write_error)?;
        info!("fixed version {version} at {:?}", path.display());

        Ok(path)
    }
}

fn find_source(sources: &[Source], name: &str, owner: &str) -> Result<Source> {
    sources
        .iter()
        .find(|source| source.name == name)
        .cloned()
        .ok_or_else(|| ManifestError::UnknownSource {
            owner: owner.to_string(),
            source_name: name.to_string(),
        })
}

fn compile(selectors: &[String]) -> Result<Vec<(String, Pattern)>> {
    selectors
        .iter()
        .map(|raw| Ok((raw.clone(), Pattern::new(raw)?)))
        .collect()
}

/// Manifest error types.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Project or group refers to a source that is not declared.
    #[error("{owner:?} refers to unknown source {source_name:?}")]
    UnknownSource { owner: String, source_name: String },

    /// Fork would share its remote name with its own project.
    #[error("fork of {project:?} uses remote name {remote:?} of the project itself")]
    ForkRemoteCollision { project: String, remote: String },

    /// Two projects claim the same path.
    #[error("project path {0:?} is used more than once")]
    DuplicatePath(PathBuf),

    /// Selector matched no group or project.
    #[error("{0:?} does not match any group or project")]
    UnknownSelector(String),

    /// Working copy is required but missing.
    #[error("project {0:?} does not exist yet, herd it first")]
    MissingProject(PathBuf),

    /// Selector is not a valid glob.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read manifest {path:?}: {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to write manifest {path:?}: {error}")]
    Write {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Manifest parsing fails.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ManifestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceDefinition;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    const KIT_SHA: &str = "f2e20031ddce5cb097105f4d8ccbc77f4ac20709";

    fn cats() -> ManifestDefinition {
        indoc! {r#"
            [defaults]
            ref = "refs/heads/main"
            remote = "origin"
            source = "github"

            [[source]]
            name = "github"
            url = "https://github.com/"

            [[source]]
            name = "mine"
            url = "ssh://git@github.com"

            [[group]]
            name = "cats"
            depth = 1

            [[group.project]]
            name = "jrgoodle/kit"
            path = "black-cats/kit"
            ref = "f2e20031ddce5cb097105f4d8ccbc77f4ac20709"
            depth = 0

            [[group.project]]
            name = "jrgoodle/cats"
            path = "black-cats/cats"
            source = "mine"

            [[group]]
            name = "dogs"
            remote = "upstream"

            [[group.project]]
            name = "jrgoodle/fido"
            path = "dogs/fido"
            fork = { name = "me/fido", remote = "origin" }
        "#}
        .parse()
        .unwrap()
    }

    #[test]
    fn project_fields_cascade() -> anyhow::Result<()> {
        let manifest = Manifest::new("/work", cats())?;
        let cats = &manifest.groups[0];

        assert_eq!(cats.defaults.depth, 1);
        let kit = cats
            .projects
            .iter()
            .find(|project| project.name == "jrgoodle/kit")
            .unwrap();
        assert_eq!(kit.reference, GitRef::Commit(KIT_SHA.into()));
        assert_eq!(kit.depth, 0);
        assert_eq!(kit.remote, "origin");
        assert_eq!(kit.url, "https://github.com/jrgoodle/kit.git");
        assert_eq!(kit.full_path(), PathBuf::from("/work/black-cats/kit"));

        let cats_project = cats
            .projects
            .iter()
            .find(|project| project.name == "jrgoodle/cats")
            .unwrap();
        assert_eq!(cats_project.reference, GitRef::branch("main"));
        assert_eq!(cats_project.depth, 1);
        assert_eq!(cats_project.url, "git@github.com:jrgoodle/cats.git");

        let fido = &manifest.groups[1].projects[0];
        assert_eq!(fido.remote, "upstream");
        assert_eq!(
            fido.fork,
            Some(Fork {
                name: "me/fido".into(),
                remote_name: "origin".into(),
                path: "dogs/fido".into(),
                url: "https://github.com/me/fido.git".into(),
            })
        );

        Ok(())
    }

    #[test]
    fn projects_are_ordered_by_path() -> anyhow::Result<()> {
        let manifest = Manifest::new("/work", cats())?;
        let paths = manifest.groups[0]
            .projects
            .iter()
            .map(|project| project.path.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![PathBuf::from("black-cats/cats"), PathBuf::from("black-cats/kit")]
        );

        Ok(())
    }

    #[test_case(None, None; "plain project")]
    #[test_case(Some(KIT_SHA), None; "commit ref")]
    #[test_case(None, Some(3); "shallow")]
    #[test_case(Some("refs/tags/v1"), Some(1); "shallow tag")]
    #[test]
    fn fork_remote_collision_always_fails(reference: Option<&str>, depth: Option<u32>) {
        let defaults = DefaultsDefinition {
            reference: "refs/heads/main".into(),
            remote: "origin".into(),
            source: "github".into(),
            ..Default::default()
        };
        let group = GroupDefinition {
            name: "cats".into(),
            ..Default::default()
        };
        let project = ProjectDefinition {
            name: "jrgoodle/kit".into(),
            path: "black-cats/kit".into(),
            overrides: Overrides {
                reference: reference.map(Into::into),
                depth,
                ..Default::default()
            },
            fork: Some(ForkDefinition {
                name: "me/kit".into(),
                remote: "origin".into(),
            }),
        };
        let sources = vec![Source::new("github", "https://github.com")];

        // Resolution happens before any working copy is touched, so a
        // nonexistent root is fine.
        let result = Project::resolve("/nonexistent", &group, &project, &defaults, &sources);
        assert!(matches!(
            result,
            Err(ManifestError::ForkRemoteCollision { .. })
        ));
    }

    #[test]
    fn unknown_source_fails() {
        let mut definition = cats();
        definition.groups[0].projects[0].overrides.source = Some("gitlab".into());

        let result = Manifest::new("/work", definition);
        assert!(matches!(
            result,
            Err(ManifestError::UnknownSource { source_name, .. }) if source_name == "gitlab"
        ));
    }

    #[test]
    fn unused_group_source_is_never_looked_up() -> anyhow::Result<()> {
        let mut definition = cats();
        definition.groups[1].overrides.source = Some("gitlab".into());
        definition.groups[1].projects[0].overrides.source = Some("github".into());

        let manifest = Manifest::new("/work", definition)?;
        let fido = &manifest.groups[1].projects[0];
        assert_eq!(manifest.groups[1].defaults.source, "gitlab");
        assert_eq!(fido.url, "https://github.com/jrgoodle/fido.git");

        Ok(())
    }

    #[test]
    fn duplicate_path_fails() {
        let mut definition = cats();
        definition.groups[1].projects[0].path = "black-cats/kit".into();

        let result = Manifest::new("/work", definition);
        assert!(matches!(result, Err(ManifestError::DuplicatePath(_))));
    }

    #[test_case(&[], &[], 3; "everything")]
    #[test_case(&["dogs"], &[], 1; "by group")]
    #[test_case(&[], &["jrgoodle/kit"], 1; "by name")]
    #[test_case(&[], &["black-cats/*"], 2; "by path glob")]
    #[test_case(&["dogs"], &["black-cats/kit"], 1; "projects win over groups")]
    #[test]
    fn select_projects(groups: &[&str], projects: &[&str], expect: usize) {
        use pretty_assertions::assert_eq;

        let manifest = Manifest::new("/work", cats()).unwrap();
        let groups = groups.iter().map(ToString::to_string).collect::<Vec<_>>();
        let projects = projects.iter().map(ToString::to_string).collect::<Vec<_>>();

        assert_eq!(manifest.select(&groups, &projects).unwrap().len(), expect);
    }

    #[test]
    fn unknown_group_selector_fails() -> anyhow::Result<()> {
        let manifest = Manifest::new("/work", cats())?;
        let result = manifest.select(&["birds".into()], &[]);
        assert!(matches!(result, Err(ManifestError::UnknownSelector(_))));

        Ok(())
    }

    #[test_case("https://github.com", "https://github.com/"; "https")]
    #[test_case("https://github.com/", "https://github.com/"; "trailing slash")]
    #[test_case("ssh://git@github.com", "git@github.com:"; "ssh")]
    #[test_case("/srv/git", "/srv/git/"; "local path")]
    #[test]
    fn source_url_prefix(url: &str, expect: &str) {
        use pretty_assertions::assert_eq;

        assert_eq!(Source::new("any", url).url_prefix(), expect);
    }

    #[test]
    fn unresolved_snapshot_keeps_symbolic_refs() -> anyhow::Result<()> {
        let manifest = Manifest::new("/work", cats())?;
        let snapshot = manifest.to_snapshot(false)?;

        let kit = &snapshot.groups[0].projects[1];
        assert_eq!(kit.overrides.reference.as_deref(), Some(KIT_SHA));
        let cats = &snapshot.groups[0].projects[0];
        assert_eq!(cats.overrides.reference.as_deref(), Some("refs/heads/main"));
        assert_eq!(cats.overrides.depth, Some(1));
        assert_eq!(snapshot.sources, vec![
            SourceDefinition {
                name: "github".into(),
                url: "https://github.com/".into(),
            },
            SourceDefinition {
                name: "mine".into(),
                url: "ssh://git@github.com".into(),
            },
        ]);

        // Folding group overrides into projects must not change resolution.
        let again = Manifest::new("/work", snapshot)?;
        assert_eq!(
            again.projects().map(|p| p.depth).collect::<Vec<_>>(),
            manifest.projects().map(|p| p.depth).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[sealed_test]
    fn resolved_snapshot_reads_current_commit() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        let repository = Repository::init(root.join("dogs/fido"))?;
        let signature = git2::Signature::now("Tom", "tom@example.com")?;
        let tree = repository.find_tree(repository.index()?.write_tree()?)?;
        let oid = repository.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])?;

        let manifest = Manifest::new(&root, cats())?;

        let fido = manifest.groups[1].projects[0].to_snapshot(true)?;
        assert_eq!(fido.overrides.reference, Some(oid.to_string()));

        let kit = manifest.groups[0].projects[1].to_snapshot(true);
        assert!(matches!(kit, Err(ManifestError::MissingProject(_))));

        Ok(())
    }

    #[sealed_test]
    fn write_snapshot_requires_every_project() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        let manifest = Manifest::new(&root, cats())?;
        assert!(manifest.write_snapshot("v1").is_err());
        assert!(!version_path(&root, "v1").exists());

        Ok(())
    }
}
