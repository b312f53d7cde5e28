// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the manifest file to simplify serialization and
//! deserialization. Nothing here is resolved: cascading defaults, source
//! lookup, and validation all belong to [`manifest`](crate::manifest). File
//! I/O is left to the caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Manifest definition layout.
///
/// # General Layout
///
/// A manifest is composed of three parts: defaults, sources, and groups.
/// Defaults fill in any field a group or project leaves out. Sources name
/// the hosting origins that clone URLs are built from. Groups bundle
/// projects, i.e., the repositories to manage, and may override defaults
/// for all of their projects at once.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ManifestDefinition {
    /// Fallback settings for every group and project.
    pub defaults: DefaultsDefinition,

    /// Hosting origins.
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceDefinition>,

    /// Groups of projects.
    #[serde(rename = "group", default)]
    pub groups: Vec<GroupDefinition>,
}

impl FromStr for ManifestDefinition {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut definition: ManifestDefinition =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on source URLs.
        for source in &mut definition.sources {
            source.url = shellexpand::full(source.url.as_str())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned();
        }

        Ok(definition)
    }
}

impl Display for ManifestDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Fallback settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DefaultsDefinition {
    /// Symbolic ref to keep working copies on.
    #[serde(rename = "ref")]
    pub reference: String,

    /// Name of the remote to clone from.
    pub remote: String,

    /// Name of the source to build clone URLs from.
    pub source: String,

    /// Commits of history to fetch, zero for all of it.
    #[serde(default)]
    pub depth: u32,

    /// Reconcile submodules along with each project.
    #[serde(default)]
    pub recursive: bool,

    /// Author to filter commits by when resetting to a timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_author: Option<String>,
}

/// Hosting origin.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SourceDefinition {
    pub name: String,
    pub url: String,
}

/// Overrides shared by groups and projects.
///
/// Every field left out cascades from the enclosing level.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Overrides {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_author: Option<String>,
}

/// Group of projects.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GroupDefinition {
    pub name: String,

    #[serde(flatten)]
    pub overrides: Overrides,

    #[serde(rename = "project", default)]
    pub projects: Vec<ProjectDefinition>,
}

/// Repository to manage.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectDefinition {
    /// Repository name on its source, e.g. `jrgoodle/kit`.
    pub name: String,

    /// Location of working copy relative to the manifest root.
    pub path: String,

    #[serde(flatten)]
    pub overrides: Overrides,

    /// Second remote bound to the same working copy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork: Option<ForkDefinition>,
}

/// Fork of a project.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ForkDefinition {
    /// Repository name of the fork on the project's source.
    pub name: String,

    /// Name of the remote the fork is reached through.
    pub remote: String,
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn kit_manifest(url: &str) -> ManifestDefinition {
        ManifestDefinition {
            defaults: DefaultsDefinition {
                reference: "refs/heads/main".into(),
                remote: "origin".into(),
                source: "github".into(),
                depth: 0,
                recursive: false,
                timestamp_author: None,
            },
            sources: vec![SourceDefinition {
                name: "github".into(),
                url: url.into(),
            }],
            groups: vec![GroupDefinition {
                name: "cats".into(),
                overrides: Overrides {
                    depth: Some(1),
                    ..Default::default()
                },
                projects: vec![ProjectDefinition {
                    name: "jrgoodle/kit".into(),
                    path: "black-cats/kit".into(),
                    overrides: Overrides {
                        reference: Some("f2e20031ddce5cb097105f4d8ccbc77f4ac20709".into()),
                        ..Default::default()
                    },
                    fork: Some(ForkDefinition {
                        name: "me/kit".into(),
                        remote: "fork".into(),
                    }),
                }],
            }],
        }
    }

    #[sealed_test(env = [("MIRROR", "/srv/git")])]
    fn deserialize_manifest_definition() -> anyhow::Result<()> {
        let result: ManifestDefinition = r#"
            [defaults]
            ref = "refs/heads/main"
            remote = "origin"
            source = "github"

            [[source]]
            name = "github"
            url = "$MIRROR/github"

            [[group]]
            name = "cats"
            depth = 1

            [[group.project]]
            name = "jrgoodle/kit"
            path = "black-cats/kit"
            ref = "f2e20031ddce5cb097105f4d8ccbc77f4ac20709"
            fork = { name = "me/kit", remote = "fork" }
        "#
        .parse()?;

        assert_eq!(result, kit_manifest("/srv/git/github"));

        Ok(())
    }

    #[test]
    fn serialize_manifest_definition() -> anyhow::Result<()> {
        let definition = kit_manifest("https://github.com");
        let result = definition.to_string();

        assert!(result.starts_with(indoc! {r#"
            [defaults]
            ref = "refs/heads/main"
            remote = "origin"
            source = "github"
            depth = 0
            recursive = false
        "#}));
        assert!(!result.contains("timestamp_author"));
        assert_eq!(result.parse::<ManifestDefinition>()?, definition);

        Ok(())
    }

    #[test]
    fn missing_defaults_is_an_error() {
        let result = "[[source]]\nname = \"github\"\nurl = \"https://github.com\"\n"
            .parse::<ManifestDefinition>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}
