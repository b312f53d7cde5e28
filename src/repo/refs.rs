// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reference classification.
//!
//! Manifests describe the desired state of a working copy through a
//! __ref__: a branch, a tag, or a raw commit id. The kind of ref decides
//! the whole reconciliation path, so it is classified exactly once into a
//! closed [`GitRef`] variant and matched exhaustively everywhere else.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";

/// Classified reference.
///
/// Branch and tag variants hold the bare (truncated) name. The unknown
/// variant holds the input verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum GitRef {
    /// Reference of the form `refs/heads/<name>`.
    Branch(String),

    /// Reference of the form `refs/tags/<name>`.
    Tag(String),

    /// Exactly 40 hexadecimal characters.
    Commit(String),

    /// Anything else.
    Unknown(String),
}

impl GitRef {
    /// Classify a raw reference string.
    pub fn classify(reference: impl AsRef<str>) -> Self {
        let reference = reference.as_ref();
        if let Some(branch) = reference.strip_prefix(BRANCH_PREFIX) {
            Self::Branch(branch.to_string())
        } else if let Some(tag) = reference.strip_prefix(TAG_PREFIX) {
            Self::Tag(tag.to_string())
        } else if is_commit_id(reference) {
            Self::Commit(reference.to_string())
        } else {
            Self::Unknown(reference.to_string())
        }
    }

    /// Construct branch reference from a bare branch name.
    pub fn branch(name: impl AsRef<str>) -> Self {
        Self::Branch(truncate(name.as_ref()).to_string())
    }

    /// Construct tag reference from a bare tag name.
    pub fn tag(name: impl AsRef<str>) -> Self {
        Self::Tag(truncate(name.as_ref()).to_string())
    }

    /// Bare name of the reference, i.e., without `refs/heads/` or
    /// `refs/tags/`.
    pub fn short_name(&self) -> &str {
        match self {
            Self::Branch(name) | Self::Tag(name) | Self::Commit(name) | Self::Unknown(name) => {
                name.as_str()
            }
        }
    }

    /// Fully qualified form of the reference.
    pub fn full_name(&self) -> String {
        match self {
            Self::Branch(name) => format!("{BRANCH_PREFIX}{name}"),
            Self::Tag(name) => format!("{TAG_PREFIX}{name}"),
            Self::Commit(sha) => sha.clone(),
            Self::Unknown(reference) => reference.clone(),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }
}

impl Display for GitRef {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.full_name().as_str())
    }
}

impl FromStr for GitRef {
    type Err = std::convert::Infallible;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        Ok(Self::classify(reference))
    }
}

impl From<String> for GitRef {
    fn from(reference: String) -> Self {
        Self::classify(reference)
    }
}

impl From<GitRef> for String {
    fn from(reference: GitRef) -> Self {
        reference.full_name()
    }
}

/// Strip exactly one recognized prefix from a reference.
///
/// Anything that is neither a branch nor a tag reference is returned as is.
pub fn truncate(reference: &str) -> &str {
    reference
        .strip_prefix(BRANCH_PREFIX)
        .or_else(|| reference.strip_prefix(TAG_PREFIX))
        .unwrap_or(reference)
}

fn is_commit_id(reference: &str) -> bool {
    reference.len() == 40 && reference.bytes().all(|byte| byte.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("refs/heads/main", GitRef::Branch("main".into()); "branch")]
    #[test_case("refs/heads/feature/cat", GitRef::Branch("feature/cat".into()); "nested branch")]
    #[test_case("refs/tags/v1.0.0", GitRef::Tag("v1.0.0".into()); "tag")]
    #[test_case(
        "f2e20031ddce5cb097105f4d8ccbc77f4ac20709",
        GitRef::Commit("f2e20031ddce5cb097105f4d8ccbc77f4ac20709".into());
        "commit"
    )]
    #[test_case(
        "F2E20031DDCE5CB097105F4D8CCBC77F4AC20709",
        GitRef::Commit("F2E20031DDCE5CB097105F4D8CCBC77F4AC20709".into());
        "uppercase commit"
    )]
    #[test_case(
        "g2e20031ddce5cb097105f4d8ccbc77f4ac20709",
        GitRef::Unknown("g2e20031ddce5cb097105f4d8ccbc77f4ac20709".into());
        "forty chars but not hex"
    )]
    #[test_case("f2e2003", GitRef::Unknown("f2e2003".into()); "short sha")]
    #[test_case("main", GitRef::Unknown("main".into()); "bare branch name")]
    #[test_case("refs/remotes/origin/main", GitRef::Unknown("refs/remotes/origin/main".into()); "remote ref")]
    #[test]
    fn classify_reference(input: &str, expect: GitRef) {
        use pretty_assertions::assert_eq;

        assert_eq!(GitRef::classify(input), expect);
    }

    #[test_case("refs/heads/main", "main"; "branch")]
    #[test_case("refs/tags/v1", "v1"; "tag")]
    #[test_case("refs/tags/refs-heads-x", "refs-heads-x"; "prefix-like tag name")]
    #[test_case("main", "main"; "already bare")]
    #[test]
    fn truncate_is_idempotent(input: &str, expect: &str) {
        use pretty_assertions::assert_eq;

        assert_eq!(truncate(input), expect);
        assert_eq!(truncate(truncate(input)), truncate(input));
    }

    #[test]
    fn full_name_reverses_classification() {
        for reference in [
            "refs/heads/main",
            "refs/tags/v2.1",
            "f2e20031ddce5cb097105f4d8ccbc77f4ac20709",
            "whatever",
        ] {
            assert_eq!(GitRef::classify(reference).full_name(), reference);
        }
    }

    #[test]
    fn bare_constructors_accept_qualified_names() {
        assert_eq!(GitRef::branch("refs/heads/dev"), GitRef::Branch("dev".into()));
        assert_eq!(GitRef::branch("dev"), GitRef::Branch("dev".into()));
        assert_eq!(GitRef::tag("v1"), GitRef::Tag("v1".into()));
    }
}
