// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where the manifest lives, and where fixed versions of it are
//! kept. Every project path in a manifest is relative to the directory that
//! holds the manifest, called the __root__.

use std::path::{Path, PathBuf};

/// File name of the manifest at the root directory.
pub const MANIFEST_FILE: &str = "corral.toml";

/// Directory below the root that holds fixed versions.
pub const VERSIONS_DIR: &str = "versions";

/// Find the root directory, starting at `start` and walking up.
///
/// # Errors
///
/// - Return [`NoManifest`] if neither `start` nor any of its ancestors
///   holds a manifest.
pub fn find_root(start: impl AsRef<Path>) -> Result<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| NoManifest(start.as_ref().to_path_buf()))
}

/// Path of the manifest to load, either the live one or a fixed version.
///
/// Does not check if the path returned actually exists.
pub fn manifest_path(root: impl AsRef<Path>, version: Option<&str>) -> PathBuf {
    match version {
        Some(version) => version_path(root, version),
        None => root.as_ref().join(MANIFEST_FILE),
    }
}

/// Path of fixed version `version` of the manifest.
pub fn version_path(root: impl AsRef<Path>, version: &str) -> PathBuf {
    root.as_ref()
        .join(VERSIONS_DIR)
        .join(version)
        .join(MANIFEST_FILE)
}

/// No manifest in the working directory or any of its ancestors.
#[derive(Clone, Debug, thiserror::Error)]
#[error("no {MANIFEST_FILE} found in {0:?} or any parent directory")]
pub struct NoManifest(pub PathBuf);

/// Friendly result alias :3
pub type Result<T, E = NoManifest> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn find_root_walks_up() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        std::fs::write(root.join(MANIFEST_FILE), "")?;
        let nested = root.join("black-cats").join("kit");
        std::fs::create_dir_all(&nested)?;

        assert_eq!(find_root(&nested)?, root);

        Ok(())
    }

    #[sealed_test]
    fn find_root_without_manifest() -> anyhow::Result<()> {
        let start = std::env::current_dir()?.join("nowhere");
        std::fs::create_dir_all(&start)?;

        // Sandboxes live below the system temporary directory, which has no
        // manifest of its own.
        assert!(find_root(&start).is_err());

        Ok(())
    }

    #[test]
    fn fixed_version_lives_under_versions() {
        assert_eq!(
            manifest_path("/work", Some("v1")),
            PathBuf::from("/work/versions/v1/corral.toml")
        );
        assert_eq!(manifest_path("/work", None), PathBuf::from("/work/corral.toml"));
    }
}
