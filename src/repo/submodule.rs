// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Nested sub-repositories.

use crate::repo::{git::gitcall, Repo, Result};

use git2::{SubmoduleIgnore, SubmoduleStatus};
use tracing::{debug, info};

impl Repo {
    /// Check if working copy declares any submodules.
    pub fn has_submodules(&self) -> bool {
        self.path.join(".gitmodules").is_file()
    }

    /// Check if any initialized submodule carries changes of its own.
    pub fn has_dirty_submodules(&self) -> Result<bool> {
        if !self.has_submodules() {
            return Ok(false);
        }

        let repository = self.open()?;
        for submodule in repository.submodules()? {
            let Some(name) = submodule.name() else {
                continue;
            };

            let status = repository.submodule_status(name, SubmoduleIgnore::None)?;
            if status.intersects(
                SubmoduleStatus::WD_INDEX_MODIFIED
                    | SubmoduleStatus::WD_WD_MODIFIED
                    | SubmoduleStatus::WD_UNTRACKED,
            ) {
                debug!("submodule {name} is dirty");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Initialize and update submodules recursively at `depth`.
    ///
    /// Does nothing unless the working copy is marked recursive.
    pub async fn update_submodules(&self, depth: u32) -> Result<()> {
        if !self.recursive || !self.has_submodules() {
            return Ok(());
        }

        info!(" - Update submodules");
        let mut args = vec![
            "submodule".to_string(),
            "update".to_string(),
            "--init".to_string(),
            "--recursive".to_string(),
        ];
        if depth != 0 {
            args.push(format!("--depth={depth}"));
        }
        gitcall(&self.path, args).await?;

        Ok(())
    }

    /// Discard every change inside submodules and check them out again.
    pub async fn clean_submodules(&self) -> Result<()> {
        if !self.has_submodules() {
            return Ok(());
        }

        info!(" - Clean submodules");
        gitcall(
            &self.path,
            ["submodule", "foreach", "--recursive", "git clean -ffdx"],
        )
        .await?;
        gitcall(
            &self.path,
            ["submodule", "foreach", "--recursive", "git reset --hard"],
        )
        .await?;
        gitcall(
            &self.path,
            ["submodule", "update", "--checkout", "--recursive", "--force"],
        )
        .await?;

        Ok(())
    }
}
