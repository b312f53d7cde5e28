// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External Git invocation.
//!
//! Anything that touches the network, the work tree, or the index goes
//! through the system `git` binary so that credential helpers, SSH agents,
//! and user configuration all apply as they would on the command line.
//! Every child is spawned with `kill_on_drop`, so dropping the future of an
//! in-flight call (aborted batch job, interrupt) also kills the child.

use crate::repo::{RepoError, Result};

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Stdio,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{debug, instrument};

/// Run git non-interactively inside `cwd`.
///
/// Returns stdout and stderr chomped and joined, the same shape the rest of
/// the crate logs. A non-zero exit becomes [`RepoError::Git`] carrying the
/// exit status and stderr of the child.
#[instrument(skip(cwd, args), level = "debug")]
pub(crate) async fn gitcall(
    cwd: &Path,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect::<Vec<_>>();
    let action = describe(&args);
    debug!("{action} in {}", cwd.display());

    let output = command(cwd, &args)
        .output()
        .await
        .map_err(|err| RepoError::Git {
            path: cwd.to_path_buf(),
            action: action.clone(),
            status: None,
            message: err.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        return Err(RepoError::Git {
            path: cwd.to_path_buf(),
            action,
            status: output.status.code(),
            message: chomp(stderr),
        });
    }

    let mut message = String::new();
    if !stdout.is_empty() {
        message.push_str(stdout.as_str());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_str());
    }

    Ok(chomp(message))
}

/// Run git inside `cwd` and report whether it printed at least one line.
///
/// Only the first line is read. The child is killed as soon as it has been
/// answered, so huge outputs cost nothing. Silence only counts as an answer
/// if git exited successfully.
pub(crate) async fn gitcall_any_line(
    cwd: &Path,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<bool> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect::<Vec<_>>();
    let action = describe(&args);
    let spawn_error = |err: std::io::Error| RepoError::Git {
        path: cwd.to_path_buf(),
        action: action.clone(),
        status: None,
        message: err.to_string(),
    };

    let mut child = command(cwd, &args).spawn().map_err(spawn_error)?;
    if let Some(stdout) = child.stdout.take() {
        let first = BufReader::new(stdout)
            .lines()
            .next_line()
            .await
            .map_err(spawn_error)?;
        if first.is_some_and(|line| !line.is_empty()) {
            return Ok(true);
        }
    }

    let output = child.wait_with_output().await.map_err(spawn_error)?;
    if !output.status.success() {
        return Err(RepoError::Git {
            path: cwd.to_path_buf(),
            action,
            status: output.status.code(),
            message: chomp(String::from_utf8_lossy(output.stderr.as_slice()).into_owned()),
        });
    }

    Ok(false)
}

fn command(cwd: &Path, args: &[OsString]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

fn describe(args: &[OsString]) -> String {
    let mut action = String::from("git");
    for arg in args {
        action.push(' ');
        action.push_str(arg.to_string_lossy().as_ref());
    }
    action
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: String) -> String {
    message.trim_end_matches(['\r', '\n']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn describe_joins_arguments() {
        let args: Vec<OsString> = vec!["fetch".into(), "origin".into(), "--prune".into()];
        assert_eq!(describe(&args), "git fetch origin --prune");
    }

    #[test]
    fn chomp_strips_every_trailing_newline() {
        assert_eq!(chomp("done\r\n\n".into()), "done");
        assert_eq!(chomp("a\nb".into()), "a\nb");
    }

    #[sealed_test]
    fn any_line_reports_first_line_only_on_success() -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let runtime = tokio::runtime::Runtime::new()?;
        let untracked = ["ls-files", "-o", "--exclude-standard"];

        let result = runtime.block_on(gitcall_any_line(&cwd, untracked));
        assert!(matches!(result, Err(RepoError::Git { status: Some(_), .. })));

        git2::Repository::init(&cwd)?;
        assert!(!runtime.block_on(gitcall_any_line(&cwd, untracked))?);

        std::fs::write(cwd.join("stray.txt"), "stray")?;
        assert!(runtime.block_on(gitcall_any_line(&cwd, untracked))?);

        Ok(())
    }

    #[tokio::test]
    async fn failing_call_reports_status_and_action() {
        let cwd = std::env::temp_dir();
        let result = gitcall(&cwd, ["definitely-not-a-git-command"]).await;
        match result {
            Err(RepoError::Git { action, status, .. }) => {
                assert_eq!(action, "git definitely-not-a-git-command");
                assert!(status.is_some_and(|code| code != 0));
            }
            other => panic!("expected git failure, got {other:?}"),
        }
    }
}
