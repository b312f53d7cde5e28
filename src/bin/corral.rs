// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use corral::{
    batch::{BatchError, Orchestrator},
    coordinator::{self, PruneScope},
    manifest::{Manifest, Project},
    path::find_root,
    repo::{maintain::BranchScope, RepoError},
};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::{future::Future, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  corral [options] <corral-command>",
    subcommand_help_heading = "Commands",
    disable_version_flag = true
)]
struct Cli {
    /// Load fixed version of manifest instead of the live one.
    #[arg(long, global = true, value_name = "version")]
    pub version: Option<String>,

    /// Only operate on these groups.
    #[arg(short, long, global = true, value_delimiter = ',', value_name = "group")]
    pub groups: Vec<String>,

    /// Only operate on these projects, by name or path.
    #[arg(short, long, global = true, value_delimiter = ',', value_name = "project")]
    pub projects: Vec<String>,

    /// Number of projects worked on at once in parallel mode.
    #[arg(short, long, global = true, value_name = "jobs")]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn is_parallel(&self) -> bool {
        match &self.command {
            Command::Herd(opts) => opts.parallel,
            Command::Sync(opts) => opts.parallel,
            Command::Reset(opts) => opts.parallel,
            Command::Fetch(opts) => opts.parallel,
            Command::Clean(opts) => opts.parallel,
            Command::Stash(opts) => opts.parallel,
            Command::Forall(opts) => opts.parallel,
            _ => false,
        }
    }

    async fn run(self) -> Result<()> {
        let root = find_root(std::env::current_dir()?)?;
        let manifest = Manifest::load(&root, self.version.as_deref())?;
        let projects = manifest.select(&self.groups, &self.projects)?;
        let pool = Pool {
            jobs: self.jobs,
            parallel: self.is_parallel(),
        };

        match self.command {
            Command::Herd(opts) => run_herd(opts, projects, pool).await,
            Command::Sync(opts) => run_sync(opts, projects, pool).await,
            Command::Reset(opts) => run_reset(opts, &manifest, projects, pool).await,
            Command::Fetch(_) => {
                pool.fan_out(projects, |project| async move {
                    coordinator::fetch(&project).await
                })
                .await
            }
            Command::Status(opts) => run_status(opts, projects).await,
            Command::Diff => run_diff(projects).await,
            Command::Branch(opts) => run_branch(opts, projects).await,
            Command::Clean(opts) => run_clean(opts, projects, pool).await,
            Command::Stash(_) => {
                pool.fan_out(projects, |project| async move {
                    coordinator::stash(&project).await
                })
                .await
            }
            Command::Start(opts) => run_start(opts, projects).await,
            Command::Prune(opts) => run_prune(opts, projects).await,
            Command::Forall(opts) => run_forall(opts, projects, pool).await,
            Command::Fix(opts) => run_fix(opts, &manifest),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clone and reconcile projects with the manifest.
    #[command(override_usage = "corral herd [options]")]
    Herd(HerdOptions),

    /// Sync forks with their upstream default branch.
    #[command(override_usage = "corral sync [options]")]
    Sync(SyncOptions),

    /// Hard reset projects onto their upstream default ref.
    #[command(override_usage = "corral reset [options]")]
    Reset(ResetOptions),

    /// Fetch remotes of projects.
    #[command(override_usage = "corral fetch [options]")]
    Fetch(FetchOptions),

    /// Show one line summary of each project.
    #[command(override_usage = "corral status [options]")]
    Status(StatusOptions),

    /// Show verbose status of each project.
    #[command(override_usage = "corral diff [options]")]
    Diff,

    /// List branches of each project.
    #[command(override_usage = "corral branch [options]")]
    Branch(BranchOptions),

    /// Discard changes of projects.
    #[command(override_usage = "corral clean [options]")]
    Clean(CleanOptions),

    /// Stash changes of projects.
    #[command(override_usage = "corral stash [options]")]
    Stash(StashOptions),

    /// Start new branch in projects.
    #[command(override_usage = "corral start [options] <branch>")]
    Start(StartOptions),

    /// Delete branch of projects.
    #[command(override_usage = "corral prune [options] <branch>")]
    Prune(PruneOptions),

    /// Run shell command in each project.
    #[command(override_usage = "corral forall [options] <command>")]
    Forall(ForallOptions),

    /// Write fixed version of manifest pinned to current commits.
    #[command(override_usage = "corral fix [options] <version>")]
    Fix(FixOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct HerdOptions {
    /// Herd this branch, falling back to the configured ref.
    #[arg(short, long, group = "target", value_name = "branch")]
    pub branch: Option<String>,

    /// Herd this tag, falling back to the configured ref.
    #[arg(short, long, group = "target", value_name = "tag")]
    pub tag: Option<String>,

    /// Clone depth to use instead of the configured one.
    #[arg(short, long, value_name = "depth")]
    pub depth: Option<u32>,

    /// Rebase instead of merge when pulling.
    #[arg(short, long)]
    pub rebase: bool,

    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SyncOptions {
    /// Rebase instead of merge when pulling upstream.
    #[arg(short, long)]
    pub rebase: bool,

    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ResetOptions {
    /// Reset onto commits no newer than the current commit of this project.
    #[arg(long, value_name = "project")]
    pub timestamp_from: Option<String>,

    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct FetchOptions {
    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct StatusOptions {
    /// Fetch projects before reporting.
    #[arg(short, long)]
    pub fetch: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BranchOptions {
    /// List local and remote branches.
    #[arg(short, long, group = "scope")]
    pub all: bool,

    /// List remote branches only.
    #[arg(short, long, group = "scope")]
    pub remote: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CleanOptions {
    /// Also remove untracked directories.
    #[arg(short = 'd')]
    pub directories: bool,

    /// Pass a second force flag to git clean.
    #[arg(short = 'f')]
    pub force: bool,

    /// Remove only files ignored by git.
    #[arg(short = 'X')]
    pub ignored_only: bool,

    /// Also remove files ignored by git.
    #[arg(short = 'x')]
    pub ignored: bool,

    /// Clean, reset, and update submodules too.
    #[arg(short, long)]
    pub recursive: bool,

    /// Same as -d -f -x.
    #[arg(short, long)]
    pub all: bool,

    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

impl CleanOptions {
    fn args(&self) -> String {
        if self.all {
            return "fdx".into();
        }

        [
            (self.force, 'f'),
            (self.directories, 'd'),
            (self.ignored_only, 'X'),
            (self.ignored, 'x'),
        ]
        .iter()
        .filter_map(|(set, flag)| set.then_some(*flag))
        .collect()
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct StashOptions {
    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct StartOptions {
    /// Name of branch to start.
    #[arg(required = true, value_name = "branch")]
    pub branch: String,

    /// Create matching remote branch and track it.
    #[arg(short, long)]
    pub tracking: bool,

    /// Never touch the network.
    #[arg(short, long)]
    pub offline: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PruneOptions {
    /// Name of branch to delete.
    #[arg(required = true, value_name = "branch")]
    pub branch: String,

    /// Delete local branch even if it is not merged.
    #[arg(short, long)]
    pub force: bool,

    /// Delete remote branch only.
    #[arg(short, long, group = "scope")]
    pub remote: bool,

    /// Delete local and remote branch.
    #[arg(short, long, group = "scope")]
    pub all: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ForallOptions {
    /// Command to run through `sh -c`.
    #[arg(required = true, value_name = "command")]
    pub command: String,

    /// Keep going when the command fails.
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// Work on projects in parallel.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct FixOptions {
    /// Name of fixed version to write.
    #[arg(required = true, value_name = "version")]
    pub name: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_level = if cli.is_parallel() { "warn" } else { "info" };

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = cli.run().await {
        error!("{error:?}");
        exit(exit_code(&error));
    }

    exit(0)
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(error) = error.downcast_ref::<BatchError>() {
        return error.exit_code();
    }

    if let Some(error) = error.downcast_ref::<RepoError>() {
        return error.exit_code();
    }

    1
}

/// Serial or parallel execution of one job per project.
#[derive(Debug, Clone, Copy)]
struct Pool {
    jobs: Option<usize>,
    parallel: bool,
}

impl Pool {
    async fn fan_out<F, Fut>(self, projects: Vec<Project>, mut job: F) -> Result<()>
    where
        F: FnMut(Project) -> Fut,
        Fut: Future<Output = corral::repo::Result<()>> + Send + 'static,
    {
        if !self.parallel {
            for project in projects {
                job(project).await?;
            }

            return Ok(());
        }

        let mut batch = Orchestrator::new()?;
        if let Some(jobs) = self.jobs {
            batch = batch.with_limit(jobs);
        }

        let report = batch.run(projects, job).await?;
        info!("{} projects done", report.completed);

        Ok(())
    }
}

async fn run_herd(opts: HerdOptions, projects: Vec<Project>, pool: Pool) -> Result<()> {
    let invalid = coordinator::invalid_projects(&projects).await?;
    if !invalid.is_empty() {
        for path in &invalid {
            error!("{} is dirty", path.display());
        }
        bail!("{} projects must be cleaned or stashed before herding", invalid.len());
    }

    let options = coordinator::HerdOptions {
        branch: opts.branch,
        tag: opts.tag,
        depth: opts.depth,
        rebase: opts.rebase,
    };
    pool.fan_out(projects, move |project| {
        let options = options.clone();
        async move { coordinator::herd(&project, &options).await }
    })
    .await
}

async fn run_sync(opts: SyncOptions, projects: Vec<Project>, pool: Pool) -> Result<()> {
    let forks = projects
        .into_iter()
        .filter(|project| project.fork.is_some())
        .collect::<Vec<_>>();
    if forks.is_empty() {
        bail!("no forked projects selected");
    }

    let rebase = opts.rebase;
    pool.fan_out(forks, move |project| async move {
        coordinator::sync(&project, rebase).await
    })
    .await
}

async fn run_reset(
    opts: ResetOptions,
    manifest: &Manifest,
    projects: Vec<Project>,
    pool: Pool,
) -> Result<()> {
    let timestamp = match opts.timestamp_from {
        Some(name) => {
            let source = manifest
                .select(&[], &[name.clone()])?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no project named {name:?} to take timestamp from"))?;
            Some(coordinator::timestamp(&source).await?)
        }
        None => None,
    };

    pool.fan_out(projects, move |project| {
        let timestamp = timestamp.clone();
        async move { coordinator::reset(&project, timestamp.as_deref()).await }
    })
    .await
}

async fn run_status(opts: StatusOptions, projects: Vec<Project>) -> Result<()> {
    if opts.fetch {
        for project in &projects {
            coordinator::fetch(project).await?;
        }
    }

    let width = projects
        .iter()
        .map(|project| project.path.as_os_str().len() + 1)
        .max()
        .unwrap_or_default();

    let mut group = None;
    for project in &projects {
        if group != Some(&project.group) {
            info!("{}", project.group);
            group = Some(&project.group);
        }
        info!("{}", coordinator::status_line(project, width).await?);
    }

    Ok(())
}

async fn run_diff(projects: Vec<Project>) -> Result<()> {
    for project in &projects {
        if let Some(output) = coordinator::diff(project).await? {
            info!("{}\n{output}", project.path.display());
        }
    }

    Ok(())
}

async fn run_branch(opts: BranchOptions, projects: Vec<Project>) -> Result<()> {
    let scope = if opts.all {
        BranchScope::All
    } else if opts.remote {
        BranchScope::Remote
    } else {
        BranchScope::Local
    };

    for project in &projects {
        if let Some(output) = coordinator::branches(project, scope).await? {
            info!("{}\n{output}", project.path.display());
        }
    }

    Ok(())
}

async fn run_clean(opts: CleanOptions, projects: Vec<Project>, pool: Pool) -> Result<()> {
    let args = opts.args();
    let recursive = opts.recursive;
    pool.fan_out(projects, move |project| {
        let args = args.clone();
        async move { coordinator::clean(&project, &args, recursive || project.recursive).await }
    })
    .await
}

async fn run_start(opts: StartOptions, projects: Vec<Project>) -> Result<()> {
    for project in &projects {
        coordinator::start(project, &opts.branch, opts.tracking, opts.offline).await?;
    }

    Ok(())
}

async fn run_prune(opts: PruneOptions, projects: Vec<Project>) -> Result<()> {
    let scope = if opts.all {
        PruneScope::All
    } else if opts.remote {
        PruneScope::Remote
    } else {
        PruneScope::Local
    };

    for project in &projects {
        coordinator::prune(project, &opts.branch, opts.force, scope).await?;
    }

    Ok(())
}

async fn run_forall(opts: ForallOptions, projects: Vec<Project>, pool: Pool) -> Result<()> {
    let command = opts.command;
    let ignore_errors = opts.ignore_errors;
    pool.fan_out(projects, move |project| {
        let command = command.clone();
        async move { coordinator::forall(&project, &command, ignore_errors).await }
    })
    .await
}

fn run_fix(opts: FixOptions, manifest: &Manifest) -> Result<()> {
    manifest.write_snapshot(&opts.name)?;
    Ok(())
}
