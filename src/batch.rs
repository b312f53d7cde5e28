// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Batch orchestration.
//!
//! Fan one operation out across many projects with bounded parallelism. An
//! [`Orchestrator`] is built per batch, owns its worker tasks, its progress
//! counter, and the order results are consumed in, and holds nothing once
//! the batch is over.
//!
//! # Fail Fast
//!
//! Results are drained in submission order, not completion order. The first
//! failure drained aborts every outstanding worker and is the only failure
//! reported, even if a later unit failed earlier in wall clock time.
//! Aborting a worker drops its future, which kills any `git` child it was
//! waiting on.

use crate::{manifest::Project, repo::RepoError};

use futures::{future::join_all, FutureExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    any::Any,
    future::Future,
    num::NonZeroUsize,
    panic::AssertUnwindSafe,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, instrument, warn};

/// Exit code reported for a cancelled batch.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Unit of work in a batch.
pub trait Unit: Send + 'static {
    /// Path of the working copy the unit operates on.
    fn path(&self) -> PathBuf;
}

impl Unit for Project {
    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Error a unit of work can fail with.
pub trait Failure: std::error::Error + Send + 'static {
    /// Process exit code to report if this failure ends the batch.
    fn exit_code(&self) -> i32 {
        1
    }
}

impl Failure for RepoError {
    fn exit_code(&self) -> i32 {
        RepoError::exit_code(self)
    }
}

/// Lifecycle of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Outcome of a batch that ran to completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: usize,
}

/// Bounded parallel runner with fail-fast draining.
#[derive(Debug)]
pub struct Orchestrator {
    limit: usize,
    bar: ProgressBar,
    progress: Arc<AtomicU64>,
    state: BatchState,
}

impl Orchestrator {
    /// Construct new orchestrator drawing a progress bar.
    ///
    /// Parallelism defaults to what the machine offers.
    ///
    /// # Errors
    ///
    /// - Return [`BatchError::IndicatifStyleTemplate`] if the progress bar
    ///   template is rejected.
    pub fn new() -> Result<Self> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
        )?
        .progress_chars("-Cco.");

        Ok(Self::with_bar(ProgressBar::new(0).with_style(style)))
    }

    /// Construct new orchestrator that draws nothing.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    /// Run at most `limit` units at once.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Number of units finished so far, successful or not.
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::SeqCst)
    }

    /// Run `job` over every unit, cancelling on interrupt.
    ///
    /// See [`Orchestrator::run_until`].
    pub async fn run<U, F, Fut, E>(&mut self, units: Vec<U>, job: F) -> Result<BatchReport>
    where
        U: Unit,
        F: FnMut(U) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Failure,
    {
        let interrupt = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for interrupt: {error}");
                std::future::pending::<()>().await;
            }
        };

        self.run_until(units, job, interrupt).await
    }

    /// Run `job` over every unit until done, failed, or `shutdown` fires.
    ///
    /// # Errors
    ///
    /// - Return [`BatchError::Failed`] with the first failure in submission
    ///   order. Panicking units count as failures.
    /// - Return [`BatchError::Cancelled`] if `shutdown` completes first.
    #[instrument(skip_all, fields(units = units.len(), limit = self.limit), level = "debug")]
    pub async fn run_until<U, F, Fut, E, S>(
        &mut self,
        units: Vec<U>,
        mut job: F,
        shutdown: S,
    ) -> Result<BatchReport>
    where
        U: Unit,
        F: FnMut(U) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Failure,
        S: Future<Output = ()>,
    {
        self.state = BatchState::Running;
        self.progress.store(0, Ordering::SeqCst);
        self.bar.set_length(units.len() as u64);
        self.bar.set_position(0);

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut paths = Vec::with_capacity(units.len());
        let mut handles = Vec::with_capacity(units.len());
        for unit in units {
            let path = unit.path();
            paths.push(path.clone());
            handles.push(self.spawn(&semaphore, path, job(unit)));
        }

        tokio::pin!(shutdown);
        for index in 0..handles.len() {
            let joined = tokio::select! {
                biased;
                () = &mut shutdown => None,
                joined = &mut handles[index] => Some(joined),
            };

            let failure = match joined {
                Some(Ok(Ok(()))) => continue,
                Some(Ok(Err(failure))) => failure,
                Some(Err(join_error)) => JobError {
                    path: paths[index].clone(),
                    message: format!("worker did not finish: {join_error}"),
                    code: 1,
                },
                None => {
                    warn!("batch interrupted, stopping {} workers", handles.len() - index);
                    self.abort(&semaphore, &mut handles[index..]).await;
                    return Err(BatchError::Cancelled);
                }
            };

            debug!("unit {index} failed, aborting the rest of the batch");
            self.abort(&semaphore, &mut handles[index + 1..]).await;
            return Err(BatchError::Failed(failure));
        }

        self.state = BatchState::Completed;
        self.bar.finish_and_clear();

        Ok(BatchReport {
            completed: handles.len(),
        })
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let limit = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);

        Self {
            limit,
            bar,
            progress: Arc::new(AtomicU64::new(0)),
            state: BatchState::Idle,
        }
    }

    fn spawn<Fut, E>(
        &self,
        semaphore: &Arc<Semaphore>,
        path: PathBuf,
        work: Fut,
    ) -> JoinHandle<Result<(), JobError>>
    where
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Failure,
    {
        let semaphore = semaphore.clone();
        let bar = self.bar.clone();
        let progress = self.progress.clone();

        tokio::spawn(async move {
            // INVARIANT: The semaphore is only closed once the batch aborts.
            let _permit = semaphore.acquire_owned().await.map_err(|_| JobError {
                path: path.clone(),
                message: "batch aborted before unit started".into(),
                code: 1,
            })?;

            bar.set_message(path.display().to_string());
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result.map_err(|failure| JobError {
                    path: path.clone(),
                    message: failure.to_string(),
                    code: failure.exit_code(),
                }),
                Err(payload) => Err(JobError {
                    path: path.clone(),
                    message: format!("unit panicked: {}", panic_message(payload.as_ref())),
                    code: 1,
                }),
            };

            // INVARIANT: Count every unit that ran, whatever its outcome.
            progress.fetch_add(1, Ordering::SeqCst);
            bar.inc(1);

            result
        })
    }

    async fn abort(
        &mut self,
        semaphore: &Semaphore,
        outstanding: &mut [JoinHandle<Result<(), JobError>>],
    ) {
        self.state = BatchState::Aborted;
        semaphore.close();
        for handle in outstanding.iter() {
            handle.abort();
        }

        join_all(outstanding.iter_mut()).await;
        self.bar.abandon();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Failure of one unit inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path:?}: {message}")]
pub struct JobError {
    pub path: PathBuf,
    pub message: String,
    pub code: i32,
}

/// Batch error types.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// First failure in submission order.
    #[error(transparent)]
    Failed(#[from] JobError),

    /// Interrupted before every unit finished.
    #[error("batch cancelled by interrupt")]
    Cancelled,

    /// Progress bar template is invalid.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

impl BatchError {
    /// Process exit code to report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed(failure) => failure.code,
            Self::Cancelled => CANCELLED_EXIT_CODE,
            Self::IndicatifStyleTemplate(_) => 1,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = BatchError> = std::result::Result<T, E>;
