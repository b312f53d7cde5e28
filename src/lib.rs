// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Herd many git repositories from one manifest.
//!
//! A __manifest__ (`corral.toml`) lists __projects__, i.e., git repositories
//! organized into __groups__, along with the remote, ref, and clone depth
//! each one should sit on. Corral reconciles the working copies on disk
//! with that desired state, optionally for many projects at once.
//!
//! # Layers
//!
//! - [`manifest`]: resolved, read-only view of the manifest.
//! - [`repo`]: reconciliation engine for a single working copy.
//! - [`coordinator`]: fork and upstream handling on top of the engine.
//! - [`batch`]: bounded parallel fan out with fail-fast semantics.
//!
//! # Forks
//!
//! A project may name a __fork__. The working copy then carries two remotes:
//! the fork, which is herded and pushed to, and the upstream project, which
//! is only ever fetched or pulled from.

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod manifest;
pub mod path;
pub mod repo;

pub use batch::{BatchError, Orchestrator};
pub use manifest::{Manifest, ManifestError, Project};
pub use repo::{GitRef, Repo, RepoError};
