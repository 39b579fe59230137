// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap user-specific script folders inside git repositories.
//!
//! A __template directory__ holds executable scripts. For each target
//! repository, a chosen subset of them is copied into a __target folder__,
//! e.g., `.scripts/`, that the user keeps for themselves. The target folder
//! can optionally be registered in the repository's `.gitignore`.
//!
//! Re-runs are idempotent: scripts already installed are pre-checked in the
//! selection prompt, so confirming without changes reproduces the previous
//! install.
//!
//! # See Also
//!
//! 1. [`preselect`] for how pre-checked entries are resolved.
//! 2. [`flow`] for the prompt sequence applied to each batch.

pub mod apply;
pub mod config;
pub mod flow;
pub mod preselect;
pub mod probe;
pub mod prompt;
pub mod repo;
pub mod state;
