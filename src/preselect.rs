// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Preselection resolution.
//!
//! Before the script picker is shown, each template entry gets an initial
//! checked state. This state comes from what the batch already has installed,
//! so that re-running over the same repositories starts from the previous
//! selection.
//!
//! # Modes
//!
//! - __Force reset__: nothing is pre-checked, and nothing is probed. A forced
//!   reinitialize recreates the target folder contents from scratch.
//! - __Union__: pre-check an entry if at least one repository has it.
//! - __Intersection__: pre-check an entry only if every repository has it.
//!   This is the default.
//!
//! Force reset always wins over union. With a single repository batch, union
//! and intersection agree, so union has no observable effect per repository.

use crate::{
    repo::{Repository, TargetFolder},
    state::{PresenceMatrix, StateError},
};

use tracing::{debug, instrument};

/// Way to combine per repository presence into one preselection.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum PreselectionMode {
    /// Nothing pre-checked.
    ForceReset,

    /// Logical OR across the batch.
    Union,

    /// Logical AND across the batch.
    #[default]
    Intersection,
}

impl PreselectionMode {
    /// Pick mode from configuration switches.
    ///
    /// Force reinitialize takes precedence over union.
    pub fn from_flags(force_reinitialize: bool, union_preselections: bool) -> Self {
        match (force_reinitialize, union_preselections) {
            (true, _) => Self::ForceReset,
            (false, true) => Self::Union,
            (false, false) => Self::Intersection,
        }
    }

    /// Combine presence of one entry across the batch.
    ///
    /// An empty batch yields `true` for intersection and `false` for union.
    pub fn combine(&self, occurrence: &[bool]) -> bool {
        match self {
            Self::ForceReset => false,
            Self::Union => occurrence.iter().any(|found| *found),
            Self::Intersection => occurrence.iter().all(|found| *found),
        }
    }
}

/// Resolve preselection vector from an already probed presence matrix.
pub fn from_matrix(mode: PreselectionMode, matrix: &PresenceMatrix) -> Vec<bool> {
    matrix.rows().map(|row| mode.combine(row)).collect()
}

/// Resolve preselection vector for a batch.
///
/// Result aligns positionally with `entries`. Under
/// [`PreselectionMode::ForceReset`] the filesystem is not touched.
///
/// # Errors
///
/// - Return [`StateError::PermissionAggregate`] if some template copy exists
///   without execute bits in any repository of the batch.
/// - Return [`StateError::Probe`] if a template copy cannot be stat'ed.
#[instrument(skip(repos, target, entries), level = "debug")]
pub fn resolve(
    mode: PreselectionMode,
    repos: &[Repository],
    target: &TargetFolder,
    entries: &[String],
) -> Result<Vec<bool>, StateError> {
    if mode == PreselectionMode::ForceReset {
        debug!("forced reinitialize, skip probing");
        return Ok(vec![false; entries.len()]);
    }

    let matrix = PresenceMatrix::probe(repos, target, entries)?;
    let preselection = from_matrix(mode, &matrix);
    debug!("resolved preselection {preselection:?}");

    Ok(preselection)
}
