// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target folder and gitignore state of a batch.
//!
//! Reads per repository facts that drive the decision flow: does the target
//! folder exist, does `.gitignore` already list it, and which template
//! scripts already sit in the target folder as executables. Results are plain
//! boolean vectors aligned positionally with the batch.
//!
//! # Permission Aggregation
//!
//! A template script copy that exists without any execute bit is an error,
//! not a silent `false`. Every repository in the batch is checked before such
//! errors are reported, and all of them come back together as one
//! [`NonExecutableTargets`] value.

use crate::{
    probe::{self, ProbeError},
    repo::{Repository, TargetFolder},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{debug, instrument};

/// Determine which repositories already have a target folder.
///
/// # Errors
///
/// - Return [`StateError::Probe`] if a target folder cannot be stat'ed for
///   any reason other than not existing.
#[instrument(skip(repos, target), level = "debug")]
pub fn target_presence(repos: &[Repository], target: &TargetFolder) -> Result<Vec<bool>> {
    repos
        .iter()
        .map(|repo| Ok(probe::directory_exists(repo.target_dir(target))?))
        .collect()
}

/// Determine which repositories already list the target folder in gitignore.
///
/// Only an exact `"{target}/"` line counts. A missing `.gitignore` counts as
/// not listed.
///
/// # Errors
///
/// - Return [`StateError::Probe`] if an existing `.gitignore` cannot be read.
#[instrument(skip(repos, target), level = "debug")]
pub fn gitignore_presence(repos: &[Repository], target: &TargetFolder) -> Result<Vec<bool>> {
    let pattern = target.gitignore_pattern();
    repos
        .iter()
        .map(|repo| Ok(probe::line_exists_in_file(repo.gitignore_path(), &pattern)?))
        .collect()
}

/// Determine which repositories hold an executable copy of a template entry.
///
/// A copy counts when it exists inside the target folder, is a regular file,
/// and has an execute bit. Anything else at that path that is not a regular
/// file counts as absent.
///
/// # Errors
///
/// - Return [`StateError::PermissionAggregate`] listing every repository
///   whose copy exists as a regular file without execute bits.
/// - Return [`StateError::Probe`] if a copy cannot be stat'ed for any reason
///   other than not existing.
pub fn executable_occurrence(
    repos: &[Repository],
    target: &TargetFolder,
    name: &str,
) -> Result<Vec<bool>> {
    let mut failures = NonExecutableTargets::default();
    let occurrence = occurrence_into(repos, target, name, &mut failures)?;
    failures.into_result()?;

    Ok(occurrence)
}

fn occurrence_into(
    repos: &[Repository],
    target: &TargetFolder,
    name: &str,
    failures: &mut NonExecutableTargets,
) -> Result<Vec<bool>> {
    let mut occurrence = Vec::with_capacity(repos.len());
    for repo in repos {
        let path = repo.target_entry(target, name);
        let found = match probe::stat_if_present(&path)? {
            Some(metadata) if metadata.is_file() => {
                if probe::is_executable(&metadata) {
                    true
                } else {
                    failures.push(path);
                    false
                }
            }
            Some(_) | None => false,
        };
        debug!("{name} occurs in {repo}: {found}");
        occurrence.push(found);
    }

    Ok(occurrence)
}

/// Executable presence of each template entry across a batch.
///
/// Stored as one flat row-major arena: one row per template entry, one column
/// per repository, both in the order fixed at batch start.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct PresenceMatrix {
    cells: Vec<bool>,
    entry_count: usize,
    repo_count: usize,
}

impl PresenceMatrix {
    /// Probe every template entry in every repository of a batch.
    ///
    /// Permission failures are gathered across the whole matrix before
    /// being reported.
    ///
    /// # Errors
    ///
    /// - Return [`StateError::PermissionAggregate`] if any copy exists as a
    ///   regular file without execute bits.
    /// - Return [`StateError::Probe`] if a copy cannot be stat'ed.
    #[instrument(skip_all, level = "debug")]
    pub fn probe(
        repos: &[Repository],
        target: &TargetFolder,
        entries: &[String],
    ) -> Result<Self> {
        let mut failures = NonExecutableTargets::default();
        let mut cells = Vec::with_capacity(entries.len() * repos.len());
        for entry in entries {
            cells.extend(occurrence_into(repos, target, entry, &mut failures)?);
        }
        failures.into_result()?;

        Ok(Self {
            cells,
            entry_count: entries.len(),
            repo_count: repos.len(),
        })
    }

    /// Construct matrix from explicit rows.
    ///
    /// # Panics
    ///
    /// - Panics if rows differ in length.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: impl IntoIterator<Item = impl Into<Vec<bool>>>) -> Self {
        let mut cells = Vec::new();
        let mut entry_count = 0;
        let mut repo_count = None;
        for row in rows {
            let row = row.into();
            let expect = *repo_count.get_or_insert(row.len());
            assert_eq!(row.len(), expect, "presence rows must share one length");
            cells.extend(row);
            entry_count += 1;
        }

        Self {
            cells,
            entry_count,
            repo_count: repo_count.unwrap_or_default(),
        }
    }

    /// Number of template entries.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Number of repositories in batch.
    pub fn repo_count(&self) -> usize {
        self.repo_count
    }

    /// Presence of one template entry across the batch.
    pub fn row(&self, entry: usize) -> &[bool] {
        let start = entry * self.repo_count;
        &self.cells[start..start + self.repo_count]
    }

    /// Iterate over rows in template entry order.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.entry_count()).map(|entry| self.row(entry))
    }
}

/// Template copies found without any execute bit.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct NonExecutableTargets {
    paths: Vec<PathBuf>,
}

impl NonExecutableTargets {
    /// Record offending path.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Offending paths in discovery order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of offending paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing offending was found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StateError::PermissionAggregate(self))
        }
    }
}

impl Display for NonExecutableTargets {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "no exec permissions on {} target(s):", self.len())?;
        for path in &self.paths {
            writeln!(fmt, "* {:?}", path.display())?;
        }

        Ok(())
    }
}

/// Batch state reading error types.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem probe fails.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Template copies exist without execute bits.
    #[error("{0}")]
    PermissionAggregate(NonExecutableTargets),
}

/// Friendly result alias :3
pub type Result<T, E = StateError> = std::result::Result<T, E>;
