// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Apply stage.
//!
//! Turns a final selection into filesystem changes: ensure each repository has
//! a target folder, copy every selected template script into it with its
//! permission bits, and append the target folder pattern to `.gitignore`
//! where it is missing.
//!
//! Errors abort right away. Nothing already written is rolled back.

use crate::{
    probe::{self, ProbeError},
    repo::{Repository, TargetFolder},
};

use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Copy selected template entries into every repository's target folder.
///
/// With `purge` set, every file already under an existing target folder is
/// removed before copying.
///
/// # Errors
///
/// - Return [`ApplyError::Misaligned`] if selection does not line up with
///   entries.
/// - Return [`ApplyError::Install`] if target folder cannot be created,
///   purged, or filled.
#[instrument(skip_all, level = "debug")]
pub fn install_selection(
    repos: &[Repository],
    template_dir: &Path,
    target: &TargetFolder,
    entries: &[String],
    selection: &[bool],
    purge: bool,
) -> Result<()> {
    if entries.len() != selection.len() {
        return Err(ApplyError::Misaligned {
            entries: entries.len(),
            selection: selection.len(),
        });
    }

    for repo in repos {
        let install_err = |err| ApplyError::Install {
            source: err,
            repo: repo.as_path().to_path_buf(),
        };
        let target_dir = repo.target_dir(target);

        if purge && probe::directory_exists(&target_dir).map_err(install_err)? {
            let removed = probe::remove_all_files(&target_dir).map_err(install_err)?;
            info!("purged {removed} file(s) from {:?}", target_dir.display());
        }
        probe::ensure_directory(&target_dir).map_err(install_err)?;

        let picked = entries
            .iter()
            .zip(selection)
            .filter_map(|(entry, selected)| selected.then_some(entry));
        for entry in picked {
            probe::copy_file(template_dir.join(entry), target_dir.join(entry))
                .map_err(install_err)?;
            info!("install {entry} into {repo}");
        }
    }

    Ok(())
}

/// Append target folder pattern to `.gitignore` of repositories lacking it.
///
/// Only repositories whose `presence` bit is `false` are touched.
///
/// # Errors
///
/// - Return [`ApplyError::Misaligned`] if presence does not line up with
///   repositories.
/// - Return [`ApplyError::Gitignore`] if `.gitignore` cannot be appended to.
#[instrument(skip_all, level = "debug")]
pub fn register_gitignore(
    repos: &[Repository],
    target: &TargetFolder,
    presence: &[bool],
) -> Result<()> {
    if repos.len() != presence.len() {
        return Err(ApplyError::Misaligned {
            entries: repos.len(),
            selection: presence.len(),
        });
    }

    let pattern = target.gitignore_pattern();
    for (repo, _) in repos.iter().zip(presence).filter(|(_, present)| !**present) {
        probe::append_line_ensuring_newline(repo.gitignore_path(), &pattern).map_err(|err| {
            ApplyError::Gitignore {
                source: err,
                repo: repo.as_path().to_path_buf(),
            }
        })?;
        info!("add {pattern:?} to .gitignore of {repo}");
    }

    Ok(())
}

/// Apply stage error types.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Template scripts cannot be installed.
    #[error("failed to install scripts into {:?}", repo.display())]
    Install {
        #[source]
        source: ProbeError,
        repo: PathBuf,
    },

    /// Gitignore cannot be updated.
    #[error("failed to update .gitignore of {:?}", repo.display())]
    Gitignore {
        #[source]
        source: ProbeError,
        repo: PathBuf,
    },

    /// Vectors do not line up.
    #[error("expected {entries} positions but got {selection}")]
    Misaligned { entries: usize, selection: usize },
}

/// Friendly result alias :3
pub type Result<T, E = ApplyError> = std::result::Result<T, E>;
