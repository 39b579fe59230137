// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository data model.
//!
//! A __repository__ is an absolute path that contains a `.git` directory. Each
//! repository gets a __target folder__: a single directory name, relative to
//! the repository root, that receives copies of template scripts. Whatever
//! state we care about, e.g., whether the target folder exists, is derived on
//! demand and never stored here.
//!
//! Repositories are processed in __batches__. A batch is either every input
//! repository at once, or exactly one of them when running per repository.

use crate::probe::{self, ProbeError};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::Deref,
    path::{Component, Path, PathBuf},
    slice::Chunks,
};

/// Name of version control marker directory.
pub const DOT_GIT_DIR: &str = ".git";

/// Name of gitignore file at repository root.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Local repository that scripts get installed into.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Repository(PathBuf);

impl Repository {
    /// Open repository at absolute path.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::NotAbsolute`] if path is relative.
    /// - Return [`RepoError::NotRepository`] if path lacks a `.git` directory.
    /// - Return [`RepoError::Probe`] if `.git` directory cannot be stat'ed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(RepoError::NotAbsolute(path));
        }

        if !probe::directory_exists(path.join(DOT_GIT_DIR))? {
            return Err(RepoError::NotRepository(path));
        }

        Ok(Self(path))
    }

    /// Treat repository as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }

    /// Path to target folder inside repository.
    pub fn target_dir(&self, target: &TargetFolder) -> PathBuf {
        self.0.join(target.as_str())
    }

    /// Path to template entry copy inside repository's target folder.
    pub fn target_entry(&self, target: &TargetFolder, name: impl AsRef<Path>) -> PathBuf {
        self.target_dir(target).join(name)
    }

    /// Path to gitignore file at repository root.
    pub fn gitignore_path(&self) -> PathBuf {
        self.0.join(GITIGNORE_FILE)
    }
}

impl Display for Repository {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Name of folder that receives template scripts in each repository.
///
/// # Invariant
///
/// - Always exactly one normal path component.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TargetFolder(String);

impl TargetFolder {
    /// Construct new target folder name.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::InvalidTargetFolder`] if name is empty, contains
    ///   a path separator, or is `.` or `..`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == name.as_str() => Ok(Self(name)),
            _ => Err(RepoError::InvalidTargetFolder(name)),
        }
    }

    /// Treat target folder as string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Gitignore line that marks the target folder as ignored.
    pub fn gitignore_pattern(&self) -> String {
        format!("{}/", self.0)
    }
}

impl Display for TargetFolder {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// Set of repositories processed together in one pass.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'repo> {
    repos: &'repo [Repository],
}

impl<'repo> Batch<'repo> {
    /// Treat every given repository as one batch.
    pub fn whole(repos: &'repo [Repository]) -> Self {
        Self { repos }
    }

    /// Split repositories into single repository batches.
    pub fn each(repos: &'repo [Repository]) -> Batches<'repo> {
        Batches {
            chunks: repos.chunks(1),
        }
    }
}

impl Deref for Batch<'_> {
    type Target = [Repository];

    fn deref(&self) -> &Self::Target {
        self.repos
    }
}

/// Iterator over single repository batches.
#[derive(Debug)]
pub struct Batches<'repo> {
    chunks: Chunks<'repo, Repository>,
}

impl<'repo> Iterator for Batches<'repo> {
    type Item = Batch<'repo>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next().map(Batch::whole)
    }
}

/// Repository model error types.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Repository path is not absolute.
    #[error("repository path {:?} is not absolute", .0.display())]
    NotAbsolute(PathBuf),

    /// Repository path has no `.git` directory.
    #[error("{:?} is not a git repository", .0.display())]
    NotRepository(PathBuf),

    /// Target folder name is not a single plain directory name.
    #[error("target folder {0:?} must be a single directory name")]
    InvalidTargetFolder(String),

    /// Repository marker cannot be probed.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Friendly result alias :3
type Result<T, E = RepoError> = std::result::Result<T, E>;
