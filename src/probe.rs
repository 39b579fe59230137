// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Filesystem probing primitives.
//!
//! Thin wrappers around the handful of filesystem operations the rest of the
//! crate needs: stat checks, listing executables, exact line search, copying
//! with permission bits, and newline-safe appends. Every failure carries the
//! path that caused it.
//!
//! A not-found condition is only treated as a valid "absent" state where a
//! function says so. Everything else propagates as a [`ProbeError`].

use ignore::WalkBuilder;
use std::{
    fs::{self, File, Metadata, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Check if path exists and is a directory.
///
/// # Errors
///
/// - Return [`ProbeError::Stat`] if path cannot be stat'ed for any reason
///   other than not existing.
pub fn directory_exists(path: impl AsRef<Path>) -> Result<bool> {
    match fs::metadata(path.as_ref()) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ProbeError::Stat {
            source: err,
            path: path.as_ref().to_path_buf(),
        }),
    }
}

/// Stat a path, treating a missing path as `None`.
///
/// Symbolic links are followed.
///
/// # Errors
///
/// - Return [`ProbeError::Stat`] if path cannot be stat'ed for any reason
///   other than not existing.
pub fn stat_if_present(path: impl AsRef<Path>) -> Result<Option<Metadata>> {
    match fs::metadata(path.as_ref()) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ProbeError::Stat {
            source: err,
            path: path.as_ref().to_path_buf(),
        }),
    }
}

/// Check if metadata describes a file with any execute bit set.
#[cfg(unix)]
pub fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

/// Check if metadata describes a file with any execute bit set.
///
/// Platforms without permission bits treat every file as executable.
#[cfg(not(unix))]
pub fn is_executable(_metadata: &Metadata) -> bool {
    true
}

/// List names of executable regular files directly inside a directory.
///
/// Directories, symbolic links, and files lacking every execute bit are left
/// out. Names are sorted so the listing stays stable for the whole run.
///
/// # Errors
///
/// - Return [`ProbeError::ReadDir`] if directory cannot be opened or read.
#[instrument(skip(dir), level = "debug")]
pub fn list_top_level_executables(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let read_dir_err = |err| ProbeError::ReadDir {
        source: err,
        path: dir.to_path_buf(),
    };

    let mut executables = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let metadata = entry.metadata().map_err(|err| ProbeError::Stat {
            source: err,
            path: entry.path(),
        })?;

        if metadata.is_file() && is_executable(&metadata) {
            executables.push(entry.file_name().to_string_lossy().into_owned());
        } else {
            debug!("skip non-executable entry {:?}", entry.path().display());
        }
    }
    executables.sort();

    Ok(executables)
}

/// Check if some line of a file equals target line exactly.
///
/// Lines are split on `\n` with a single trailing `\r` dropped. No other
/// trimming happens. A missing file simply contains no lines.
///
/// # Errors
///
/// - Return [`ProbeError::ReadFile`] if existing file cannot be read.
pub fn line_exists_in_file(path: impl AsRef<Path>, exact_line: impl AsRef<str>) -> Result<bool> {
    let path = path.as_ref();
    let read_err = |err| ProbeError::ReadFile {
        source: err,
        path: path.to_path_buf(),
    };

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(read_err(err)),
    };

    let needle = exact_line.as_ref().as_bytes();
    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(read_err)?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if line == needle {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Copy file content and permission bits from source to destination.
///
/// Destination is created or truncated.
///
/// # Errors
///
/// - Return [`ProbeError::Copy`] if content cannot be copied.
/// - Return [`ProbeError::Permissions`] if permission bits cannot be
///   replicated onto destination.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    fs::copy(src, dst).map_err(|err| ProbeError::Copy {
        source: err,
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
    })?;

    // INVARIANT: Destination always ends up with the source's mode, even when
    // it existed beforehand with different bits.
    let permissions = fs::metadata(src)
        .map_err(|err| ProbeError::Stat {
            source: err,
            path: src.to_path_buf(),
        })?
        .permissions();
    fs::set_permissions(dst, permissions).map_err(|err| ProbeError::Permissions {
        source: err,
        path: dst.to_path_buf(),
    })?;

    Ok(())
}

/// Append line to file, making sure it starts on a fresh line.
///
/// Creates the file if missing. When the file is non-empty and does not end
/// in a newline, one is written before `line`. The appended line is always
/// newline terminated.
///
/// # Errors
///
/// - Return [`ProbeError::OpenFile`] if file cannot be opened or created.
/// - Return [`ProbeError::ReadFile`] if the last byte cannot be inspected.
/// - Return [`ProbeError::WriteFile`] if line cannot be written.
pub fn append_line_ensuring_newline(path: impl AsRef<Path>, line: impl AsRef<str>) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| ProbeError::OpenFile {
            source: err,
            path: path.to_path_buf(),
        })?;

    let read_err = |err| ProbeError::ReadFile {
        source: err,
        path: path.to_path_buf(),
    };
    let size = file.metadata().map_err(read_err)?.len();

    let mut out = String::new();
    if size > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(read_err)?;
        file.read_exact(&mut last).map_err(read_err)?;
        if last[0] != b'\n' {
            out.push('\n');
        }
    }
    out.push_str(line.as_ref());
    out.push('\n');

    file.write_all(out.as_bytes())
        .map_err(|err| ProbeError::WriteFile {
            source: err,
            path: path.to_path_buf(),
        })?;

    Ok(())
}

/// Create directory and any missing parents.
///
/// # Errors
///
/// - Return [`ProbeError::CreateDir`] if directory cannot be created.
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<()> {
    mkdirp::mkdirp(path.as_ref()).map_err(|err| ProbeError::CreateDir {
        source: err,
        path: path.as_ref().to_path_buf(),
    })?;

    Ok(())
}

/// Remove every non-directory entry below a directory.
///
/// Walks the whole tree without honoring any ignore files. Directories
/// themselves are kept. Returns the number of removed entries.
///
/// # Errors
///
/// - Return [`ProbeError::Walk`] if directory tree cannot be traversed.
/// - Return [`ProbeError::Remove`] if an entry cannot be removed.
#[instrument(skip(dir), level = "debug")]
pub fn remove_all_files(dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut removed = 0;
    for entry in walker {
        let entry = entry.map_err(|err| ProbeError::Walk {
            source: err,
            path: dir.to_path_buf(),
        })?;

        if entry.file_type().is_some_and(|kind| !kind.is_dir()) {
            debug!("remove {:?}", entry.path().display());
            fs::remove_file(entry.path()).map_err(|err| ProbeError::Remove {
                source: err,
                path: entry.path().to_path_buf(),
            })?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Filesystem probing error types.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Path cannot be stat'ed.
    #[error("failed to stat {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be opened or listed.
    #[error("failed to read directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be read from.
    #[error("failed to read from {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be opened or created.
    #[error("failed to open or create {:?}", path.display())]
    OpenFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written to.
    #[error("failed to write to {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File content cannot be copied.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Permission bits cannot be set.
    #[error("failed to set permissions on {:?}", path.display())]
    Permissions {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory tree cannot be traversed.
    #[error("failed to walk directory {:?}", path.display())]
    Walk {
        #[source]
        source: ignore::Error,
        path: PathBuf,
    },

    /// Entry cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ProbeError> = std::result::Result<T, E>;
