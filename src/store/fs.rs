//! Filesystem utilities used alongside framed files
//!
//! Queries (`path_exists`, `file_size_of`, `list_directory`) swallow errors
//! and return a neutral value. Mutations (`create_directory`,
//! `create_symlink`) return a `StoreResult`. Every failure is logged here,
//! at the point it happens.

use std::fs;
use std::io;
use std::path::Path;

use crate::observability::{log_event, Event};

use super::errors::{StoreError, StoreResult};

/// Returns whether any filesystem entry exists at `path`.
///
/// Any error while checking counts as "does not exist".
pub fn path_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

/// Returns the byte length of the file at `path`, or 0 if it cannot be stat'ed.
pub fn file_size_of(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            log_path_error(Event::FileSizeFailed, path, &e);
            0
        }
    }
}

/// Removes the file at `path`. A missing file is not an error.
pub fn remove_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log_path_error(Event::DeleteFailed, path, &e),
    }
}

/// Creates `path` and any missing ancestors. Succeeds if it already exists.
pub fn create_directory(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).map_err(|e| {
        log_path_error(Event::DirectoryCreateFailed, path, &e);
        StoreError::fs_operation(path, "Failed to create directory", e)
    })
}

/// Creates a symbolic link at `link` pointing to `target`.
///
/// Fails if anything already exists at `link`. The target need not exist.
pub fn create_symlink(target: &Path, link: &Path) -> StoreResult<()> {
    symlink(target, link).map_err(|e| {
        let target = target.display().to_string();
        let link_name = link.display().to_string();
        let error = e.to_string();
        log_event(
            Event::SymlinkCreateFailed,
            &[
                ("target", target.as_str()),
                ("link", link_name.as_str()),
                ("error", error.as_str()),
            ],
        );
        StoreError::fs_operation(link, "Failed to create symlink", e)
    })
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

/// Returns the base names of the entries directly inside `path`.
///
/// Order is whatever the filesystem enumerates. A missing directory yields
/// an empty list without logging; any other error is logged and whatever
/// was collected before it is returned.
pub fn list_directory(path: &Path) -> Vec<String> {
    let mut names = Vec::new();

    if !path_exists(path) {
        return names;
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            log_path_error(Event::DirectoryListFailed, path, &e);
            return names;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => names.push(entry.file_name().to_string_lossy().into_owned()),
            Err(e) => {
                log_path_error(Event::DirectoryListFailed, path, &e);
                break;
            }
        }
    }

    names
}

pub(crate) fn log_path_error(event: Event, path: &Path, e: &dyn std::fmt::Display) {
    let path = path.display().to_string();
    let error = e.to_string();
    log_event(event, &[("path", path.as_str()), ("error", error.as_str())]);
}
