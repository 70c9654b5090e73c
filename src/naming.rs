//! Collision-free destination names.
//!
//! Both the backup area and the category directories resolve name clashes the
//! same way: `name.ext`, then `name_1.ext`, `name_2.ext`, ... up to
//! [`MAX_COLLISION_PROBES`].

use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Highest numeric suffix tried before giving up on a name.
pub const MAX_COLLISION_PROBES: u32 = 10_000;

/// Returns `dir/file_name` if free, otherwise the first free `dir/<stem>_<n>[.ext]`.
///
/// # Errors
///
/// Returns `OrganizeError::NoFreeName` when every suffix up to
/// [`MAX_COLLISION_PROBES`] is taken, and `OrganizeError::Io` when existence
/// of a candidate cannot be determined.
pub fn unique_path(dir: &Path, file_name: &Path) -> OrganizeResult<PathBuf> {
    unique_path_with_limit(dir, file_name, MAX_COLLISION_PROBES)
}

pub(crate) fn unique_path_with_limit(
    dir: &Path,
    file_name: &Path,
    limit: u32,
) -> OrganizeResult<PathBuf> {
    let candidate = dir.join(file_name);
    if !occupied(&candidate)? {
        return Ok(candidate);
    }

    for n in 1..=limit {
        let candidate = dir.join(suffixed_name(file_name, n));
        if !occupied(&candidate)? {
            return Ok(candidate);
        }
    }

    Err(OrganizeError::NoFreeName {
        directory: dir.to_path_buf(),
        file_name: file_name.to_path_buf(),
        attempts: limit,
    })
}

/// Builds `<stem>_<n>[.ext]` for a file name.
pub fn suffixed_name(file_name: &Path, n: u32) -> OsString {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| file_name.as_os_str().to_os_string());

    let mut name = stem;
    name.push(format!("_{n}"));
    if let Some(ext) = file_name.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

fn occupied(path: &Path) -> OrganizeResult<bool> {
    // Dangling symlinks count as taken: renaming onto them would replace the link.
    match path.symlink_metadata() {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(OrganizeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
