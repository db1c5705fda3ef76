use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::RegexSet;

use crate::spec::{EnumPreserveMatchMode, RelocateError};

////////////////////////////////////////////////////////////////////////////////
// #region PreserveMatching

/// Compiled preserve set. Only ever consulted with a file basename.
#[derive(Debug, Clone)]
pub(crate) enum SpecPreserveMatcher {
    Exact(HashSet<OsString>),
    Glob(GlobSet),
    Regex(RegexSet),
}

impl SpecPreserveMatcher {
    pub(crate) fn from_raw(
        preserve_files: &[String],
        rule_preserve_match: EnumPreserveMatchMode,
    ) -> Result<Self, RelocateError> {
        match rule_preserve_match {
            EnumPreserveMatchMode::Exact => {
                Ok(Self::Exact(preserve_files.iter().map(OsString::from).collect()))
            }
            EnumPreserveMatchMode::Glob => {
                let mut builder_glob = GlobSetBuilder::new();
                for pattern in preserve_files {
                    let glob = Glob::new(pattern)
                        .map_err(|e| RelocateError::InvalidPattern(e.to_string()))?;
                    builder_glob.add(glob);
                }
                let set_glob = builder_glob
                    .build()
                    .map_err(|e| RelocateError::InvalidPattern(e.to_string()))?;
                Ok(Self::Glob(set_glob))
            }
            EnumPreserveMatchMode::Regex => {
                let set_regex = RegexSet::new(preserve_files)
                    .map_err(|e| RelocateError::InvalidPattern(e.to_string()))?;
                Ok(Self::Regex(set_regex))
            }
        }
    }

    /// Exact and glob matching see the raw name; regex patterns only match
    /// names that are valid UTF-8.
    pub(crate) fn is_preserved(&self, name_file: &OsStr) -> bool {
        match self {
            Self::Exact(set_names) => set_names.contains(name_file),
            Self::Glob(set_glob) => set_glob.is_match(Path::new(name_file)),
            Self::Regex(set_regex) => name_file
                .to_str()
                .is_some_and(|c_name| set_regex.is_match(c_name)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the deepest existing ancestor and re-append the rest, so
/// a not-yet-created destination still compares against resolved paths.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_existing = path_abs.as_path();
    let mut l_tail: Vec<&OsStr> = Vec::new();

    loop {
        if let Ok(resolved) = fs::canonicalize(path_existing) {
            let mut path_out = resolved;
            for part in l_tail.iter().rev() {
                path_out.push(part);
            }
            return path_out;
        }
        match (path_existing.parent(), path_existing.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name);
                path_existing = parent;
            }
            _ => return path_abs.clone(),
        }
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Reject destination items that would land outside `path_dir_dst_root`.
/// The check is lexical: symlinked directories inside the destination are
/// followed like any other directory.
pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), RelocateError> {
    let err_unsafe = |message: String| RelocateError::UnsafeDestination {
        path: path_dst_item.to_path_buf(),
        message,
    };

    let path_dir_dst_root_abs = _absolutize_path(path_dir_dst_root);
    let path_dst_item_abs = _absolutize_path(path_dst_item);

    let path_rel = path_dst_item_abs
        .strip_prefix(&path_dir_dst_root_abs)
        .map_err(|_| {
            err_unsafe(format!(
                "Unsafe destination path escapes destination root: {} (root={})",
                path_dst_item.display(),
                path_dir_dst_root.display()
            ))
        })?;
    if path_rel
        .components()
        .any(|part| !matches!(part, Component::Normal(_)))
    {
        return Err(err_unsafe(format!(
            "Unsafe destination path has non-normal component: {}",
            path_dst_item.display()
        )));
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileOperations

/// Recreate the link at `path_src` as `path_dst`, replacing a non-directory
/// entry already sitting at `path_dst`.
pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let target = fs::read_link(path_src)?;

    match fs::symlink_metadata(path_dst) {
        Ok(meta_dst) if !meta_dst.is_dir() => fs::remove_file(path_dst)?,
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Destination is a directory: {}", path_dst.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Byte-copy `path_file_src` over `path_file_dst`. With `if_keep_metadata`
/// also carry permissions, access/modify times and (Linux) xattrs.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_keep_metadata: bool,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    if if_keep_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                "Skipped xattr {} on {} ({e})",
                name.to_string_lossy(),
                path_file_dst.display()
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
