//! Relocation specification models and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::conf::{C_DIR_DESTINATION_DEFAULT, C_DIR_SOURCE_DEFAULT, TUP_PRESERVE_FILES_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How preserve-set entries are compared against a file basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPreserveMatchMode {
    /// Exact basename equality.
    #[default]
    Exact,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression, matched anywhere in the basename unless anchored.
    Regex,
}

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRelocateSymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    #[default]
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Filesystem operation that failed, carried by [`RelocateError::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRelocateOp {
    Inspect,
    ReadDir,
    CreateDir,
    CopyFile,
    CopySymlink,
    RemoveSource,
}

impl fmt::Display for EnumRelocateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_op = match self {
            Self::Inspect => "inspect",
            Self::ReadDir => "read directory",
            Self::CreateDir => "create directory",
            Self::CopyFile => "copy file",
            Self::CopySymlink => "copy symlink",
            Self::RemoveSource => "remove source directory",
        };
        f.write_str(c_op)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::relocate_build_output`].
///
/// `Default` reproduces the hard-coded layout of the post-build step
/// (see [`crate::conf`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRelocateOptions {
    /// Temporary build output; consumed and removed.
    pub dir_source: PathBuf,
    /// Persistent distribution directory; merged into in place.
    pub dir_destination: PathBuf,
    /// File basenames that are never written into the destination.
    pub preserve_files: Vec<String>,
    /// How `preserve_files` entries are interpreted.
    pub rule_preserve_match: EnumPreserveMatchMode,
    /// Symlink handling behavior.
    pub rule_symlink: EnumRelocateSymlinkStrategy,
    /// Also carry permission bits, timestamps and xattrs onto copied files.
    pub if_keep_metadata: bool,
    /// Remove `dir_source` after the copy phase.
    pub if_cleanup_source: bool,
    /// Do not mutate filesystem; log what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecRelocateOptions {
    fn default() -> Self {
        Self {
            dir_source: PathBuf::from(C_DIR_SOURCE_DEFAULT),
            dir_destination: PathBuf::from(C_DIR_DESTINATION_DEFAULT),
            preserve_files: TUP_PRESERVE_FILES_DEFAULT
                .iter()
                .map(|c_name| c_name.to_string())
                .collect(),
            rule_preserve_match: EnumPreserveMatchMode::Exact,
            rule_symlink: EnumRelocateSymlinkStrategy::Dereference,
            if_keep_metadata: false,
            if_cleanup_source: true,
            if_dry_run: false,
        }
    }
}

impl SpecRelocateOptions {
    pub fn with_source(mut self, dir_source: impl Into<PathBuf>) -> Self {
        self.dir_source = dir_source.into();
        self
    }

    pub fn with_destination(mut self, dir_destination: impl Into<PathBuf>) -> Self {
        self.dir_destination = dir_destination.into();
        self
    }

    pub fn with_preserve_files<I, S>(mut self, preserve_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserve_files = preserve_files.into_iter().map(Into::into).collect();
        self
    }
}

/// Errors that abort a relocation run.
///
/// A missing source root is not represented here; it is a normal outcome
/// (see [`crate::EnumRelocateOutcome::SourceMissing`]).
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Invalid preserve pattern (glob/regex modes only).
    #[error("Invalid pattern in preserve list: {0}")]
    InvalidPattern(String),
    /// Source path exists but is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .source_dir.display(),
        .destination_dir.display()
    )]
    SourceDestinationOverlap {
        source_dir: PathBuf,
        destination_dir: PathBuf,
    },
    /// Destination root could not be created or is unusable.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed { path: PathBuf, message: String },
    /// A derived destination path escapes the root or crosses a symlink.
    #[error("{message}")]
    UnsafeDestination { path: PathBuf, message: String },
    /// Any filesystem failure during the copy or cleanup phase.
    #[error("Failed to {op} {}", .path.display())]
    Io {
        op: EnumRelocateOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocateError {
    pub(crate) fn io(op: EnumRelocateOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Path the failure is attached to, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InvalidPattern(_) => None,
            Self::SourceNotDirectory(path) => Some(path),
            Self::SourceDestinationOverlap { source_dir, .. } => Some(source_dir),
            Self::DestinationInitFailed { path, .. }
            | Self::UnsafeDestination { path, .. }
            | Self::Io { path, .. } => Some(path),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
