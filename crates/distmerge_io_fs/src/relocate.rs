//! Build output relocation: merge a temporary build tree into the
//! distribution directory, then remove the temporary tree.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::report::{EnumRelocateOutcome, ReportRelocate, ReportRelocateBuilder};
use crate::spec::{
    EnumRelocateOp, EnumRelocateSymlinkStrategy, RelocateError, SpecRelocateOptions,
};
use crate::util::{
    SpecPreserveMatcher, copy_file_with_metadata, create_symbolic_link, is_overlap,
    validate_destination_path_safety,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumEntryKind {
    Directory,
    File,
    /// Recreated as a link (`CopySymlinks`).
    Symlink,
    /// Not copied: skipped symlink or special file.
    Ignored,
}

#[derive(Debug, Clone)]
struct SpecEntry {
    path_src: PathBuf,
    path_rel: PathBuf,
    name: OsString,
    kind: EnumEntryKind,
}

#[derive(Debug, Clone)]
struct SpecDirTask {
    path_dir_src_sub: PathBuf,
    path_rel: PathBuf,
    /// Device/inode pairs of the directories above this one, root first.
    /// Only filled when following symlinks.
    l_dir_ancestors: Vec<(u64, u64)>,
}

#[derive(Debug)]
struct SpecRelocateContext<'a> {
    path_dir_dst: PathBuf,
    spec_options: &'a SpecRelocateOptions,
    matcher_preserve: SpecPreserveMatcher,
    builder_report: ReportRelocateBuilder,
}

/// Merge `dir_source` into `dir_destination`, skipping preserved basenames,
/// then delete `dir_source`.
///
/// Phases:
/// 1. Missing source check. A source root that does not exist is a normal
///    no-op and yields [`EnumRelocateOutcome::SourceMissing`].
/// 2. Validation: source is a directory, trees do not overlap, preserve
///    patterns compile, destination root is a directory (created if
///    needed). Symlinked destination directories are written through.
/// 3. Copy phase: depth-first walk over an explicit stack. Directories are
///    mirrored (existing ones reused), files are copied over whatever sits
///    at the mirrored path unless their basename is in the preserve set.
/// 4. Cleanup phase: the source root is removed recursively.
///
/// The first filesystem error aborts the run. Nothing is rolled back, so
/// the destination may be partially merged and the source left in place.
pub fn relocate_build_output(
    spec_options: &SpecRelocateOptions,
) -> Result<ReportRelocate, RelocateError> {
    let path_dir_src = spec_options.dir_source.as_path();
    let path_dir_dst = spec_options.dir_destination.as_path();

    info!("Post-processing build output...");
    info!("Source: {}", path_dir_src.display());
    info!("Target: {}", path_dir_dst.display());
    info!("Preserving: {}", spec_options.preserve_files.join(", "));

    let meta_dir_src = match fs::metadata(path_dir_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(
                "Source directory {} does not exist, skipping copy",
                path_dir_src.display()
            );
            info!("Post-processing complete!");
            return Ok(ReportRelocateBuilder::default().build(EnumRelocateOutcome::SourceMissing));
        }
        Err(e) => return Err(RelocateError::io(EnumRelocateOp::Inspect, path_dir_src, e)),
    };
    if !meta_dir_src.is_dir() {
        return Err(RelocateError::SourceNotDirectory(path_dir_src.to_path_buf()));
    }
    if is_overlap(path_dir_src, path_dir_dst) {
        return Err(RelocateError::SourceDestinationOverlap {
            source_dir: path_dir_src.to_path_buf(),
            destination_dir: path_dir_dst.to_path_buf(),
        });
    }
    let matcher_preserve = SpecPreserveMatcher::from_raw(
        &spec_options.preserve_files,
        spec_options.rule_preserve_match,
    )?;

    let mut spec_ctx = SpecRelocateContext {
        path_dir_dst: path_dir_dst.to_path_buf(),
        spec_options,
        matcher_preserve,
        builder_report: ReportRelocateBuilder::default(),
    };

    init_destination_root(&mut spec_ctx)?;
    walk_source_tree(path_dir_src, &mut spec_ctx)?;

    let outcome = if spec_options.if_dry_run {
        info!(
            "Dry run: keeping temporary directory {}",
            path_dir_src.display()
        );
        EnumRelocateOutcome::DryRun
    } else {
        if spec_options.if_cleanup_source {
            remove_source_root(path_dir_src, &mut spec_ctx.builder_report)?;
        } else {
            info!("Keeping temporary directory: {}", path_dir_src.display());
        }
        EnumRelocateOutcome::Completed
    };

    let report = spec_ctx.builder_report.build(outcome);
    info!("{report}");
    info!("Post-processing complete!");
    Ok(report)
}

fn init_destination_root(spec_ctx: &mut SpecRelocateContext<'_>) -> Result<(), RelocateError> {
    let path_dir_dst = spec_ctx.path_dir_dst.clone();
    let err_init = |message: String| RelocateError::DestinationInitFailed {
        path: path_dir_dst.clone(),
        message,
    };

    match fs::metadata(&path_dir_dst) {
        Ok(meta_dir_dst) if !meta_dir_dst.is_dir() => Err(err_init(
            "Destination root path exists and is not a directory.".to_string(),
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if spec_ctx.spec_options.if_dry_run {
                info!("Dry run: would create {}", path_dir_dst.display());
            } else {
                fs::create_dir_all(&path_dir_dst).map_err(|e| err_init(e.to_string()))?;
                debug!("Created directory {}", path_dir_dst.display());
            }
            spec_ctx.builder_report.add_dir_created();
            Ok(())
        }
        Err(e) => Err(err_init(e.to_string())),
    }
}

fn walk_source_tree(
    path_dir_src: &Path,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<(), RelocateError> {
    let mut l_stack = vec![SpecDirTask {
        path_dir_src_sub: path_dir_src.to_path_buf(),
        path_rel: PathBuf::new(),
        l_dir_ancestors: Vec::new(),
    }];

    while let Some(spec_task) = l_stack.pop() {
        let Some(l_dir_ancestors) = enter_directory(&spec_task, spec_ctx)? else {
            continue;
        };

        let l_entries = read_source_entries(&spec_task, spec_ctx)?;
        let mut l_subdirs: Vec<SpecDirTask> = Vec::new();
        for spec_entry in l_entries {
            spec_ctx.builder_report.add_scanned();
            match spec_entry.kind {
                EnumEntryKind::Directory => {
                    handle_dir_entry(&spec_entry, spec_ctx)?;
                    l_subdirs.push(SpecDirTask {
                        path_dir_src_sub: spec_entry.path_src,
                        path_rel: spec_entry.path_rel,
                        l_dir_ancestors: l_dir_ancestors.clone(),
                    });
                }
                EnumEntryKind::File | EnumEntryKind::Symlink => {
                    handle_file_entry(&spec_entry, spec_ctx)?;
                }
                EnumEntryKind::Ignored => spec_ctx.builder_report.add_skipped(),
            }
        }
        // Reverse so subdirectories pop in name order.
        l_stack.extend(l_subdirs.into_iter().rev());
    }

    Ok(())
}

/// Check a directory against its own ancestor chain when following
/// symlinks. Returns the chain for its children, or `None` when the
/// directory is one of its ancestors (symlink loop). A directory reached
/// twice through sibling links is walked both times.
fn enter_directory(
    spec_task: &SpecDirTask,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<Option<Vec<(u64, u64)>>, RelocateError> {
    if spec_ctx.spec_options.rule_symlink != EnumRelocateSymlinkStrategy::Dereference {
        return Ok(Some(Vec::new()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let path_dir = &spec_task.path_dir_src_sub;
        let stat_dir = fs::metadata(path_dir)
            .map_err(|e| RelocateError::io(EnumRelocateOp::Inspect, path_dir, e))?;
        let id_dir = (stat_dir.dev(), stat_dir.ino());
        if spec_task.l_dir_ancestors.contains(&id_dir) {
            let c_warning = format!("Symlink loop detected: {}", path_dir.display());
            warn!("{c_warning}");
            spec_ctx.builder_report.add_warning(c_warning);
            spec_ctx.builder_report.add_skipped();
            return Ok(None);
        }

        let mut l_dir_ancestors = spec_task.l_dir_ancestors.clone();
        l_dir_ancestors.push(id_dir);
        Ok(Some(l_dir_ancestors))
    }
    #[cfg(not(unix))]
    {
        Ok(Some(spec_task.l_dir_ancestors.clone()))
    }
}

fn read_source_entries(
    spec_task: &SpecDirTask,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<Vec<SpecEntry>, RelocateError> {
    let path_root = &spec_task.path_dir_src_sub;
    let iter_entries = fs::read_dir(path_root)
        .map_err(|e| RelocateError::io(EnumRelocateOp::ReadDir, path_root, e))?;

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let entry =
            entry_res.map_err(|e| RelocateError::io(EnumRelocateOp::ReadDir, path_root, e))?;
        let path_entry = entry.path();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| RelocateError::io(EnumRelocateOp::Inspect, &path_entry, e))?;

        let kind = if cfg_file_type.is_dir() {
            EnumEntryKind::Directory
        } else if cfg_file_type.is_file() {
            EnumEntryKind::File
        } else if cfg_file_type.is_symlink() {
            classify_symlink(&path_entry, spec_ctx)?
        } else {
            let c_warning = format!("Special file skipped: {}", path_entry.display());
            warn!("{c_warning}");
            spec_ctx.builder_report.add_warning(c_warning);
            EnumEntryKind::Ignored
        };

        let name = entry.file_name();
        l_entries.push(SpecEntry {
            path_rel: spec_task.path_rel.join(&name),
            path_src: path_entry,
            name,
            kind,
        });
    }

    l_entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(l_entries)
}

fn classify_symlink(
    path_link: &Path,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<EnumEntryKind, RelocateError> {
    match spec_ctx.spec_options.rule_symlink {
        EnumRelocateSymlinkStrategy::SkipSymlinks => {
            debug!("Skipping symlink {}", path_link.display());
            Ok(EnumEntryKind::Ignored)
        }
        EnumRelocateSymlinkStrategy::CopySymlinks => Ok(EnumEntryKind::Symlink),
        EnumRelocateSymlinkStrategy::Dereference => {
            // Broken links fail here, like any other unreadable source entry.
            let meta_target = fs::metadata(path_link)
                .map_err(|e| RelocateError::io(EnumRelocateOp::Inspect, path_link, e))?;
            if meta_target.is_dir() {
                Ok(EnumEntryKind::Directory)
            } else if meta_target.is_file() {
                Ok(EnumEntryKind::File)
            } else {
                let c_warning =
                    format!("Special file target skipped: {}", path_link.display());
                warn!("{c_warning}");
                spec_ctx.builder_report.add_warning(c_warning);
                Ok(EnumEntryKind::Ignored)
            }
        }
    }
}

fn handle_dir_entry(
    spec_entry: &SpecEntry,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<(), RelocateError> {
    let path_dir_dst_sub = spec_ctx.path_dir_dst.join(&spec_entry.path_rel);
    validate_destination_path_safety(&path_dir_dst_sub, &spec_ctx.path_dir_dst)?;

    if path_dir_dst_sub.is_dir() {
        return Ok(());
    }
    if spec_ctx.spec_options.if_dry_run {
        info!("Dry run: would create {}", path_dir_dst_sub.display());
    } else {
        fs::create_dir_all(&path_dir_dst_sub).map_err(|e| {
            RelocateError::io(EnumRelocateOp::CreateDir, &path_dir_dst_sub, e)
        })?;
        debug!("Created directory {}", path_dir_dst_sub.display());
    }
    spec_ctx.builder_report.add_dir_created();
    Ok(())
}

fn handle_file_entry(
    spec_entry: &SpecEntry,
    spec_ctx: &mut SpecRelocateContext<'_>,
) -> Result<(), RelocateError> {
    if spec_ctx.matcher_preserve.is_preserved(&spec_entry.name) {
        info!(
            "Preserving {} from legacy build",
            spec_entry.name.to_string_lossy()
        );
        spec_ctx
            .builder_report
            .add_preserved(spec_entry.path_rel.clone());
        return Ok(());
    }

    let path_file_dst = spec_ctx.path_dir_dst.join(&spec_entry.path_rel);
    validate_destination_path_safety(&path_file_dst, &spec_ctx.path_dir_dst)?;

    if spec_ctx.spec_options.if_dry_run {
        info!(
            "Dry run: would copy {} -> {}",
            spec_entry.path_src.display(),
            path_file_dst.display()
        );
        spec_ctx.builder_report.add_planned();
        return Ok(());
    }

    if spec_entry.kind == EnumEntryKind::Symlink {
        create_symbolic_link(&spec_entry.path_src, &path_file_dst).map_err(|e| {
            RelocateError::io(EnumRelocateOp::CopySymlink, &spec_entry.path_src, e)
        })?;
    } else {
        copy_file_with_metadata(
            &spec_entry.path_src,
            &path_file_dst,
            spec_ctx.spec_options.if_keep_metadata,
        )
        .map_err(|e| RelocateError::io(EnumRelocateOp::CopyFile, &spec_entry.path_src, e))?;
    }
    info!(
        "Copied {} -> {}",
        spec_entry.path_src.display(),
        path_file_dst.display()
    );
    spec_ctx.builder_report.add_copied();
    Ok(())
}

fn remove_source_root(
    path_dir_src: &Path,
    builder_report: &mut ReportRelocateBuilder,
) -> Result<(), RelocateError> {
    match fs::remove_dir_all(path_dir_src) {
        Ok(()) => {
            info!("Cleaned up temporary directory: {}", path_dir_src.display());
            builder_report.mark_source_removed();
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Temporary directory already gone: {}", path_dir_src.display());
            Ok(())
        }
        Err(e) => Err(RelocateError::io(
            EnumRelocateOp::RemoveSource,
            path_dir_src,
            e,
        )),
    }
}
