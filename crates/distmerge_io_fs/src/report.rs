//! Relocation report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How a relocation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRelocateOutcome {
    /// Copy phase (and cleanup, if enabled) ran to completion.
    #[default]
    Completed,
    /// Source root did not exist; nothing was touched.
    SourceMissing,
    /// Traversal ran without mutating the filesystem.
    DryRun,
}

impl fmt::Display for EnumRelocateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_outcome = match self {
            Self::Completed => "completed",
            Self::SourceMissing => "source_missing",
            Self::DryRun => "dry_run",
        };
        f.write_str(c_outcome)
    }
}

/// Aggregate counters and diagnostics for one relocation run.
#[derive(Debug, Default, Clone)]
pub struct ReportRelocate {
    pub outcome: EnumRelocateOutcome,
    /// Total scanned directory/file entries under the source root.
    pub cnt_scanned: u64,
    /// Destination directories that did not exist before the run.
    pub cnt_dirs_created: u64,
    /// Files (and symlinks) written into the destination.
    pub cnt_copied: u64,
    /// Files left untouched because their basename is in the preserve set.
    pub cnt_preserved: u64,
    /// Files a dry run would have written.
    pub cnt_planned: u64,
    /// Entries skipped by symlink policy, special file type or loop detection.
    pub cnt_skipped: u64,
    /// Whether the source root was removed in the cleanup phase.
    pub if_source_removed: bool,
    /// Relative source paths of preserved files, in traversal order.
    pub l_preserved: Vec<PathBuf>,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportRelocate {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_preserved".to_string(), self.cnt_preserved);
        dict_counts.insert("cnt_planned".to_string(), self.cnt_planned);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} outcome={} scanned={} dirs_created={} copied={} planned={} preserved={} skipped={} warnings={} source_removed={}",
            self.outcome,
            dict_counts["cnt_scanned"],
            dict_counts["cnt_dirs_created"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_planned"],
            dict_counts["cnt_preserved"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_warnings"],
            self.if_source_removed
        )
    }
}

impl fmt::Display for ReportRelocate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[RELOCATE]"))
    }
}

/// Mutable accumulator for relocation statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportRelocateBuilder {
    cnt_scanned: u64,
    cnt_dirs_created: u64,
    cnt_copied: u64,
    cnt_preserved: u64,
    cnt_planned: u64,
    cnt_skipped: u64,
    if_source_removed: bool,
    l_preserved: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl ReportRelocateBuilder {
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    pub fn add_planned(&mut self) {
        self.cnt_planned += 1;
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Record one preserved file by its path relative to the source root.
    pub fn add_preserved(&mut self, path_rel: PathBuf) {
        self.cnt_preserved += 1;
        self.l_preserved.push(path_rel);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn mark_source_removed(&mut self) {
        self.if_source_removed = true;
    }

    /// Finalize builder into immutable report.
    pub fn build(self, outcome: EnumRelocateOutcome) -> ReportRelocate {
        ReportRelocate {
            outcome,
            cnt_scanned: self.cnt_scanned,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_copied: self.cnt_copied,
            cnt_preserved: self.cnt_preserved,
            cnt_planned: self.cnt_planned,
            cnt_skipped: self.cnt_skipped,
            if_source_removed: self.if_source_removed,
            l_preserved: self.l_preserved,
            warnings: self.warnings,
        }
    }
}
