//! Command-line model. Every flag is optional; with none given the command
//! reproduces the fixed post-build layout from [`distmerge_io_fs::conf`].

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use distmerge_io_fs::{
    C_DIR_DESTINATION_DEFAULT, C_DIR_SOURCE_DEFAULT, EnumPreserveMatchMode,
    EnumRelocateSymlinkStrategy, SpecRelocateOptions, derive_default_relocate_options,
};

#[derive(Debug, Parser)]
#[command(
    name = "distmerge",
    version,
    about = "Merge a temporary build output directory into the distribution directory"
)]
pub struct Cli {
    /// Temporary build output directory (removed afterwards).
    #[arg(long, env = "DISTMERGE_SOURCE", default_value = C_DIR_SOURCE_DEFAULT)]
    pub source: PathBuf,

    /// Distribution directory to merge into.
    #[arg(long, env = "DISTMERGE_DESTINATION", default_value = C_DIR_DESTINATION_DEFAULT)]
    pub destination: PathBuf,

    /// File basename never overwritten in the destination. Repeatable;
    /// replaces the built-in list.
    #[arg(
        long = "preserve",
        env = "DISTMERGE_PRESERVE",
        value_delimiter = ',',
        conflicts_with = "no_preserve"
    )]
    pub preserve: Option<Vec<String>>,

    /// Copy everything, including the built-in preserved files.
    #[arg(long)]
    pub no_preserve: bool,

    /// How `--preserve` entries are matched against basenames.
    #[arg(long, value_enum, default_value_t = PreserveModeArg::Exact)]
    pub preserve_mode: PreserveModeArg,

    /// Symlink handling in the source tree.
    #[arg(long, value_enum, default_value_t = SymlinkArg::Dereference)]
    pub symlinks: SymlinkArg,

    /// Also copy permission bits, timestamps and extended attributes.
    #[arg(long)]
    pub keep_metadata: bool,

    /// Leave the source directory in place after copying.
    #[arg(long)]
    pub keep_source: bool,

    /// Log what would happen without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PreserveModeArg {
    Exact,
    Glob,
    Regex,
}

impl From<PreserveModeArg> for EnumPreserveMatchMode {
    fn from(value: PreserveModeArg) -> Self {
        match value {
            PreserveModeArg::Exact => Self::Exact,
            PreserveModeArg::Glob => Self::Glob,
            PreserveModeArg::Regex => Self::Regex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymlinkArg {
    Dereference,
    Copy,
    Skip,
}

impl From<SymlinkArg> for EnumRelocateSymlinkStrategy {
    fn from(value: SymlinkArg) -> Self {
        match value {
            SymlinkArg::Dereference => Self::Dereference,
            SymlinkArg::Copy => Self::CopySymlinks,
            SymlinkArg::Skip => Self::SkipSymlinks,
        }
    }
}

impl Cli {
    /// Layer the parsed flags over the default relocation layout.
    pub fn to_relocate_options(&self) -> SpecRelocateOptions {
        let spec_defaults = derive_default_relocate_options();
        let preserve_files = if self.no_preserve {
            Vec::new()
        } else {
            match &self.preserve {
                Some(l_names) => l_names
                    .iter()
                    .map(|c_name| c_name.trim().to_string())
                    .filter(|c_name| !c_name.is_empty())
                    .collect(),
                None => spec_defaults.preserve_files.clone(),
            }
        };

        SpecRelocateOptions {
            dir_source: self.source.clone(),
            dir_destination: self.destination.clone(),
            preserve_files,
            rule_preserve_match: self.preserve_mode.into(),
            rule_symlink: self.symlinks.into(),
            if_keep_metadata: self.keep_metadata,
            if_cleanup_source: !self.keep_source,
            if_dry_run: self.dry_run,
        }
    }
}
