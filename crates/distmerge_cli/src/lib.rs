//! `distmerge` command surface: argument model, logging setup and the run
//! entry point shared by the binary and its integration tests.

pub mod args;
pub mod logging;

use anyhow::{Context, Result};
use distmerge_io_fs::{ReportRelocate, relocate_build_output};

pub use args::Cli;

/// Resolve options from `cli` and run one relocation.
pub fn run(cli: &Cli) -> Result<ReportRelocate> {
    let spec_options = cli.to_relocate_options();
    relocate_build_output(&spec_options).with_context(|| {
        format!(
            "relocating {} into {} failed",
            spec_options.dir_source.display(),
            spec_options.dir_destination.display()
        )
    })
}
