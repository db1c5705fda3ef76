//! `distmerge_io_fs` v1:
//! Post-build output relocation engine.
//!
//! Module layout:
//! - `conf`     : default layout constants
//! - `relocate` : traversal, copy and cleanup orchestration
//! - `spec`     : enums/options/errors
//! - `report`   : run-time report model
//! - `util`     : shared helper functions

pub mod conf;
pub mod relocate;
pub mod report;
pub mod spec;
mod util;

pub use conf::{
    C_DIR_DESTINATION_DEFAULT, C_DIR_SOURCE_DEFAULT, TUP_PRESERVE_FILES_DEFAULT,
    derive_default_relocate_options,
};
pub use relocate::relocate_build_output;
pub use report::{EnumRelocateOutcome, ReportRelocate, ReportRelocateBuilder};
pub use spec::{
    EnumPreserveMatchMode, EnumRelocateOp, EnumRelocateSymlinkStrategy, RelocateError,
    SpecRelocateOptions,
};
