//! Default relocation layout of the post-build step.

use crate::spec::SpecRelocateOptions;

/// Directory the secondary build tool writes into.
pub const C_DIR_SOURCE_DEFAULT: &str = ".vite-build-tmp";
/// Distribution directory served downstream.
pub const C_DIR_DESTINATION_DEFAULT: &str = "dist/Web";
/// Legacy-built files that the secondary build must never overwrite.
pub const TUP_PRESERVE_FILES_DEFAULT: [&str; 2] = ["Online.js", "ThreadEventHandler.js"];

/// Build the default [`SpecRelocateOptions`] from the constants above.
pub fn derive_default_relocate_options() -> SpecRelocateOptions {
    SpecRelocateOptions::default()
}
