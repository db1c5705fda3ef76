use std::path::PathBuf;

use clap::Parser;
use distmerge_cli::Cli;
use distmerge_io_fs::{EnumPreserveMatchMode, SpecRelocateOptions};
use serial_test::serial;

const L_ENV_KEYS: [&str; 3] = [
    "DISTMERGE_SOURCE",
    "DISTMERGE_DESTINATION",
    "DISTMERGE_PRESERVE",
];

/// Run `f` with the given `DISTMERGE_*` variables set and every other one
/// cleared, restoring a clean environment afterwards.
fn with_env<T>(l_vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    // SAFETY: every test in this file is `#[serial]`, so no other thread
    // touches the environment meanwhile.
    unsafe {
        for c_key in L_ENV_KEYS {
            std::env::remove_var(c_key);
        }
        for (c_key, c_value) in l_vars {
            std::env::set_var(c_key, c_value);
        }
    }
    let out = f();
    unsafe {
        for c_key in L_ENV_KEYS {
            std::env::remove_var(c_key);
        }
    }
    out
}

#[test]
#[serial]
fn env_overrides_source_and_destination() {
    let spec_options = with_env(
        &[
            ("DISTMERGE_SOURCE", "build/tmp"),
            ("DISTMERGE_DESTINATION", "public/web"),
        ],
        || {
            Cli::try_parse_from(["distmerge"])
                .expect("parse")
                .to_relocate_options()
        },
    );

    assert_eq!(spec_options.dir_source, PathBuf::from("build/tmp"));
    assert_eq!(spec_options.dir_destination, PathBuf::from("public/web"));
    assert_eq!(
        spec_options.preserve_files,
        SpecRelocateOptions::default().preserve_files
    );
}

#[test]
#[serial]
fn env_preserve_list_splits_on_commas() {
    let spec_options = with_env(
        &[("DISTMERGE_PRESERVE", "Online.js, Legacy.js,Worker.js")],
        || {
            Cli::try_parse_from(["distmerge"])
                .expect("parse")
                .to_relocate_options()
        },
    );

    assert_eq!(
        spec_options.preserve_files,
        vec![
            "Online.js".to_string(),
            "Legacy.js".to_string(),
            "Worker.js".to_string()
        ]
    );
}

#[test]
#[serial]
fn flags_take_precedence_over_env() {
    let spec_options = with_env(
        &[
            ("DISTMERGE_SOURCE", "from-env"),
            ("DISTMERGE_PRESERVE", "Online.js"),
        ],
        || {
            Cli::try_parse_from(["distmerge", "--source", "from-flag", "--preserve", "a.js"])
                .expect("parse")
                .to_relocate_options()
        },
    );

    assert_eq!(spec_options.dir_source, PathBuf::from("from-flag"));
    assert_eq!(spec_options.preserve_files, vec!["a.js".to_string()]);
}

#[test]
#[serial]
fn env_preserve_conflicts_with_no_preserve() {
    let res = with_env(&[("DISTMERGE_PRESERVE", "Online.js")], || {
        Cli::try_parse_from(["distmerge", "--no-preserve"])
    });

    let err = res.expect_err("conflict");
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
#[serial]
fn regex_preserve_mode_from_flags() {
    let spec_options = with_env(&[], || {
        Cli::try_parse_from([
            "distmerge",
            "--preserve",
            r"^Thread\w+\.js$",
            "--preserve-mode",
            "regex",
        ])
        .expect("parse")
        .to_relocate_options()
    });

    assert_eq!(spec_options.rule_preserve_match, EnumPreserveMatchMode::Regex);
    assert_eq!(
        spec_options.preserve_files,
        vec![r"^Thread\w+\.js$".to_string()]
    );
}
