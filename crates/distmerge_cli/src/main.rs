use std::process;

use clap::Parser;
use distmerge_cli::logging::{LoggingConfig, init_logging};
use distmerge_cli::{Cli, run};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LoggingConfig::from_verbosity(cli.verbose, cli.log_json)) {
        eprintln!("Warning: {e:#}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}
