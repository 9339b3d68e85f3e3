//! Grindstone - incremental static bundler
//!
//! Command line front end: parses arguments into publishing options and runs
//! the pipeline.

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    grindstone::logging::init_logging(cli.verbose);

    if let Err(e) = commands::publish::run(cli.to_options()) {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
