//! routes-from-source - generate routes, validation wiring and API docs from controller directives.
//!
//! # Usage
//!
//! ```bash
//! routes-from-source [OPTIONS] [PROJECT_PATH]
//! ```
//!
//! # Examples
//!
//! Generate route modules and a JSON API document:
//! ```bash
//! routes-from-source ./shop --routes --docs -f json -o docs/swagger.json
//! ```
//!
//! Generate models for every table of a database from a catalog snapshot:
//! ```bash
//! routes-from-source ./shop --models --database shop --schema-snapshot catalog.yaml
//! ```
//!
//! Scaffold a controller:
//! ```bash
//! routes-from-source ./shop --controller --table users -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use routes_from_source::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("routes-from-source starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
