//! openapi-from-comments - command-line front end.
//!
//! Scans a source tree for apiDoc-style annotation comments and prints (or
//! writes) the resulting OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-comments [OPTIONS] [INPUT]
//! ```
//!
//! # Examples
//!
//! Generate JSON documentation:
//! ```bash
//! openapi-from-comments ./src -o openapi.json
//! ```
//!
//! Generate YAML, parsing only Ruby files:
//! ```bash
//! openapi-from-comments ./app -f yaml --file-filters '.*\.rb$'
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_comments::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    info!("openapi-from-comments starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
