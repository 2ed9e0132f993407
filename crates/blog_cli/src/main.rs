//! CLI smoke entry point.
//!
//! Usage: `blog_cli [config.json]`. Opens the configured store, applies
//! migrations and prints a short status report.

use blog_core::db::migrations::current_user_version;
use blog_core::{core_version, init_logging, open_store, ping, AppConfig};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("blog_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if !config.logger.dir.trim().is_empty() {
        init_logging(&config.logger)?;
    }

    let conn = open_store(&config.database)?;
    let schema_version = current_user_version(&conn)?;
    info!("event=cli_probe module=cli status=ok schema_version={schema_version}");

    println!("blog_core ping={}", ping());
    println!("blog_core version={}", core_version());
    println!("blog_core store={}", config.database.source);
    println!("blog_core schema_version={schema_version}");
    Ok(())
}
