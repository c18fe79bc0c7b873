//! wodlogger library root.
//! Exposes the CLI parser, the high-level run() function, and the crawler,
//! store and model modules it is built from.

pub mod cli;
pub mod config;
pub mod core;
pub mod crawler;
pub mod errors;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use std::path::Path;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config, config_path: &Path) -> AppResult<()> {
    match &cli.command {
        Commands::Init { .. } => cli::commands::init::handle(&cli.command, config_path),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg, config_path),
        Commands::Crawl { .. } => cli::commands::crawl::handle(&cli.command, cfg),
        Commands::Stats { .. } => cli::commands::stats::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli
        .config
        .as_deref()
        .map(utils::path::expand_tilde)
        .unwrap_or_else(Config::config_file);

    // `init` must work even when the existing file does not parse
    let mut cfg = match &cli.command {
        Commands::Init { .. } => Config::default(),
        _ => Config::load_from(&config_path)?,
    };

    if let Some(custom_log) = &cli.log {
        cfg.log_file = custom_log.clone();
    }

    dispatch(&cli, &cfg, &config_path)
}

