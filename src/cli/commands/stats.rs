use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::stats::{LogStats, StatsLogic};
use crate::errors::AppResult;
use crate::store::MergeStore;

/// Handle the `stats` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats { top } = cmd {
        let log = MergeStore::new(cfg.log_path()).load()?;
        StatsLogic::print(&LogStats::from_log(&log, *top, cfg.epoch_default));
    }
    Ok(())
}
