use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::crawl::CrawlLogic;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use crate::utils::date::{parse_date, today};

/// Handle the `crawl` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Crawl { today: today_arg } = cmd {
        let today = match today_arg {
            Some(s) => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?,
            None => today(),
        };

        let runtime = tokio::runtime::Runtime::new()?;
        let summary = runtime.block_on(CrawlLogic::run(cfg, today))?;

        if summary.up_to_date {
            info(format!(
                "Workout log is up to date (latest class {}, week {})",
                summary.high_water.date, summary.high_water.week
            ));
            return Ok(());
        }

        success(format!(
            "Crawled {} week(s): {} attendance(s) found, {} added, {} already known",
            summary.weeks.len(),
            summary.fetched,
            summary.report.added,
            summary.report.skipped
        ));
    }
    Ok(())
}
