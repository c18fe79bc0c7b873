use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success};
use std::path::Path;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, config_path: &Path) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
    } = cmd
    {
        if *print_config {
            println!("📄 Current configuration ({}):\n", config_path.display());
            println!("{}", serde_yaml::to_string(cfg)?);
        }

        if *check {
            let problems = cfg.check();
            if !problems.is_empty() {
                for p in &problems {
                    error(p);
                }
                return Err(AppError::Config(format!(
                    "{} problem(s) in {}",
                    problems.len(),
                    config_path.display()
                )));
            }
            success("Configuration is valid");
        }
    }
    Ok(())
}
