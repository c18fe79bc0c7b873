use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface definition for wodlogger
#[derive(Parser)]
#[command(
    name = "wodlogger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Harvest class attendance from the booking calendar into a per-member JSON log",
    long_about = None
)]
pub struct Cli {
    /// Override the workout log path
    #[arg(global = true, long = "log", value_name = "FILE")]
    pub log: Option<String>,

    /// Read configuration from this file instead of the default one
    #[arg(global = true, long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        #[arg(long, help = "Overwrite an existing configuration file")]
        force: bool,
    },

    /// Show or validate the configuration
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Validate URLs, limits and the page schema")]
        check: bool,
    },

    /// Fetch the weeks missing from the log and merge them in
    Crawl {
        /// Pretend today is this date (YYYY-MM-DD) when deciding whether to crawl
        #[arg(long, value_name = "DATE")]
        today: Option<String>,
    },

    /// Summarize the stored log
    Stats {
        #[arg(long, default_value_t = 10, help = "How many top members to list")]
        top: usize,
    },
}
