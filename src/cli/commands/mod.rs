pub mod config;
pub mod crawl;
pub mod init;
pub mod stats;
