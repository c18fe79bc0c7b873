pub mod crawl;
pub mod stats;
