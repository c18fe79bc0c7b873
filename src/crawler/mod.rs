//! Calendar crawling: login, backward week walk, class extraction and
//! attendee fetching.

pub mod bootstrap;
pub mod browser;
pub mod extractor;
pub mod fetcher;
pub mod http;
pub mod schema;
pub mod walker;

pub use bootstrap::{LoginTarget, authenticate};
pub use browser::{CalendarBrowser, WebDriverBrowser};
pub use extractor::SessionExtractor;
pub use fetcher::AttendeeFetcher;
pub use http::HttpClient;
pub use schema::{CompiledSchema, PageSchema};
pub use walker::{CalendarWalker, WalkerState, WeekSink};
