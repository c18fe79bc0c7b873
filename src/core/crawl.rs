use crate::config::Config;
use crate::crawler::{
    AttendeeFetcher, CalendarBrowser, CalendarWalker, CompiledSchema, HttpClient, LoginTarget,
    WebDriverBrowser, WeekSink, authenticate,
};
use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceRecord, Credentials, SessionDescriptor, WeekWindow};
use crate::store::{HighWaterMark, MergeReport, MergeStore, high_water_mark, merge};
use crate::ui::messages;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::time::timeout;
use tracing::{info, warn};

/// What one `crawl` run did.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub high_water: HighWaterMark,
    /// Nothing to do: the log already covers last week.
    pub up_to_date: bool,
    pub weeks: Vec<WeekWindow>,
    pub fetched: usize,
    pub report: MergeReport,
}

/// Weeks visited and attendees found by a walk.
#[derive(Debug, Default)]
pub struct CrawlOutput {
    pub weeks: Vec<WeekWindow>,
    pub records: Vec<AttendanceRecord>,
}

/// High-level logic for the `crawl` command.
pub struct CrawlLogic;

impl CrawlLogic {
    /// Load the log, crawl the weeks it is missing, merge and save.
    pub async fn run(cfg: &Config, today: NaiveDate) -> AppResult<CrawlSummary> {
        let schema = cfg.schema.compile()?;
        let store = MergeStore::new(cfg.log_path()).with_attempts(cfg.persist_attempts);
        let mut log = store.load()?;
        let high_water = high_water_mark(&log, cfg.epoch_default);
        info!(
            path = %store.path().display(),
            records = log.record_count(),
            high_water_week = high_water.week,
            "workout log loaded"
        );

        if crate::crawler::walker::is_current(high_water.date, today) {
            info!(high_water = %high_water.date, %today, "log is current, skipping crawl");
            return Ok(CrawlSummary {
                high_water,
                up_to_date: true,
                weeks: Vec::new(),
                fetched: 0,
                report: MergeReport::default(),
            });
        }

        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        let credentials = Credentials::from_env(&cfg.username_env, &cfg.password_env)?;

        let mut browser = timeout(
            cfg.request_timeout(),
            WebDriverBrowser::connect(&cfg.webdriver_url, cfg.headless),
        )
        .await
        .map_err(|_| {
            AppError::Browser(format!("no answer from WebDriver at {}", cfg.webdriver_url))
        })??;
        let outcome = Self::crawl(&mut browser, cfg, &schema, &credentials, high_water.date).await;
        match timeout(cfg.request_timeout(), browser.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "browser session did not close cleanly"),
            Err(_) => warn!("browser session did not close in time"),
        }
        let output = outcome?;

        let fetched = output.records.len();
        let report = merge(&mut log, output.records, cfg.merge_policy);
        store.persist_in_background(log).await?;

        Ok(CrawlSummary {
            high_water,
            up_to_date: false,
            weeks: output.weeks,
            fetched,
            report,
        })
    }

    /// Log in, walk back to the week after `high_water` and fetch every
    /// session's attendees. The caller owns and closes the browser.
    pub async fn crawl<B>(
        browser: &mut B,
        cfg: &Config,
        schema: &CompiledSchema,
        credentials: &Credentials,
        high_water: NaiveDate,
    ) -> AppResult<CrawlOutput>
    where
        B: CalendarBrowser + ?Sized,
    {
        let mut walker = CalendarWalker::new(schema, high_water).with_deadline(cfg.crawl_deadline());

        let target = LoginTarget {
            login_url: &cfg.login_url,
            activity_url: &cfg.activity_url,
            schema: &cfg.schema,
        };
        let session = walker
            .within_deadline(authenticate(browser, &target, credentials))
            .await?;

        let http = HttpClient::builder()
            .timeout(cfg.request_timeout())
            .max_attempts(cfg.max_attempts)
            .base_backoff(cfg.backoff())
            .session(&session)?
            .build()?;
        let mut sink = FetchingSink {
            fetcher: AttendeeFetcher::new(http, cfg.team_info_url.clone())
                .with_concurrency(cfg.fetch_concurrency),
            records: Vec::new(),
        };

        info!(high_water = %high_water, "walking calendar back");
        let walked = walker.walk(browser, &mut sink).await;
        if !walker.visited().is_empty() {
            messages::end_progress();
        }
        walked?;

        info!(
            weeks = walker.visited().len(),
            attendees = sink.records.len(),
            "crawl finished"
        );
        Ok(CrawlOutput {
            weeks: walker.visited().to_vec(),
            records: sink.records,
        })
    }
}

struct FetchingSink {
    fetcher: AttendeeFetcher,
    records: Vec<AttendanceRecord>,
}

#[async_trait]
impl WeekSink for FetchingSink {
    async fn accept(
        &mut self,
        week: &WeekWindow,
        sessions: Vec<SessionDescriptor>,
    ) -> AppResult<()> {
        messages::week_progress(week.week_number);
        let found = self.fetcher.fetch_all(sessions).await;
        info!(week = week.week_number, attendees = found.len(), "week crawled");
        self.records.extend(found);
        Ok(())
    }
}
