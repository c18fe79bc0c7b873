use super::browser::CalendarBrowser;
use super::extractor::SessionExtractor;
use super::schema::CompiledSchema;
use crate::errors::{AppError, AppResult};
use crate::models::{SessionDescriptor, WeekWindow};
use crate::utils::date::week_start;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use scraper::Html;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

/// Receives the sessions of each visited week, before the walker pages on.
#[async_trait]
pub trait WeekSink: Send {
    async fn accept(&mut self, week: &WeekWindow, sessions: Vec<SessionDescriptor>)
    -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Uninitialized,
    /// The calendar opened on this week and has been paged back once.
    Positioned(WeekWindow),
    /// This week was extracted and the calendar paged back again.
    Stepping(WeekWindow),
    Done,
}

/// Monday of the last week a crawl has to visit: the week after the one
/// holding the high-water mark.
pub fn stop_week_start(high_water: NaiveDate) -> NaiveDate {
    week_start(high_water) + Days::new(7)
}

/// True when the week holding `today` is at most one week past the
/// high-water mark, so a crawl would visit nothing.
pub fn is_current(high_water: NaiveDate, today: NaiveDate) -> bool {
    week_start(today) <= stop_week_start(high_water)
}

/// Pages the calendar backward one week at a time, from the week before
/// the displayed one down to the week after the high-water mark.
///
/// The current week is never extracted. Weeks are compared by their
/// Monday so the walk crosses year boundaries.
pub struct CalendarWalker<'s> {
    extractor: SessionExtractor<'s>,
    previous_button: &'s str,
    stop_at: NaiveDate,
    state: WalkerState,
    deadline: Option<(Instant, Duration)>,
    visited: Vec<WeekWindow>,
}

impl<'s> CalendarWalker<'s> {
    pub fn new(schema: &'s CompiledSchema, high_water: NaiveDate) -> Self {
        Self {
            extractor: SessionExtractor::new(schema),
            previous_button: &schema.previous_week_button,
            stop_at: stop_week_start(high_water),
            state: WalkerState::Uninitialized,
            deadline: None,
            visited: Vec::new(),
        }
    }

    /// Fail the walk once `limit` has elapsed, counted from now.
    pub fn with_deadline(mut self, limit: Option<Duration>) -> Self {
        self.deadline = limit.map(|d| (Instant::now() + d, d));
        self
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    /// Weeks extracted so far, newest first.
    pub fn visited(&self) -> &[WeekWindow] {
        &self.visited
    }

    /// Run the state machine to completion.
    pub async fn walk<B, S>(&mut self, browser: &mut B, sink: &mut S) -> AppResult<()>
    where
        B: CalendarBrowser + ?Sized,
        S: WeekSink + ?Sized,
    {
        while self.state != WalkerState::Done {
            self.step(browser, sink).await?;
        }
        Ok(())
    }

    /// Advance by one transition.
    pub async fn step<B, S>(&mut self, browser: &mut B, sink: &mut S) -> AppResult<()>
    where
        B: CalendarBrowser + ?Sized,
        S: WeekSink + ?Sized,
    {
        self.state = match self.state {
            WalkerState::Uninitialized => self.position(browser).await?,
            WalkerState::Positioned(week) | WalkerState::Stepping(week) => {
                self.extract_previous(week, browser, sink).await?
            }
            WalkerState::Done => WalkerState::Done,
        };
        Ok(())
    }

    async fn position<B>(&mut self, browser: &mut B) -> AppResult<WalkerState>
    where
        B: CalendarBrowser + ?Sized,
    {
        let source = self.within_deadline(browser.page_source()).await?;
        let current = self.extractor.week_window(&Html::parse_document(&source))?;
        info!(week = current.week_number, from = %current.from_date, "calendar opened");

        if current.start() <= self.stop_at {
            return Ok(WalkerState::Done);
        }

        self.within_deadline(browser.click_id(self.previous_button)).await?;
        Ok(WalkerState::Positioned(current))
    }

    async fn extract_previous<B, S>(
        &mut self,
        shown_after: WeekWindow,
        browser: &mut B,
        sink: &mut S,
    ) -> AppResult<WalkerState>
    where
        B: CalendarBrowser + ?Sized,
        S: WeekSink + ?Sized,
    {
        self.check_deadline()?;

        let week = shown_after.previous();
        let source = self.within_deadline(browser.page_source()).await?;
        let sessions = self.read_sessions(&source, week.from_date)?;
        debug!(week = week.week_number, sessions = sessions.len(), "week extracted");

        self.within_deadline(sink.accept(&week, sessions)).await?;
        self.within_deadline(browser.click_id(self.previous_button)).await?;
        self.visited.push(week);

        if week.start() <= self.stop_at {
            Ok(WalkerState::Done)
        } else {
            Ok(WalkerState::Stepping(week))
        }
    }

    fn read_sessions(&self, source: &str, from: NaiveDate) -> AppResult<Vec<SessionDescriptor>> {
        let page = Html::parse_document(source);
        self.extractor.sessions(&page, from)?.collect()
    }

    /// Await `fut`, failing with `DeadlineExceeded` if the crawl deadline
    /// passes first. Without a deadline this is a plain await.
    pub async fn within_deadline<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match self.deadline {
            Some((at, limit)) => timeout_at(at, fut)
                .await
                .map_err(|_| AppError::DeadlineExceeded(limit.as_secs()))?,
            None => fut.await,
        }
    }

    fn check_deadline(&self) -> AppResult<()> {
        match self.deadline {
            Some((at, limit)) if Instant::now() >= at => {
                Err(AppError::DeadlineExceeded(limit.as_secs()))
            }
            _ => Ok(()),
        }
    }
}
