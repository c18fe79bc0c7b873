use super::http::HttpClient;
use crate::config::TEAM_ID_PLACEHOLDER;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::SIGNUP_TIME_FORMAT;
use crate::models::{AttendanceRecord, SessionDescriptor};
use crate::utils::text::decode_html_text;
use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// One attendee row of the team-info page: rank, name, signup time, then
/// any trailing cells (the waitlist marker, when present).
static ATTENDEE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<tr[^>]*>\s*<td[^>]*>\s*(?P<rank>\d+)\s*</td>\s*<td[^>]*>(?P<name>.*?)</td>\s*<td[^>]*>\s*(?P<signup>\d{2}-\d{2}-\d{4}\s\d{2}:\d{2}:\d{2})\s*</td>(?P<rest>[\s\S]*?)</tr>",
    )
    .expect("attendee row pattern is valid")
});

/// Fetches attendee lists over plain HTTP using the captured session.
pub struct AttendeeFetcher {
    http: HttpClient,
    url_template: String,
    concurrency: usize,
}

impl AttendeeFetcher {
    /// `url_template` must contain `{id}`, replaced with the session id.
    pub fn new(http: HttpClient, url_template: impl Into<String>) -> Self {
        Self {
            http,
            url_template: url_template.into(),
            concurrency: 1,
        }
    }

    /// Allow up to `n` team-info requests in flight at once.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Records for every session, in session order. A session that cannot
    /// be fetched or parsed contributes nothing.
    pub async fn fetch_all(&self, sessions: Vec<SessionDescriptor>) -> Vec<AttendanceRecord> {
        stream::iter(sessions)
            .map(|session| async move { self.fetch(&session).await })
            .buffered(self.concurrency)
            .flat_map(stream::iter)
            .collect()
            .await
    }

    /// Records for one session; failures are logged and yield none.
    pub async fn fetch(&self, session: &SessionDescriptor) -> Vec<AttendanceRecord> {
        match self.try_fetch(session).await {
            Ok(records) => {
                debug!(
                    session = %session.external_id,
                    class = %session.class_type,
                    attendees = records.len(),
                    "fetched attendees"
                );
                records
            }
            Err(e) => {
                warn!(
                    session = %session.external_id,
                    class = %session.class_type,
                    event_time = %session.event_time,
                    error = %e,
                    "skipping session"
                );
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, session: &SessionDescriptor) -> AppResult<Vec<AttendanceRecord>> {
        let url = self
            .url_template
            .replace(TEAM_ID_PLACEHOLDER, &session.external_id);
        let response = self.http.get(&url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Extraction(format!("{url} answered {status}")));
        }

        let bytes = response.bytes().await?;
        let body = std::str::from_utf8(&bytes)
            .map_err(|e| AppError::Extraction(format!("{url} body is not UTF-8: {e}")))?;
        if body.trim().is_empty() {
            return Err(AppError::Extraction(format!("{url} returned an empty body")));
        }

        Ok(parse_attendees(body, session))
    }
}

/// Extract confirmed attendees from a team-info page.
///
/// Rows with a non-empty waitlist cell are dropped, as are rows with rank
/// 0, an empty name or an impossible signup time.
pub fn parse_attendees(body: &str, session: &SessionDescriptor) -> Vec<AttendanceRecord> {
    ATTENDEE_ROW
        .captures_iter(body)
        .filter_map(|caps| {
            let rank_text = &caps["rank"];
            let signup = &caps["signup"];
            let name = decode_html_text(&caps["name"]);

            if let Some(marker) = waitlist_marker(&caps["rest"]) {
                debug!(session = %session.external_id, %name, %marker, "waitlisted, skipped");
                return None;
            }

            let rank = match checked_rank(rank_text, &name, signup) {
                Ok(rank) => rank,
                Err(reason) => {
                    warn!(
                        session = %session.external_id,
                        rank = rank_text,
                        %name,
                        signup,
                        reason,
                        "attendee row rejected"
                    );
                    return None;
                }
            };
            Some(AttendanceRecord::new(
                name,
                rank,
                signup,
                session.class_type.clone(),
                session.event_time,
            ))
        })
        .collect()
}

/// Rank of a well-formed row, or which field is wrong.
fn checked_rank(rank: &str, name: &str, signup: &str) -> Result<u32, &'static str> {
    let rank = rank.parse::<u32>().ok().filter(|r| *r > 0).ok_or("rank")?;
    if name.is_empty() {
        return Err("name");
    }
    NaiveDateTime::parse_from_str(signup, SIGNUP_TIME_FORMAT).map_err(|_| "signup time")?;
    Ok(rank)
}

/// Visible text of the cells after the signup time, if any.
fn waitlist_marker(rest: &str) -> Option<String> {
    let text = decode_html_text(rest);
    (!text.is_empty()).then_some(text)
}
