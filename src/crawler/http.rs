use crate::errors::{AppError, AppResult};
use crate::models::AuthenticatedSession;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client with per-request timeout and bounded retry.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// GET `url`, retrying connect/timeout failures and 5xx responses.
    ///
    /// The last response is returned as-is once attempts run out, so the
    /// caller sees the final status.
    pub async fn get(&self, url: &str) -> AppResult<Response> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            debug!(attempt, url, "sending HTTP request");

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, url, %status, "received HTTP response");

                    if status.is_server_error() && attempt < attempts {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, url, error = %err, "HTTP request failed");

                    if attempt < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }

        Err(AppError::Other(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            user_agent: None,
            default_headers: HeaderMap::new(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Carry over the cookies and user agent of a logged-in browser.
    pub fn session(mut self, session: &AuthenticatedSession) -> AppResult<Self> {
        if !session.user_agent.is_empty() {
            self.user_agent = Some(session.user_agent.clone());
        }
        if let Some(cookie) = session.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| AppError::Other(format!("invalid cookie header: {e}")))?;
            self.default_headers.insert(COOKIE, value);
        }
        Ok(self)
    }

    pub fn build(self) -> AppResult<HttpClient> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers);

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(HttpClient {
            client: builder.build()?,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
