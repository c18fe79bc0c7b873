use crate::crawler::schema::PageSchema;
use crate::errors::{AppError, AppResult};
use crate::store::MergePolicy;
use crate::utils::path::expand_tilde;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the session id in `team_info_url`.
pub const TEAM_ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_activity_url")]
    pub activity_url: String,
    #[serde(default = "default_team_info_url")]
    pub team_info_url: String,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_crawl_deadline")]
    pub crawl_deadline_secs: u64,
    #[serde(default)]
    pub merge_policy: MergePolicy,
    #[serde(default = "default_epoch")]
    pub epoch_default: NaiveDate,
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: usize,
    #[serde(default)]
    pub schema: PageSchema,
}

const SITE: &str = "https://fitness.flexybox.com/flrmovement";

fn default_log_file() -> String {
    Config::config_dir()
        .join("workout_log.json")
        .to_string_lossy()
        .to_string()
}
fn default_login_url() -> String {
    format!("{SITE}/Account/LogOn")
}
fn default_activity_url() -> String {
    format!("{SITE}/TeamActivity/AllActivities?lang=da")
}
fn default_team_info_url() -> String {
    format!("{SITE}/Public/TeamInfo/?teamid={TEAM_ID_PLACEHOLDER}")
}
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}
fn default_true() -> bool {
    true
}
fn default_username_env() -> String {
    "FLEXYBOX_USERNAME".to_string()
}
fn default_password_env() -> String {
    "FLEXYBOX_PASSWORD".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_attempts() -> usize {
    3
}
fn default_backoff_ms() -> u64 {
    250
}
fn default_fetch_concurrency() -> usize {
    1
}
fn default_crawl_deadline() -> u64 {
    1800
}
fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 1).unwrap_or_default()
}
fn default_persist_attempts() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            login_url: default_login_url(),
            activity_url: default_activity_url(),
            team_info_url: default_team_info_url(),
            webdriver_url: default_webdriver_url(),
            headless: true,
            username_env: default_username_env(),
            password_env: default_password_env(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            fetch_concurrency: default_fetch_concurrency(),
            crawl_deadline_secs: default_crawl_deadline(),
            merge_policy: MergePolicy::default(),
            epoch_default: default_epoch(),
            persist_attempts: default_persist_attempts(),
            schema: PageSchema::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wodlogger")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("wodlogger.conf")
    }

    /// Load `path`, or defaults if it does not exist
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Resolved path of the persisted workout log.
    pub fn log_path(&self) -> PathBuf {
        expand_tilde(&self.log_file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Overall crawl deadline; `None` when disabled.
    pub fn crawl_deadline(&self) -> Option<Duration> {
        (self.crawl_deadline_secs > 0).then(|| Duration::from_secs(self.crawl_deadline_secs))
    }

    /// Check the values a crawl depends on. Returns every problem found.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.team_info_url.contains(TEAM_ID_PLACEHOLDER) {
            problems.push(format!(
                "team_info_url must contain the {TEAM_ID_PLACEHOLDER} placeholder"
            ));
        }
        for (field, url) in [
            ("login_url", &self.login_url),
            ("activity_url", &self.activity_url),
            ("webdriver_url", &self.webdriver_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                problems.push(format!("{field} is not an http(s) URL: {url}"));
            }
        }
        if self.max_attempts == 0 {
            problems.push("max_attempts must be at least 1".to_string());
        }
        if self.persist_attempts == 0 {
            problems.push("persist_attempts must be at least 1".to_string());
        }
        if self.fetch_concurrency == 0 {
            problems.push("fetch_concurrency must be at least 1".to_string());
        }
        if let Err(e) = self.schema.compile() {
            problems.push(e.to_string());
        }
        problems
    }
}
