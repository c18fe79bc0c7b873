//! Browser capability used for login and calendar paging.

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::debug;

/// The operations the crawler needs from an interactive browser.
///
/// Navigation state (which week is displayed) lives in the browser, so an
/// implementation is driven by exactly one caller at a time.
#[async_trait]
pub trait CalendarBrowser: Send {
    async fn goto(&mut self, url: &str) -> AppResult<()>;

    async fn current_url(&mut self) -> AppResult<String>;

    /// Type `value` into the input whose `name` attribute is `field`.
    async fn fill(&mut self, field: &str, value: &str) -> AppResult<()>;

    /// Click the element whose `name` attribute is `name`.
    async fn click_named(&mut self, name: &str) -> AppResult<()>;

    /// Click the element with the given id.
    async fn click_id(&mut self, id: &str) -> AppResult<()>;

    /// Serialized DOM of the current page.
    async fn page_source(&mut self) -> AppResult<String>;

    async fn cookies(&mut self) -> AppResult<Vec<(String, String)>>;

    async fn user_agent(&mut self) -> AppResult<String>;

    /// End the browser session. Further calls are invalid.
    async fn close(&mut self) -> AppResult<()>;
}

/// [`CalendarBrowser`] backed by a WebDriver server (geckodriver,
/// chromedriver, selenium).
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    pub async fn connect(webdriver_url: &str, headless: bool) -> AppResult<Self> {
        let mut caps = serde_json::Map::new();
        if headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new"] }),
            );
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| AppError::Browser(format!("cannot reach WebDriver at {webdriver_url}: {e}")))?;

        debug!(webdriver_url, headless, "browser session started");
        Ok(Self { client })
    }
}

fn browser_err(action: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Browser(format!("{action}: {e}"))
}

#[async_trait]
impl CalendarBrowser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> AppResult<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| browser_err(&format!("navigate to {url}"), e))
    }

    async fn current_url(&mut self) -> AppResult<String> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| browser_err("read current url", e))?;
        Ok(url.to_string())
    }

    async fn fill(&mut self, field: &str, value: &str) -> AppResult<()> {
        let elem = self
            .client
            .find(Locator::Css(&format!("[name='{field}']")))
            .await
            .map_err(|e| browser_err(&format!("locate field '{field}'"), e))?;
        elem.clear()
            .await
            .map_err(|e| browser_err(&format!("clear field '{field}'"), e))?;
        elem.send_keys(value)
            .await
            .map_err(|e| browser_err(&format!("type into field '{field}'"), e))
    }

    async fn click_named(&mut self, name: &str) -> AppResult<()> {
        let elem = self
            .client
            .find(Locator::Css(&format!("[name='{name}']")))
            .await
            .map_err(|e| browser_err(&format!("locate '{name}'"), e))?;
        elem.click()
            .await
            .map_err(|e| browser_err(&format!("click '{name}'"), e))
    }

    async fn click_id(&mut self, id: &str) -> AppResult<()> {
        let elem = self
            .client
            .find(Locator::Id(id))
            .await
            .map_err(|e| browser_err(&format!("locate #{id}"), e))?;
        elem.click()
            .await
            .map_err(|e| browser_err(&format!("click #{id}"), e))
    }

    async fn page_source(&mut self) -> AppResult<String> {
        self.client
            .source()
            .await
            .map_err(|e| browser_err("read page source", e))
    }

    async fn cookies(&mut self) -> AppResult<Vec<(String, String)>> {
        let cookies = self
            .client
            .get_all_cookies()
            .await
            .map_err(|e| browser_err("read cookies", e))?;
        Ok(cookies
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect())
    }

    async fn user_agent(&mut self) -> AppResult<String> {
        let value = self
            .client
            .execute("return navigator.userAgent", vec![])
            .await
            .map_err(|e| browser_err("read user agent", e))?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Browser(format!("user agent is not a string: {value}")))
    }

    async fn close(&mut self) -> AppResult<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| browser_err("close session", e))
    }
}
