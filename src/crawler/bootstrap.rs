use super::browser::CalendarBrowser;
use super::schema::PageSchema;
use crate::errors::{AppError, AppResult};
use crate::models::{AuthenticatedSession, Credentials};
use reqwest::Url;
use tracing::{debug, info};

/// Where to log in and where the calendar lives.
#[derive(Debug, Clone)]
pub struct LoginTarget<'a> {
    pub login_url: &'a str,
    pub activity_url: &'a str,
    pub schema: &'a PageSchema,
}

/// Log in through the browser and capture the session for plain HTTP use.
///
/// On success the browser is left on the activity calendar. A missing form
/// field, a failed submit, or being sent back to the login page is an
/// authentication error; it is never retried.
pub async fn authenticate<B: CalendarBrowser + ?Sized>(
    browser: &mut B,
    target: &LoginTarget<'_>,
    credentials: &Credentials,
) -> AppResult<AuthenticatedSession> {
    let schema = target.schema;
    info!(username = %credentials.username, "logging in");

    browser.goto(target.login_url).await?;
    browser
        .fill(&schema.login_username_field, &credentials.username)
        .await
        .map_err(login_step)?;
    browser
        .fill(&schema.login_password_field, credentials.password())
        .await
        .map_err(login_step)?;
    browser
        .click_named(&schema.login_submit)
        .await
        .map_err(login_step)?;

    browser.goto(target.activity_url).await?;
    let landed = browser.current_url().await?;
    if is_login_page(&landed, target.login_url) {
        return Err(AppError::Authentication(
            "credentials were not accepted (redirected back to the login page)".into(),
        ));
    }

    let session = AuthenticatedSession {
        cookies: browser.cookies().await?,
        user_agent: browser.user_agent().await?,
    };
    debug!(?session, "captured authenticated session");
    Ok(session)
}

fn login_step(e: AppError) -> AppError {
    AppError::Authentication(format!("login form not usable: {e}"))
}

fn is_login_page(current: &str, login_url: &str) -> bool {
    match (Url::parse(current), Url::parse(login_url)) {
        (Ok(current), Ok(login)) => current
            .path()
            .trim_end_matches('/')
            .eq_ignore_ascii_case(login.path().trim_end_matches('/')),
        _ => current.starts_with(login_url),
    }
}
