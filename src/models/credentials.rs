use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;

/// Login credentials read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_env(username_var: &str, password_var: &str) -> AppResult<Self> {
        let username = env::var(username_var)
            .map_err(|_| AppError::MissingCredential(username_var.to_string()))?;
        let password = env::var(password_var)
            .map_err(|_| AppError::MissingCredential(password_var.to_string()))?;
        Ok(Self::new(username, password))
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookies and identity headers lifted from the logged-in browser.
///
/// This is all the attendee fetcher needs to talk to the site without
/// going through the browser.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub cookies: Vec<(String, String)>,
    pub user_agent: String,
}

impl AuthenticatedSession {
    /// `Cookie` request header value, `None` when no cookie was captured.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("AuthenticatedSession")
            .field("cookies", &names)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
