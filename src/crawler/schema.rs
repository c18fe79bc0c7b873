//! Named description of the calendar markup.
//!
//! Positional paths break silently when the site changes its layout. Every
//! lookup the crawler performs goes through a named field here, so a
//! mismatch surfaces as a navigation error that names the field.

use crate::errors::{AppError, AppResult};
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSchema {
    pub version: u32,

    // login form (input `name` attributes)
    pub login_username_field: String,
    pub login_password_field: String,
    pub login_submit: String,

    /// CSS selector of the cell holding "Week <n> <from> - <to>".
    pub week_label: String,
    /// Regex with named groups `week`, `from` and `to`.
    pub week_label_pattern: String,
    /// CSS selector matching one element per displayed day, in order.
    pub day_columns: String,
    /// Child element path from a day column down to its rows.
    pub day_rows_path: Vec<String>,
    /// Tag of the day label cell inside the first row.
    pub day_header: String,
    // CSS selectors evaluated inside one session row
    pub class_name: String,
    pub start_time: String,
    pub session_id: String,
    pub session_id_attr: String,
    /// Element id of the "previous week" button.
    pub previous_week_button: String,
}

impl Default for PageSchema {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            login_username_field: "UserName".to_string(),
            login_password_field: "Password".to_string(),
            login_submit: "login".to_string(),
            week_label: "#main > div:nth-of-type(4) > table > tbody > tr:nth-of-type(1) \
                         > td:nth-of-type(2) > div > table > tbody > tr > td:nth-of-type(2)"
                .to_string(),
            week_label_pattern:
                r"(?:Uge|Week)\s+(?P<week>\d{1,2})\s+(?P<from>[\d-]+)\s+-\s+(?P<to>[\d-]+)"
                    .to_string(),
            day_columns: "#joinForm > table > tbody > tr > td".to_string(),
            day_rows_path: vec!["table".into(), "tbody".into(), "tr".into()],
            day_header: "th".to_string(),
            class_name: ".teamName".to_string(),
            start_time: ".teamTime".to_string(),
            session_id: ".TeamDesc".to_string(),
            session_id_attr: "data-id".to_string(),
            previous_week_button: "UCDprevBtn".to_string(),
        }
    }
}

impl PageSchema {
    /// Parse every selector and pattern once.
    pub fn compile(&self) -> AppResult<CompiledSchema> {
        if self.version != SCHEMA_VERSION {
            return Err(AppError::Config(format!(
                "page schema version {} is not supported (expected {SCHEMA_VERSION})",
                self.version
            )));
        }
        if self.day_rows_path.is_empty() {
            return Err(AppError::Config(
                "page schema field 'day_rows_path' must not be empty".into(),
            ));
        }

        let week_label_pattern = Regex::new(&self.week_label_pattern).map_err(|e| {
            AppError::Config(format!("page schema field 'week_label_pattern': {e}"))
        })?;
        for group in ["week", "from", "to"] {
            if !week_label_pattern.capture_names().flatten().any(|n| n == group) {
                return Err(AppError::Config(format!(
                    "page schema field 'week_label_pattern' lacks the '{group}' group"
                )));
            }
        }

        Ok(CompiledSchema {
            week_label: selector("week_label", &self.week_label)?,
            week_label_pattern,
            day_columns: selector("day_columns", &self.day_columns)?,
            day_rows_path: self.day_rows_path.clone(),
            day_header: self.day_header.clone(),
            class_name: selector("class_name", &self.class_name)?,
            start_time: selector("start_time", &self.start_time)?,
            session_id: selector("session_id", &self.session_id)?,
            session_id_attr: self.session_id_attr.clone(),
            previous_week_button: self.previous_week_button.clone(),
        })
    }
}

fn selector(field: &str, css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| {
        AppError::Config(format!("page schema field '{field}' is not valid CSS: {e:?}"))
    })
}

/// A [`PageSchema`] with parsed selectors.
#[derive(Debug)]
pub struct CompiledSchema {
    pub(crate) week_label: Selector,
    pub(crate) week_label_pattern: Regex,
    pub(crate) day_columns: Selector,
    pub(crate) day_rows_path: Vec<String>,
    pub(crate) day_header: String,
    pub(crate) class_name: Selector,
    pub(crate) start_time: Selector,
    pub(crate) session_id: Selector,
    pub(crate) session_id_attr: String,
    pub previous_week_button: String,
}

impl CompiledSchema {
    /// First descendant of `scope` matching `sel`, or a navigation error
    /// naming the schema field.
    pub(crate) fn one<'a>(
        &self,
        scope: ElementRef<'a>,
        sel: &Selector,
        field: &str,
    ) -> AppResult<ElementRef<'a>> {
        scope.select(sel).next().ok_or_else(|| {
            AppError::Navigation(format!("page schema field '{field}' matched nothing"))
        })
    }

    /// Rows beneath one day column, header row included.
    pub(crate) fn day_rows<'a>(&self, column: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        child_path(column, &self.day_rows_path)
    }

    pub(crate) fn header_cell<'a>(&self, row: ElementRef<'a>) -> Option<ElementRef<'a>> {
        row.children()
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == self.day_header)
    }
}

/// Follow direct children by tag name. Nested tables further down the
/// tree never match.
fn child_path<'a>(root: ElementRef<'a>, path: &[String]) -> Vec<ElementRef<'a>> {
    let mut current = vec![root];
    for tag in path {
        current = current
            .into_iter()
            .flat_map(|el| {
                el.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == tag.as_str())
                    .collect::<Vec<_>>()
            })
            .collect();
    }
    current
}

/// Visible text of an element with whitespace runs collapsed to one space.
pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
