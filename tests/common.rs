#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use std::env;
use std::fs;
use std::path::PathBuf;
use wodlogger::crawler::CalendarBrowser;
use wodlogger::errors::{AppError, AppResult};
use wodlogger::models::{AttendanceRecord, WeekWindow, WorkoutLog};

pub const LOGIN_URL: &str = "https://booking.test/club/Account/LogOn";
pub const ACTIVITY_URL: &str = "https://booking.test/club/TeamActivity/AllActivities?lang=da";
pub const USERNAME: &str = "member@example.com";
pub const PASSWORD: &str = "hunter2";

pub fn wod() -> Command {
    cargo_bin_cmd!("wodlogger")
}

/// Unique path inside the system temp dir, removed if it already exists
pub fn temp_path(name: &str, ext: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("wodlogger_{name}.{ext}"));
    fs::remove_file(&path).ok();
    fs::remove_dir_all(&path).ok();
    path
}

/// Fresh empty directory inside the system temp dir
pub fn temp_dir(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("wodlogger_{name}"));
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("create temp dir");
    path
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").expect("valid datetime")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn record(name: &str, class_type: &str, event_time: &str) -> AttendanceRecord {
    AttendanceRecord::new(name, 1, "01-06-2023 08:00:00", class_type, dt(event_time))
}

pub fn log_of(records: Vec<AttendanceRecord>) -> WorkoutLog {
    let mut log = WorkoutLog::new();
    for r in records {
        log.push(r);
    }
    log
}

/// Classes offered every week: (weekday offset from Monday, class, start time)
pub const TIMETABLE: &[(u64, &str, &str)] = &[
    (0, "CrossFit", "17:00"),
    (0, "Open Gym", "18:30"),
    (2, "Weightlifting", "06:30"),
];

/// Session id of a timetable slot in the week starting `monday`
pub fn session_id(monday: NaiveDate, slot: usize) -> String {
    format!("{}{:02}{}", monday.year(), monday.iso_week().week(), slot)
}

/// Render a calendar page the way the booking site lays it out.
pub fn calendar_page(monday: NaiveDate) -> String {
    let window = WeekWindow::containing(monday);
    let label = format!(
        "Uge {}\n   {} - {}",
        window.week_number,
        window.from_date.format("%d-%m-%Y"),
        window.to_date.format("%d-%m-%Y")
    );

    let mut columns = String::new();
    for offset in 0..7u64 {
        let day = monday + Days::new(offset);
        columns.push_str(&format!(
            "<td><table><tbody><tr><th>{} {}</th></tr>",
            day.format("%A"),
            day.format("%d-%m")
        ));
        for (slot, (weekday, class, time)) in TIMETABLE.iter().enumerate() {
            if *weekday == offset {
                columns.push_str(&format!(
                    "<tr><td><div class=\"teamName\">{class}</div>\
                     <div class=\"teamTime\"> {time} </div>\
                     <a class=\"TeamDesc\" data-id=\"{}\">Info</a></td></tr>",
                    session_id(monday, slot)
                ));
            }
        }
        columns.push_str("</tbody></table></td>");
    }

    format!(
        "<html><body><div id=\"main\">\
         <div>logo</div><div>menu</div><div>news</div>\
         <div><table><tbody><tr><td>filters</td><td><div><table><tbody><tr>\
         <td><button id=\"UCDprevBtn\">&lt;</button></td><td>{label}</td>\
         </tr></tbody></table></div></td></tr></tbody></table></div>\
         </div>\
         <form id=\"joinForm\"><table><tbody><tr>{columns}</tr></tbody></table></form>\
         </body></html>"
    )
}

/// Team-info page with the given rows: (rank, name, signup time, waitlist text)
pub fn team_info_page(rows: &[(u32, &str, &str, Option<&str>)]) -> String {
    let mut body = String::from(
        "<html><body><table class=\"participants\">\n<tr><th>#</th><th>Navn</th><th>Tilmeldt</th></tr>\n",
    );
    for (rank, name, signup, waitlist) in rows {
        body.push_str(&format!(
            "<tr>\n    <td>{rank}</td>\n    <td>{name}</td>\n    <td>{signup}</td>\n"
        ));
        if let Some(text) = waitlist {
            body.push_str(&format!("    <td>\n        {text}\n    </td>\n"));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table></body></html>");
    body
}

/// Scripted stand-in for a WebDriver session over the booking site.
pub struct ScriptedBrowser {
    pub today: NaiveDate,
    pub displayed: NaiveDate,
    pub current_url: String,
    pub logged_in: bool,
    pub form_fields: Vec<&'static str>,
    pub filled: Vec<(String, String)>,
    pub typed_username: Option<String>,
    pub typed_password: Option<String>,
    pub sources: Vec<NaiveDate>,
    pub prev_clicks: usize,
    pub closed: bool,
    /// Serve this body instead of the calendar page
    pub broken_page: Option<String>,
    /// Browser call that never answers, like a wedged WebDriver
    pub hang_on: Option<&'static str>,
}

impl ScriptedBrowser {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            displayed: wodlogger::utils::date::week_start(today),
            current_url: String::from("about:blank"),
            logged_in: false,
            form_fields: vec!["UserName", "Password", "login"],
            filled: Vec::new(),
            typed_username: None,
            typed_password: None,
            sources: Vec::new(),
            prev_clicks: 0,
            closed: false,
            broken_page: None,
            hang_on: None,
        }
    }

    /// Skip the login form, as after `authenticate`
    pub fn already_logged_in(mut self) -> Self {
        self.logged_in = true;
        self.current_url = ACTIVITY_URL.to_string();
        self
    }

    /// ISO weeks whose page source was read, in order
    pub fn weeks_read(&self) -> Vec<u32> {
        self.sources.iter().map(|d| d.iso_week().week()).collect()
    }

    async fn stall_if(&self, call: &str) {
        if self.hang_on == Some(call) {
            std::future::pending::<()>().await;
        }
    }

    fn missing(&self, what: &str) -> AppError {
        AppError::Browser(format!("no such element: {what}"))
    }
}

#[async_trait]
impl CalendarBrowser for ScriptedBrowser {
    async fn goto(&mut self, url: &str) -> AppResult<()> {
        self.stall_if("goto").await;
        if url == ACTIVITY_URL {
            if self.logged_in {
                self.current_url = ACTIVITY_URL.to_string();
                self.displayed = wodlogger::utils::date::week_start(self.today);
            } else {
                self.current_url = format!("{LOGIN_URL}?ReturnUrl=%2fclub%2fTeamActivity");
            }
        } else {
            self.current_url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&mut self) -> AppResult<String> {
        Ok(self.current_url.clone())
    }

    async fn fill(&mut self, field: &str, value: &str) -> AppResult<()> {
        if !self.form_fields.contains(&field) {
            return Err(self.missing(field));
        }
        match field {
            "UserName" => self.typed_username = Some(value.to_string()),
            "Password" => self.typed_password = Some(value.to_string()),
            _ => {}
        }
        self.filled.push((field.to_string(), value.to_string()));
        Ok(())
    }

    async fn click_named(&mut self, name: &str) -> AppResult<()> {
        if !self.form_fields.contains(&name) {
            return Err(self.missing(name));
        }
        self.logged_in = self.typed_username.as_deref() == Some(USERNAME)
            && self.typed_password.as_deref() == Some(PASSWORD);
        Ok(())
    }

    async fn click_id(&mut self, id: &str) -> AppResult<()> {
        self.stall_if("click_id").await;
        if id != "UCDprevBtn" {
            return Err(self.missing(id));
        }
        self.displayed = self.displayed - Days::new(7);
        self.prev_clicks += 1;
        Ok(())
    }

    async fn page_source(&mut self) -> AppResult<String> {
        self.stall_if("page_source").await;
        if let Some(page) = &self.broken_page {
            return Ok(page.clone());
        }
        self.sources.push(self.displayed);
        Ok(calendar_page(self.displayed))
    }

    async fn cookies(&mut self) -> AppResult<Vec<(String, String)>> {
        Ok(vec![
            ("ASP.NET_SessionId".to_string(), "s3ss10n".to_string()),
            (".ASPXAUTH".to_string(), "t0k3n".to_string()),
        ])
    }

    async fn user_agent(&mut self) -> AppResult<String> {
        Ok("Mozilla/5.0 (X11; Linux x86_64) ScriptedBrowser/1.0".to_string())
    }

    async fn close(&mut self) -> AppResult<()> {
        self.closed = true;
        Ok(())
    }
}
