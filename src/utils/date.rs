use chrono::{Datelike, Days, NaiveDate};

/// Date format used by the calendar week label.
pub const CALENDAR_DATE_FORMAT: &str = "%d-%m-%Y";

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), CALENDAR_DATE_FORMAT).ok()
}

/// ISO 8601 week number (1..=53).
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}
