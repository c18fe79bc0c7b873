use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of `signup_time` as published by the team-info page.
pub const SIGNUP_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// One confirmed attendee of one class.
///
/// `event_time` comes from the calendar (day column + start time of the
/// class), never from the attendee row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub rank: u32,
    pub signup_time: String,
    pub class_type: String,
    pub event_time: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn new(
        name: impl Into<String>,
        rank: u32,
        signup_time: impl Into<String>,
        class_type: impl Into<String>,
        event_time: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            rank,
            signup_time: signup_time.into(),
            class_type: class_type.into(),
            event_time,
        }
    }

    /// Identity used when deduplicating on merge.
    pub fn merge_key(&self) -> (&str, NaiveDateTime, &str) {
        (&self.name, self.event_time, &self.class_type)
    }
}
