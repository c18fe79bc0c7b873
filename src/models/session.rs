use chrono::NaiveDateTime;

/// A single bookable class occurrence read from the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub class_type: String,
    pub event_time: NaiveDateTime,
    pub external_id: String,
}
