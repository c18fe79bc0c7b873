use crate::utils::date::{iso_week, week_start};
use chrono::{Days, NaiveDate};

/// The week currently shown by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub week_number: u32,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl WeekWindow {
    /// Window of the ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let from_date = week_start(date);
        Self {
            week_number: iso_week(from_date),
            from_date,
            to_date: from_date + Days::new(6),
        }
    }

    /// The window one week earlier.
    ///
    /// The week number is recomputed from the shifted start date; the
    /// calendar label is not re-read after paging.
    pub fn previous(&self) -> Self {
        let from_date = self.from_date - Days::new(7);
        Self {
            week_number: iso_week(from_date),
            from_date,
            to_date: self.to_date - Days::new(7),
        }
    }

    /// Monday of the window, used for cross-year comparisons.
    pub fn start(&self) -> NaiveDate {
        week_start(self.from_date)
    }
}
