use super::schema::{CompiledSchema, collapsed_text};
use crate::errors::{AppError, AppResult};
use crate::models::{SessionDescriptor, WeekWindow};
use crate::utils::date::{iso_week, parse_calendar_date};
use chrono::{Days, NaiveDate, NaiveTime};
use scraper::{ElementRef, Html};
use tracing::trace;

/// Reads the week label and the class grid from a rendered calendar page.
pub struct SessionExtractor<'s> {
    schema: &'s CompiledSchema,
}

impl<'s> SessionExtractor<'s> {
    pub fn new(schema: &'s CompiledSchema) -> Self {
        Self { schema }
    }

    /// Parse the "Week <n> <from> - <to>" label of the displayed week.
    pub fn week_window(&self, page: &Html) -> AppResult<WeekWindow> {
        let cell = self
            .schema
            .one(page.root_element(), &self.schema.week_label, "week_label")?;
        parse_week_label(&self.schema.week_label_pattern, &collapsed_text(cell))
    }

    /// Sessions of the displayed week, day by day in display order.
    ///
    /// `week_start` is the date of the first day column; each following
    /// column is one day later. The iterator borrows the page and yields
    /// one item per session row.
    pub fn sessions<'p>(
        &'p self,
        page: &'p Html,
        week_start: NaiveDate,
    ) -> AppResult<impl Iterator<Item = AppResult<SessionDescriptor>> + 'p> {
        let mut columns = page.select(&self.schema.day_columns).peekable();
        if columns.peek().is_none() {
            return Err(AppError::Navigation(
                "page schema field 'day_columns' matched nothing".into(),
            ));
        }

        Ok(columns
            .enumerate()
            .flat_map(move |(offset, column)| {
                let day = week_start + Days::new(offset as u64);
                self.day_sessions(column, day)
            }))
    }

    fn day_sessions<'p>(
        &'p self,
        column: ElementRef<'p>,
        day: NaiveDate,
    ) -> impl Iterator<Item = AppResult<SessionDescriptor>> + 'p {
        let rows = self.schema.day_rows(column);

        if let Some(label) = rows
            .first()
            .and_then(|header| self.schema.header_cell(*header))
            .and_then(|cell| collapsed_text(cell).split_whitespace().next().map(str::to_owned))
        {
            trace!(%day, label = %label, "reading day column");
        }

        // first row holds the day label
        rows.into_iter()
            .skip(1)
            .map(move |row| self.read_session(row, day))
    }

    fn read_session(&self, row: ElementRef<'_>, day: NaiveDate) -> AppResult<SessionDescriptor> {
        let schema = self.schema;

        let class_type = collapsed_text(schema.one(row, &schema.class_name, "class_name")?);

        let time_text = collapsed_text(schema.one(row, &schema.start_time, "start_time")?);
        let start = time_text
            .split_whitespace()
            .next()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .ok_or_else(|| {
                AppError::Navigation(format!("unreadable start time '{time_text}' on {day}"))
            })?;

        let external_id = schema
            .one(row, &schema.session_id, "session_id")?
            .value()
            .attr(&schema.session_id_attr)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Navigation(format!(
                    "session '{class_type}' on {day} has no '{}' attribute",
                    schema.session_id_attr
                ))
            })?
            .to_string();

        Ok(SessionDescriptor {
            class_type,
            event_time: day.and_time(start),
            external_id,
        })
    }
}

/// Parse a week label such as `Uge 23 05-06-2023 - 11-06-2023`.
pub fn parse_week_label(pattern: &regex::Regex, text: &str) -> AppResult<WeekWindow> {
    let caps = pattern
        .captures(text)
        .ok_or_else(|| AppError::Navigation(format!("unrecognised week label '{text}'")))?;

    let week_number: u32 = caps["week"]
        .parse()
        .map_err(|_| AppError::Navigation(format!("bad week number in '{text}'")))?;
    let from_date = parse_calendar_date(&caps["from"])
        .ok_or_else(|| AppError::Navigation(format!("bad start date in '{text}'")))?;
    let to_date = parse_calendar_date(&caps["to"])
        .ok_or_else(|| AppError::Navigation(format!("bad end date in '{text}'")))?;

    if iso_week(from_date) != week_number {
        tracing::warn!(
            week_number,
            %from_date,
            "week label number disagrees with its start date"
        );
    }

    Ok(WeekWindow {
        week_number,
        from_date,
        to_date,
    })
}
