use crate::models::WorkoutLog;
use crate::store::{HighWaterMark, high_water_mark};
use ansi_term::Colour;
use chrono::{NaiveDate, NaiveDateTime};

/// Read-only summary of a workout log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStats {
    pub members: usize,
    pub records: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub high_water: HighWaterMark,
    /// Most frequent attendees, highest count first (ties by name).
    pub top: Vec<(String, usize)>,
}

impl LogStats {
    pub fn from_log(log: &WorkoutLog, top_k: usize, epoch: NaiveDate) -> Self {
        let mut counts: Vec<(String, usize)> = log
            .members()
            .map(|(name, records)| (name.to_string(), records.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(top_k);

        Self {
            members: log.member_count(),
            records: log.record_count(),
            first: log.earliest_event_time(),
            last: log.latest_event_time(),
            high_water: high_water_mark(log, epoch),
            top: counts,
        }
    }
}

pub struct StatsLogic;

impl StatsLogic {
    pub fn print(stats: &LogStats) {
        println!("📊 Workout log\n");
        println!("Number of unique names: {}", stats.members);
        println!("Total attendances:      {}", stats.records);

        let fmt = |t: Option<NaiveDateTime>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!("First class:            {}", fmt(stats.first));
        println!("Last data update:       {}", fmt(stats.last));

        let hw = &stats.high_water;
        if hw.is_epoch_default() {
            println!("High-water week:        {} (default {})", hw.week, hw.date);
        } else {
            println!("High-water week:        {} ({})", hw.week, hw.date);
        }

        if stats.top.is_empty() {
            return;
        }

        println!("\n🏆 Top {}:\n", stats.top.len());
        let rank_w = stats.top.len().to_string().len();
        let name_w = stats.top.iter().map(|(n, _)| n.chars().count()).max().unwrap_or(4);
        for (i, (name, count)) in stats.top.iter().enumerate() {
            let colour = match i {
                0 => Colour::Yellow,
                1 => Colour::White,
                2 => Colour::RGB(205, 127, 50),
                _ => Colour::Fixed(245),
            };
            println!(
                "{:>rank_w$}  {:<name_w$}  {}",
                i + 1,
                name,
                colour.paint(count.to_string()),
                rank_w = rank_w,
                name_w = name_w
            );
        }
    }
}
