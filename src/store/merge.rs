use crate::models::{AttendanceRecord, WorkoutLog};
use serde::{Deserialize, Serialize};

/// How newly crawled records are combined with the stored log.
///
/// Every crawl re-reads the week after the high-water mark, so `Append`
/// stores that week's attendees again on each run. `Dedupe` skips a record
/// whose name, event time and class are already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    #[default]
    Dedupe,
    Append,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub skipped: usize,
}

/// Append `records` under their names, keeping existing entries and order.
pub fn merge<I>(log: &mut WorkoutLog, records: I, policy: MergePolicy) -> MergeReport
where
    I: IntoIterator<Item = AttendanceRecord>,
{
    let mut report = MergeReport::default();
    for record in records {
        if policy == MergePolicy::Dedupe && log.contains(&record) {
            report.skipped += 1;
            continue;
        }
        log.push(record);
        report.added += 1;
    }
    report
}
