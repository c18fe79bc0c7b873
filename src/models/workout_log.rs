use super::attendance::AttendanceRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attendance history keyed by member name.
///
/// Each member's records are kept in the order they were discovered by
/// the crawler, which is not necessarily chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutLog {
    members: BTreeMap<String, Vec<AttendanceRecord>>,
}

impl WorkoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct member names.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn record_count(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    pub fn get(&self, name: &str) -> Option<&[AttendanceRecord]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &[AttendanceRecord])> {
        self.members
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.members.values().flatten()
    }

    /// Append a record under its own name.
    pub fn push(&mut self, record: AttendanceRecord) {
        self.members
            .entry(record.name.clone())
            .or_default()
            .push(record);
    }

    /// Pass every name through `normalize`, regrouping members whose names
    /// become equal. Records keep their relative order.
    pub fn renamed(self, normalize: impl Fn(&str) -> String) -> Self {
        let mut log = Self::new();
        for record in self.members.into_values().flatten() {
            let name = normalize(&record.name);
            log.push(AttendanceRecord { name, ..record });
        }
        log
    }

    pub fn contains(&self, record: &AttendanceRecord) -> bool {
        self.members
            .get(&record.name)
            .is_some_and(|records| records.iter().any(|r| r.merge_key() == record.merge_key()))
    }

    pub fn latest_event_time(&self) -> Option<NaiveDateTime> {
        self.records().map(|r| r.event_time).max()
    }

    pub fn earliest_event_time(&self) -> Option<NaiveDateTime> {
        self.records().map(|r| r.event_time).min()
    }
}
