//! Bounded, append-only console log.

use std::collections::VecDeque;

use chrono::{DateTime, TimeZone};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::models::{LogEntry, LogKind};

/// Maximum number of entries kept in memory and on disk.
pub const LOG_CAPACITY: usize = 50;

/// Ring buffer of [`LogEntry`] values in append order.
///
/// Once more than [`LOG_CAPACITY`] entries exist the oldest are dropped. Every
/// entry gets a sequence number one higher than the previous one, so two
/// appends in the same instant still sort correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a buffer from persisted entries, keeping the newest window.
    ///
    /// Returns `None` when a sequence number leaves no room for the next
    /// append.
    pub fn from_entries(entries: Vec<LogEntry>) -> Option<Self> {
        let skip = entries.len().saturating_sub(LOG_CAPACITY);
        let entries: VecDeque<LogEntry> = entries.into_iter().skip(skip).collect();
        let next_seq = match entries.iter().map(|e| e.seq).max() {
            Some(max) => max.checked_add(1)?,
            None => 0,
        };
        Some(Self { entries, next_seq })
    }

    pub fn append<Tz>(&mut self, text: impl Into<String>, kind: LogKind, at: DateTime<Tz>) -> &LogEntry
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);

        let random = Uuid::new_v4().simple().to_string();
        let entry = LogEntry {
            id: format!("{}-{}-{}", at.timestamp_millis(), seq, &random[..8]),
            seq,
            text: text.into(),
            kind,
            timestamp: at.format("%H:%M:%S").to_string(),
        };

        while self.entries.len() >= LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);

        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Serialize for LogBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, Utc};

    fn fixed_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(17, 4, 5)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn append_formats_timestamp_on_24_hour_clock() {
        let mut logs = LogBuffer::new();
        let entry = logs.append("boot", LogKind::Info, fixed_time());
        assert_eq!(entry.timestamp, "17:04:05");
        assert_eq!(entry.kind, LogKind::Info);
    }

    #[test]
    fn keeps_the_newest_fifty_in_order() {
        let mut logs = LogBuffer::new();
        for i in 1..=55 {
            logs.append(format!("line {}", i), LogKind::Info, Local::now());
        }

        assert_eq!(logs.len(), LOG_CAPACITY);
        let texts: Vec<String> = logs.iter().map(|e| e.text.clone()).collect();
        let expected: Vec<String> = (6..=55).map(|i| format!("line {}", i)).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn same_instant_appends_keep_monotonic_sequence() {
        let mut logs = LogBuffer::new();
        let at = fixed_time();
        logs.append("a", LogKind::Info, at);
        logs.append("b", LogKind::Warn, at);
        logs.append("c", LogKind::Success, at);

        let seqs: Vec<u64> = logs.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);

        let mut ids: Vec<&str> = logs.iter().map(|e| e.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn from_entries_trims_and_continues_sequence() {
        let mut source = LogBuffer::new();
        for i in 0..10 {
            source.append(format!("{}", i), LogKind::Info, fixed_time());
        }
        let mut entries = source.to_vec();
        entries.extend(source.to_vec().into_iter().map(|mut e| {
            e.seq += 100;
            e
        }));
        // 20 entries, well under capacity
        let mut restored = LogBuffer::from_entries(entries).unwrap();
        assert_eq!(restored.len(), 20);

        let next = restored.append("next", LogKind::Info, fixed_time());
        assert_eq!(next.seq, 110);
    }

    #[test]
    fn from_entries_keeps_only_the_newest_window() {
        let mut source = LogBuffer::new();
        let mut all = Vec::new();
        for i in 0..70 {
            all.push(source.append(format!("{}", i), LogKind::Info, fixed_time()).clone());
        }

        let restored = LogBuffer::from_entries(all).unwrap();
        assert_eq!(restored.len(), LOG_CAPACITY);
        assert_eq!(restored.iter().next().map(|e| e.text.as_str()), Some("20"));
        assert_eq!(restored.latest().map(|e| e.text.as_str()), Some("69"));
    }

    #[test]
    fn from_entries_rejects_an_exhausted_sequence() {
        let mut source = LogBuffer::new();
        let mut entry = source.append("last", LogKind::Info, fixed_time()).clone();
        entry.seq = u64::MAX;

        assert!(LogBuffer::from_entries(vec![entry.clone()]).is_none());

        entry.seq = u64::MAX - 1;
        let mut restored = LogBuffer::from_entries(vec![entry]).unwrap();
        assert_eq!(restored.append("next", LogKind::Info, fixed_time()).seq, u64::MAX);
    }

    #[test]
    fn from_empty_entries_starts_at_zero() {
        let mut restored = LogBuffer::from_entries(Vec::new()).unwrap();
        assert_eq!(restored.append("first", LogKind::Info, fixed_time()).seq, 0);
    }
}
