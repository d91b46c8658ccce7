//! Bounded, newest-first history of completed edits.

use crate::error::EditError;
use crate::image::ImagePayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Maximum number of records kept.
pub const MAX_HISTORY: usize = 10;

/// Identifier of an [`EditRecord`].
///
/// Ids are the record's creation time in milliseconds, bumped forward when
/// two edits land in the same millisecond, so they sort by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Returns the raw id value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| EditError::InvalidRequest(format!("invalid history id: {s}")))
    }
}

/// One completed edit. Records are never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    id: RecordId,
    original: ImagePayload,
    edited: ImagePayload,
    instruction: String,
    created_at: DateTime<Utc>,
}

impl EditRecord {
    /// Unique id of this record.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The image the edit was applied to.
    pub fn original(&self) -> &ImagePayload {
        &self.original
    }

    /// The image returned by the editor.
    pub fn edited(&self) -> &ImagePayload {
        &self.edited
    }

    /// The instruction that produced this edit.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// When the edit completed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Newest-first list of at most [`MAX_HISTORY`] records.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: VecDeque<EditRecord>,
    last_id: Option<u64>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed edit at the front, evicting the oldest past the cap.
    pub fn record(
        &mut self,
        original: ImagePayload,
        edited: ImagePayload,
        instruction: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> &EditRecord {
        let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
        let id = match self.last_id {
            Some(last) if millis <= last => last + 1,
            _ => millis,
        };
        self.last_id = Some(id);

        self.records.push_front(EditRecord {
            id: RecordId(id),
            original,
            edited,
            instruction: instruction.into(),
            created_at,
        });

        while self.records.len() > MAX_HISTORY {
            if let Some(evicted) = self.records.pop_back() {
                tracing::debug!(id = %evicted.id, "evicted oldest history entry");
            }
        }

        &self.records[0]
    }

    /// Looks up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&EditRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Returns the most recent record.
    pub fn newest(&self) -> Option<&EditRecord> {
        self.records.front()
    }

    /// Iterates newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &EditRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no edits have completed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(tag: u8) -> ImagePayload {
        ImagePayload::new(vec![tag], "image/png")
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_newest_first_order() {
        let mut history = History::new();
        history.record(payload(1), payload(2), "A", at(1_000));
        history.record(payload(1), payload(3), "B", at(2_000));
        history.record(payload(1), payload(4), "C", at(3_000));

        let order: Vec<&str> = history.iter().map(|r| r.instruction()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
        assert_eq!(history.newest().unwrap().instruction(), "C");
    }

    #[test]
    fn test_eleventh_record_evicts_oldest() {
        let mut history = History::new();
        for i in 0..MAX_HISTORY {
            history.record(payload(0), payload(i as u8), format!("edit {i}"), at(i as i64 * 10));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        let oldest = history.iter().last().unwrap().id();

        history.record(payload(0), payload(99), "edit 10", at(1_000));
        assert_eq!(history.len(), MAX_HISTORY);
        assert!(history.get(oldest).is_none());
        assert_eq!(history.iter().last().unwrap().instruction(), "edit 1");
        assert_eq!(history.newest().unwrap().instruction(), "edit 10");
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut history = History::new();
        let a = history.record(payload(0), payload(1), "A", at(5_000)).id();
        let b = history.record(payload(0), payload(2), "B", at(5_000)).id();
        let c = history.record(payload(0), payload(3), "C", at(4_000)).id();

        assert_eq!(a.as_u64(), 5_000);
        assert_eq!(b.as_u64(), 5_001);
        assert_eq!(c.as_u64(), 5_002);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_get_by_id() {
        let mut history = History::new();
        let id = history.record(payload(7), payload(8), "Polish", at(42)).id();
        let record = history.get(id).unwrap();
        assert_eq!(record.original(), &payload(7));
        assert_eq!(record.edited(), &payload(8));
        assert_eq!(record.created_at(), at(42));
        assert!(history.get(RecordId::from(1)).is_none());
    }

    #[test]
    fn test_record_id_parse() {
        assert_eq!("1700000000000".parse::<RecordId>().unwrap().as_u64(), 1_700_000_000_000);
        assert!("abc".parse::<RecordId>().is_err());
        assert_eq!(RecordId::from(12).to_string(), "12");
    }
}
