//! Structured event log records (serde ready) and the append-only log.
//! Each record is one JSON line: `event`, timestamp, session id, plus
//! free-form string and integer fields that reports pull out by key.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stats::{append_line, read_lines, StoreError};

/// Kinds of events the session writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    ChallengeStart,
    ChallengeAttempt,
    SolutionViewed,
    ConstraintViolation,
    ManualComplete,
    AdaptiveGate,
    SessionComplete,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: EventKind,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, i64>,
}

impl EventRecord {
    pub fn new(event: EventKind) -> Self {
        Self {
            event,
            ts: Utc::now(),
            session: None,
            fields: BTreeMap::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    pub fn with_str(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_int(mut self, key: &str, value: i64) -> Self {
        self.counts.insert(key.to_string(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.counts.get(key).copied()
    }
}

pub trait EventLog {
    fn append(&mut self, record: EventRecord) -> Result<(), StoreError>;
    fn read_all(&self) -> Result<Vec<EventRecord>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryEventLog {
    pub records: Vec<EventRecord>,
}

impl MemoryEventLog {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.records.iter().map(|r| r.event).collect()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&mut self, record: EventRecord) -> Result<(), StoreError> {
        self.records.push(record);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.records.clone())
    }
}

#[derive(Clone, Debug)]
pub struct JsonlEventLog {
    path: PathBuf,
}

impl JsonlEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventLog for JsonlEventLog {
    fn append(&mut self, record: EventRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&record)?;
        append_line(&self.path, &line)
    }

    fn read_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut out = Vec::new();
        for line in read_lines(&self.path)? {
            match serde_json::from_str::<EventRecord>(&line) {
                Ok(r) => out.push(r),
                Err(e) => warn!(target: "codedrill", path = %self.path.display(), error = %e, "Skipping malformed event line"),
            }
        }
        Ok(out)
    }
}

/// Pull one string field out of every record of `kind` that carries it.
pub fn extract_field(records: &[EventRecord], kind: EventKind, key: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.event == kind)
        .filter_map(|r| r.field(key).map(str::to_string))
        .collect()
}
