//! Outcome stats: append-only recording and cumulative snapshots.
//!
//! Storage is one JSON object per line. A snapshot folds every line, so the
//! counts only ever grow unless the file itself is truncated.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{ChallengeStats, Outcome, OutcomeCounts, Topic, TopicStats};
use crate::scoring::score_counts;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("stats/log io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to encode record: {0}")]
  Encode(#[from] serde_json::Error),
}

/// One recorded outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
  pub topic: Topic,
  pub challenge: String,
  pub outcome: Outcome,
  /// Unix seconds.
  pub at: i64,
}

/// Cumulative counts as of the read instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
  pub topics: TopicStats,
  pub challenges: ChallengeStats,
}

impl StatsSnapshot {
  pub fn apply(&mut self, rec: &OutcomeRecord) {
    self.topics.entry(rec.topic.clone()).or_default().record(rec.outcome);
    let entry = self.challenges.entry(rec.challenge.clone()).or_default();
    entry.counts.record(rec.outcome);
    entry.last_attempt = Some(entry.last_attempt.map_or(rec.at, |prev| prev.max(rec.at)));
  }
}

pub trait StatsStore {
  /// Record one outcome for both the topic and the challenge.
  fn record(&mut self, rec: OutcomeRecord) -> Result<(), StoreError>;
  fn snapshot(&self) -> Result<StatsSnapshot, StoreError>;
}

/// In-memory store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
  pub records: Vec<OutcomeRecord>,
}

impl StatsStore for MemoryStatsStore {
  fn record(&mut self, rec: OutcomeRecord) -> Result<(), StoreError> {
    self.records.push(rec);
    Ok(())
  }

  fn snapshot(&self) -> Result<StatsSnapshot, StoreError> {
    let mut snap = StatsSnapshot::default();
    self.records.iter().for_each(|r| snap.apply(r));
    Ok(snap)
  }
}

/// JSON-lines file store.
#[derive(Clone, Debug)]
pub struct JsonlStatsStore {
  path: PathBuf,
}

impl JsonlStatsStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path { &self.path }
}

pub(crate) fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
  let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    fs::create_dir_all(dir).map_err(io_err)?;
  }
  let mut file = OpenOptions::new().create(true).append(true).open(path).map_err(io_err)?;
  writeln!(file, "{line}").map_err(io_err)
}

/// Read non-empty lines; a missing file reads as empty.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, StoreError> {
  let file = match fs::File::open(path) {
    Ok(f) => f,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
  };
  let mut out = Vec::new();
  for line in BufReader::new(file).lines() {
    let line = line.map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    if !line.trim().is_empty() {
      out.push(line);
    }
  }
  Ok(out)
}

impl StatsStore for JsonlStatsStore {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  fn record(&mut self, rec: OutcomeRecord) -> Result<(), StoreError> {
    let line = serde_json::to_string(&rec)?;
    append_line(&self.path, &line)
  }

  fn snapshot(&self) -> Result<StatsSnapshot, StoreError> {
    let mut snap = StatsSnapshot::default();
    for (n, line) in read_lines(&self.path)?.iter().enumerate() {
      match serde_json::from_str::<OutcomeRecord>(line) {
        Ok(rec) => snap.apply(&rec),
        Err(e) => warn!(target: "codedrill", path = %self.path.display(), line = n + 1, error = %e, "Skipping malformed stats line"),
      }
    }
    debug!(target: "codedrill", topics = snap.topics.len(), challenges = snap.challenges.len(), "Stats snapshot loaded");
    Ok(snap)
  }
}

/// One line of the weakness report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaknessLine {
  pub topic: Topic,
  pub score: u32,
  pub counts: OutcomeCounts,
}

/// Topics sorted by weakness (same score as selection uses).
pub fn weakness_report(snapshot: &StatsSnapshot) -> Vec<WeaknessLine> {
  let mut lines: Vec<WeaknessLine> = snapshot
    .topics
    .iter()
    .map(|(topic, counts)| WeaknessLine { topic: topic.clone(), score: score_counts(counts), counts: *counts })
    .collect();
  lines.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.topic.cmp(&b.topic)));
  lines
}

/// Challenges with the most failures, at most `limit`, ties broken by id.
pub fn top_failing_challenges(snapshot: &StatsSnapshot, limit: usize) -> Vec<(String, OutcomeCounts)> {
  let mut failing: Vec<(String, OutcomeCounts)> = snapshot
    .challenges
    .iter()
    .filter(|(_, r)| r.counts.failures() > 0)
    .map(|(id, r)| (id.clone(), r.counts))
    .collect();
  failing.sort_by(|a, b| b.1.failures().cmp(&a.1.failures()).then_with(|| a.0.cmp(&b.0)));
  failing.truncate(limit);
  failing
}
