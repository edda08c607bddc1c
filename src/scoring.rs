//! Scoring primitives over stats snapshots.
//!
//! Every place that needs a topic's weakness (ranking, the adaptive gate,
//! reports) goes through `topic_score`.

use crate::domain::{Challenge, ChallengeStats, OutcomeCounts, Topic, TopicStats};

/// A challenge untouched for this long gets a small revisit bonus.
pub const STALE_AFTER_SECS: i64 = 7 * 24 * 60 * 60;

/// Weakness score of a topic. Never below 1.
pub fn topic_score(topic: &Topic, stats: &TopicStats) -> u32 {
  stats.get(topic).map(score_counts).unwrap_or(1)
}

/// `max(1, 1 + failures - successes)` for a single counter set.
pub fn score_counts(counts: &OutcomeCounts) -> u32 {
  let raw = 1 + counts.failures() as i64 - counts.successes() as i64;
  raw.clamp(1, u32::MAX as i64) as u32
}

/// Selection weight of a challenge: topic weakness, plus the challenge's own
/// unresolved failures, plus a staleness bonus. Never below 1.
pub fn challenge_weight(
  challenge: &Challenge,
  topic_stats: &TopicStats,
  challenge_stats: &ChallengeStats,
  now: i64,
) -> u64 {
  let base = topic_score(&challenge.topic, topic_stats) as u64;
  let record = challenge_stats.get(&challenge.id);

  let unresolved = record
    .map(|r| r.counts.failures().saturating_sub(r.counts.successes()))
    .unwrap_or(0);

  let staleness = match record.and_then(|r| r.last_attempt) {
    None => 1,
    Some(at) if now.saturating_sub(at) > STALE_AFTER_SECS => 1,
    Some(_) => 0,
  };

  base + unresolved + staleness
}
