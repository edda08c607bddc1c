//! Topic ranking by weakness score.

use std::collections::BTreeMap;

use crate::domain::{Challenge, Topic, TopicStats};
use crate::scoring::topic_score;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicRank {
  pub topic: Topic,
  pub score: u32,
  /// Challenges of this topic in the ranked pool.
  pub count: usize,
}

/// Rank the topics present in `challenges`: score desc, count desc, topic asc.
/// No history means no signal, so the ranking is empty.
pub fn rank_topics(challenges: &[Challenge], stats: &TopicStats) -> Vec<TopicRank> {
  if stats.is_empty() {
    return Vec::new();
  }

  let mut counts: BTreeMap<&Topic, usize> = BTreeMap::new();
  for ch in challenges {
    *counts.entry(&ch.topic).or_default() += 1;
  }

  let mut ranked: Vec<TopicRank> = counts
    .into_iter()
    .map(|(topic, count)| TopicRank { topic: topic.clone(), score: topic_score(topic, stats), count })
    .collect();
  ranked.sort_by(|a, b| {
    b.score
      .cmp(&a.score)
      .then_with(|| b.count.cmp(&a.count))
      .then_with(|| a.topic.cmp(&b.topic))
  });
  ranked
}

/// Topics to focus on: the top two, widened to four when the leaders tie.
pub fn preferred_topics(ranking: &[TopicRank]) -> Vec<Topic> {
  let take = match ranking {
    [first, second, ..] if first.score == second.score => 4,
    _ => 2,
  };
  ranking.iter().take(take).map(|r| r.topic.clone()).collect()
}
