//! Practice-set construction.
//!
//! Flow:
//! 1) Rank topics from history and narrow the catalog to the weak ones.
//! 2) Seed one pick per preferred topic (breadth first).
//! 3) Seed one pick per difficulty bucket (low / mid / high).
//! 4) Fill the rest by weight.
//!
//! Extra-tier variants of the same parent are deduplicated along the way.

use std::collections::{BTreeSet, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, instrument};

use crate::domain::{Challenge, ChallengeStats, Topic, TopicStats};
use crate::ranking::{preferred_topics, rank_topics};
use crate::sampler::weighted_select;
use crate::scoring::challenge_weight;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
  Low,
  Mid,
  High,
}

impl Bucket {
  pub const ALL: [Bucket; 3] = [Bucket::Low, Bucket::Mid, Bucket::High];

  /// Extra weight nudging picks toward harder items.
  pub fn range_bonus(self) -> u64 {
    match self {
      Bucket::Low => 0,
      Bucket::Mid => 1,
      Bucket::High => 2,
    }
  }
}

/// Bucket of a practice index against `max`, split in thirds (cuts floored at 1).
pub fn bucket_for(index: u32, max: u32) -> Bucket {
  let low_cut = (max / 3).max(1);
  let mid_cut = (2 * max / 3).max(1);
  if index <= low_cut {
    Bucket::Low
  } else if index <= mid_cut {
    Bucket::Mid
  } else {
    Bucket::High
  }
}

fn max_index(pool: &[&Challenge]) -> u32 {
  pool.iter().map(|c| c.practice_index()).max().unwrap_or(0)
}

/// Mutable bookkeeping of one build call.
struct Builder<'a, R: Rng + ?Sized, W: Fn(&Challenge) -> u64> {
  remaining: Vec<&'a Challenge>,
  used_parents: HashSet<String>,
  picked: Vec<Challenge>,
  weight: W,
  rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized, W: Fn(&Challenge) -> u64> Builder<'a, R, W> {
  /// Remaining candidates minus extra variants whose parent is already used.
  /// Falls back to everything remaining if that would leave nothing.
  fn candidates(&self) -> Vec<&'a Challenge> {
    let filtered: Vec<&Challenge> = self
      .remaining
      .iter()
      .copied()
      .filter(|c| c.parent_key().map_or(true, |k| !self.used_parents.contains(&k)))
      .collect();
    if filtered.is_empty() { self.remaining.clone() } else { filtered }
  }

  fn pick_from(&mut self, subset: Vec<&'a Challenge>) -> bool {
    if subset.is_empty() {
      return false;
    }
    let max = max_index(&subset);
    let weight = &self.weight;
    let chosen = weighted_select(
      &subset,
      |c| weight(*c) + bucket_for(c.practice_index(), max).range_bonus(),
      1,
      &mut *self.rng,
    );
    let Some(ch) = chosen.into_iter().next() else { return false };

    self.remaining.retain(|c| c.id != ch.id);
    if let Some(key) = ch.parent_key() {
      self.used_parents.insert(key);
    }
    self.picked.push(ch.clone());
    true
  }
}

/// Build a stratified batch of up to `count` challenges from `pool`.
///
/// `preferred` sets the topic-seeding order; without it every topic in the
/// pool is seeded in name order.
pub fn build_practice_set<R, W>(
  pool: &[Challenge],
  count: usize,
  preferred: Option<&[Topic]>,
  weight: W,
  rng: &mut R,
) -> Vec<Challenge>
where
  R: Rng + ?Sized,
  W: Fn(&Challenge) -> u64,
{
  let all: Vec<&Challenge> = pool.iter().collect();
  let overall_max = max_index(&all);
  let mut b = Builder { remaining: all, used_parents: HashSet::new(), picked: Vec::new(), weight, rng };

  if count >= 2 {
    let topics: Vec<Topic> = match preferred {
      Some(t) => t.to_vec(),
      None => pool.iter().map(|c| c.topic.clone()).collect::<BTreeSet<_>>().into_iter().collect(),
    };
    for topic in &topics {
      if b.picked.len() >= count {
        break;
      }
      let subset: Vec<&Challenge> = b.candidates().into_iter().filter(|c| &c.topic == topic).collect();
      b.pick_from(subset);
    }
  }

  if count >= 3 {
    for bucket in Bucket::ALL {
      if b.picked.len() >= count {
        break;
      }
      let subset: Vec<&Challenge> = b
        .candidates()
        .into_iter()
        .filter(|c| bucket_for(c.practice_index(), overall_max) == bucket)
        .collect();
      b.pick_from(subset);
    }
  }

  while b.picked.len() < count && !b.remaining.is_empty() {
    let subset = b.candidates();
    if !b.pick_from(subset) {
      break;
    }
  }

  debug!(target: "challenge", picked = b.picked.len(), count, "Practice set built");
  b.picked
}

/// Adaptive entry point: narrow the catalog to weak topics, then build.
/// Without history (or if narrowing leaves nothing) sample uniformly.
#[instrument(level = "info", skip(catalog, topic_stats, challenge_stats, rng), fields(pool = catalog.len()))]
pub fn pick_adaptive_practice_set<R: Rng + ?Sized>(
  catalog: &[Challenge],
  topic_stats: &TopicStats,
  challenge_stats: &ChallengeStats,
  count: usize,
  now: i64,
  rng: &mut R,
) -> Vec<Challenge> {
  let ranking = rank_topics(catalog, topic_stats);
  let preferred = preferred_topics(&ranking);
  let subset: Vec<Challenge> = catalog.iter().filter(|c| preferred.contains(&c.topic)).cloned().collect();

  if subset.is_empty() {
    info!(target: "challenge", count, "No topic history; sampling uniformly");
    return catalog.choose_multiple(rng, count).cloned().collect();
  }

  info!(
    target: "challenge",
    topics = ?preferred.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
    subset = subset.len(),
    "Adaptive focus"
  );
  build_practice_set(
    &subset,
    count,
    Some(&preferred),
    |c| challenge_weight(c, topic_stats, challenge_stats, now),
    rng,
  )
}
