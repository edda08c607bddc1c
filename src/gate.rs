//! Adaptive gate and constraint-enforcement policy.
//!
//! All of this state is owned by the caller and passed in explicitly.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::info;

use crate::domain::{Topic, TopicStats};

#[derive(Clone, Debug, Default)]
pub struct GateState {
  /// Score at which the gate last fired, per topic.
  pub last_triggered: BTreeMap<Topic, u32>,
  /// Explicit on/off toggles that override the mastery policy.
  pub enforcement_overrides: BTreeMap<Topic, bool>,
}

impl GateState {
  /// Starts from the configured overrides.
  pub fn from_policy(policy: &EnforcementPolicy) -> Self {
    Self { last_triggered: BTreeMap::new(), enforcement_overrides: policy.overrides.clone() }
  }

  pub fn toggle_enforcement(&mut self, topic: &Topic, policy: &EnforcementPolicy, stats: &TopicStats) -> bool {
    let now = !self.is_enforced(topic, policy, stats);
    self.enforcement_overrides.insert(topic.clone(), now);
    info!(target: "codedrill", %topic, enforced = now, "Constraint enforcement toggled");
    now
  }

  pub fn is_enforced(&self, topic: &Topic, policy: &EnforcementPolicy, stats: &TopicStats) -> bool {
    match self.enforcement_overrides.get(topic) {
      Some(v) => *v,
      None => policy.mastered(topic, stats),
    }
  }

  /// Topics enforced right now among `topics`.
  pub fn enforced_topics<'a>(
    &self,
    topics: impl IntoIterator<Item = &'a Topic>,
    policy: &EnforcementPolicy,
    stats: &TopicStats,
  ) -> BTreeSet<Topic> {
    topics
      .into_iter()
      .filter(|t| self.is_enforced(t, policy, stats))
      .cloned()
      .collect()
  }
}

/// Once a topic is mastered, heuristic warnings become blocking for it.
#[derive(Clone, Debug, Deserialize)]
pub struct EnforcementPolicy {
  #[serde(default = "default_mastery_threshold")]
  pub mastery_threshold: u64,
  /// Per-topic on/off switches that win over mastery.
  #[serde(default)]
  pub overrides: BTreeMap<Topic, bool>,
}

fn default_mastery_threshold() -> u64 { 3 }

impl Default for EnforcementPolicy {
  fn default() -> Self {
    Self { mastery_threshold: default_mastery_threshold(), overrides: BTreeMap::new() }
  }
}

impl EnforcementPolicy {
  pub fn mastered(&self, topic: &Topic, stats: &TopicStats) -> bool {
    stats.get(topic).map_or(false, |c| c.successes() >= self.mastery_threshold)
  }
}

/// Fire when `score` reaches `threshold` and beats the last firing for the topic.
pub fn should_trigger_adaptive_gate(state: &mut GateState, topic: &Topic, score: u32, threshold: u32) -> bool {
  let last = state.last_triggered.get(topic).copied().unwrap_or(0);
  if score >= threshold && score > last {
    state.last_triggered.insert(topic.clone(), score);
    true
  } else {
    false
  }
}
