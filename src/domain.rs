//! Domain models: challenges, tiers/layers, outcomes and curriculum steps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking the disjoint "bridge" category of challenges.
pub const BRIDGE_PREFIX: &str = "bridge:";

/// Topic tag of a challenge (e.g. "loops", "maps").
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(pub String);

impl Topic {
  pub fn new(name: impl Into<String>) -> Self { Topic(name.into()) }
  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Curriculum-required vs optional variant of a core challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  Core,
  Extra,
}
impl Default for Tier {
  fn default() -> Self { Tier::Core }
}

/// Coarse curriculum band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
  Core,
  Mantle,
  Crust,
}

impl Layer {
  pub const ALL: [Layer; 3] = [Layer::Core, Layer::Mantle, Layer::Crust];

  pub fn as_str(&self) -> &'static str {
    match self {
      Layer::Core => "core",
      Layer::Mantle => "mantle",
      Layer::Crust => "crust",
    }
  }
}
impl Default for Layer {
  fn default() -> Self { Layer::Core }
}

impl fmt::Display for Layer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Immutable exercise definition, owned by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  /// Empty in a bank entry means "assign one on load".
  #[serde(default)] pub id: String,
  #[serde(default)] pub title: String,
  pub topic: Topic,
  #[serde(default)] pub tier: Tier,
  #[serde(default)] pub layer: Layer,
  /// Ordinal within the layer; assigned by the catalog on load.
  #[serde(default)] pub layer_index: u32,
  #[serde(default)] pub extra_parent: Option<u32>,

  #[serde(default)] pub hints: Vec<String>,
  #[serde(default)] pub cheatsheet: String,
  #[serde(default)] pub solution: String,
  #[serde(default)] pub lesson: String,
  #[serde(default)] pub expected_output: Vec<String>,
  #[serde(default)] pub manual_check: bool,
  #[serde(default)] pub filename: String,

  // Execution inputs
  #[serde(default)] pub template: String,
  #[serde(default)] pub args: Vec<String>,
  #[serde(default)] pub stdin: Option<String>,
  #[serde(default)] pub fixtures: Vec<String>,

  // Constraint inputs
  #[serde(default)] pub prerequisites: Vec<String>,
  #[serde(default)] pub forbidden: Vec<String>,
  #[serde(default)] pub required: Vec<String>,
}

impl Challenge {
  /// Effective difficulty position: an extra variant sits at its parent's index.
  pub fn practice_index(&self) -> u32 {
    self.extra_parent.unwrap_or(self.layer_index)
  }

  /// Dedup key shared by all extra variants of the same core challenge.
  pub fn parent_key(&self) -> Option<String> {
    match (self.tier, self.extra_parent) {
      (Tier::Extra, Some(parent)) => Some(format!("{}:{}", self.layer, parent)),
      _ => None,
    }
  }

  pub fn is_bridge(&self) -> bool { self.id.starts_with(BRIDGE_PREFIX) }

  pub fn display_title(&self) -> &str {
    if self.title.is_empty() { &self.id } else { &self.title }
  }
}

/// Result of one attempt as recorded in the stats store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Pass,
  PassAssisted,
  Fail,
  CompileFail,
  ManualPass,
}

impl Outcome {
  pub const ALL: [Outcome; 5] = [
    Outcome::Pass,
    Outcome::PassAssisted,
    Outcome::Fail,
    Outcome::CompileFail,
    Outcome::ManualPass,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Outcome::Pass => "pass",
      Outcome::PassAssisted => "pass_assisted",
      Outcome::Fail => "fail",
      Outcome::CompileFail => "compile_fail",
      Outcome::ManualPass => "manual_pass",
    }
  }

  pub fn is_success(&self) -> bool {
    match self {
      Outcome::Pass | Outcome::PassAssisted | Outcome::ManualPass => true,
      Outcome::Fail | Outcome::CompileFail => false,
    }
  }
}

/// Per-outcome counters. Only ever incremented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
  #[serde(default)] pub pass: u64,
  #[serde(default)] pub pass_assisted: u64,
  #[serde(default)] pub fail: u64,
  #[serde(default)] pub compile_fail: u64,
  #[serde(default)] pub manual_pass: u64,
}

impl OutcomeCounts {
  pub fn record(&mut self, outcome: Outcome) {
    match outcome {
      Outcome::Pass => self.pass += 1,
      Outcome::PassAssisted => self.pass_assisted += 1,
      Outcome::Fail => self.fail += 1,
      Outcome::CompileFail => self.compile_fail += 1,
      Outcome::ManualPass => self.manual_pass += 1,
    }
  }

  pub fn get(&self, outcome: Outcome) -> u64 {
    match outcome {
      Outcome::Pass => self.pass,
      Outcome::PassAssisted => self.pass_assisted,
      Outcome::Fail => self.fail,
      Outcome::CompileFail => self.compile_fail,
      Outcome::ManualPass => self.manual_pass,
    }
  }

  pub fn failures(&self) -> u64 { self.fail + self.compile_fail }
  pub fn successes(&self) -> u64 { self.pass + self.manual_pass }
}

/// Per-challenge counters plus when the challenge was last attempted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
  pub counts: OutcomeCounts,
  /// Unix seconds.
  pub last_attempt: Option<i64>,
}

pub type TopicStats = BTreeMap<Topic, OutcomeCounts>;
pub type ChallengeStats = BTreeMap<String, ChallengeRecord>;

/// One entry of the linear curriculum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurriculumStep {
  Challenge { layer: Layer, index: u32 },
  Lesson { id: String },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recording_pass_touches_only_the_pass_counter() {
    let mut counts = OutcomeCounts { fail: 2, compile_fail: 1, ..Default::default() };
    let before = counts;
    counts.record(Outcome::Pass);
    assert_eq!(counts.pass, before.pass + 1);
    for o in Outcome::ALL.iter().filter(|o| **o != Outcome::Pass) {
      assert_eq!(counts.get(*o), before.get(*o), "{} changed", o.as_str());
    }
  }

  #[test]
  fn extra_variants_inherit_parent_position() {
    let ch = Challenge {
      id: "loops-extra-1".into(),
      title: String::new(),
      topic: Topic::new("loops"),
      tier: Tier::Extra,
      layer: Layer::Mantle,
      layer_index: 4,
      extra_parent: Some(2),
      hints: vec![],
      cheatsheet: String::new(),
      solution: String::new(),
      lesson: String::new(),
      expected_output: vec![],
      manual_check: false,
      filename: "main.go".into(),
      template: String::new(),
      args: vec![],
      stdin: None,
      fixtures: vec![],
      prerequisites: vec![],
      forbidden: vec![],
      required: vec![],
    };
    assert_eq!(ch.practice_index(), 2);
    assert_eq!(ch.parent_key().as_deref(), Some("mantle:2"));
    assert!(!ch.is_bridge());
  }
}
