//! Progress-gated eligibility for free practice.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{Challenge, CurriculumStep, Layer, Tier, Topic};

/// Optional narrowing applied on top of progress gating.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PracticeFilter {
  #[serde(default)] pub topic: Option<Topic>,
  #[serde(default)] pub tier: Option<Tier>,
  #[serde(default)] pub layer: Option<Layer>,
  #[serde(default)] pub range: Option<RangeInclusive<u32>>,
  /// Skip progress gating entirely.
  #[serde(default)] pub include_all: bool,
  /// `true` keeps only `bridge:` challenges, `false` drops them.
  #[serde(default)] pub bridge_only: bool,
}

/// What the learner has covered so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
  /// Highest challenge index reached per layer in completed steps.
  pub max_by_layer: BTreeMap<Layer, u32>,
  /// Layers open for extra-tier practice.
  pub extra_layers: BTreeSet<Layer>,
  /// Curriculum finished: extras are unbounded everywhere.
  pub finished: bool,
}

impl Coverage {
  /// `progress_step` is 1-indexed; the steps before it count as completed.
  pub fn from_progress(curriculum: &[CurriculumStep], progress_step: usize) -> Self {
    let completed = progress_step.saturating_sub(1).min(curriculum.len());
    let mut cov = Coverage::default();

    for step in &curriculum[..completed] {
      if let CurriculumStep::Challenge { layer, index } = step {
        let max = cov.max_by_layer.entry(*layer).or_insert(0);
        *max = (*max).max(*index);
        cov.extra_layers.insert(*layer);
      }
    }

    if progress_step > 1 {
      if let Some(CurriculumStep::Challenge { layer, .. }) = curriculum.get(progress_step - 1) {
        cov.extra_layers.insert(*layer);
      }
    }

    if progress_step > curriculum.len() {
      cov.finished = true;
      cov.extra_layers.extend(Layer::ALL);
    }
    cov
  }

  pub fn covered(&self, layer: Layer) -> u32 {
    self.max_by_layer.get(&layer).copied().unwrap_or(0)
  }

  fn admits(&self, ch: &Challenge, filter: &PracticeFilter) -> bool {
    let covered = self.covered(ch.layer);
    match ch.tier {
      Tier::Core => {
        ch.practice_index() <= covered
          && filter.range.as_ref().map_or(true, |r| r.contains(&ch.practice_index()))
      }
      Tier::Extra => {
        if !self.extra_layers.contains(&ch.layer) {
          return false;
        }
        if !self.finished && ch.practice_index() > covered {
          return false;
        }
        match (&filter.range, filter.layer) {
          (Some(_), Some(layer)) => ch.layer == layer,
          _ => true,
        }
      }
    }
  }
}

fn passes_static_filters(ch: &Challenge, filter: &PracticeFilter) -> bool {
  ch.is_bridge() == filter.bridge_only
    && filter.topic.as_ref().map_or(true, |t| &ch.topic == t)
    && filter.tier.map_or(true, |t| ch.tier == t)
    && filter.layer.map_or(true, |l| ch.layer == l)
}

/// Catalog entries currently unlocked for free practice.
pub fn eligible_challenges<'a>(
  catalog: &'a [Challenge],
  curriculum: &[CurriculumStep],
  progress_step: usize,
  filter: &PracticeFilter,
) -> Vec<&'a Challenge> {
  let coverage = Coverage::from_progress(curriculum, progress_step);
  let out: Vec<&Challenge> = catalog
    .iter()
    .filter(|c| passes_static_filters(c, filter))
    .filter(|c| filter.include_all || coverage.admits(c, filter))
    .collect();
  debug!(
    target: "challenge",
    progress_step,
    finished = coverage.finished,
    eligible = out.len(),
    "Progress filter applied"
  );
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::challenge;

  fn curriculum() -> Vec<CurriculumStep> {
    vec![
      CurriculumStep::Lesson { id: "intro".into() },
      CurriculumStep::Challenge { layer: Layer::Core, index: 1 },
      CurriculumStep::Challenge { layer: Layer::Core, index: 2 },
      CurriculumStep::Lesson { id: "maps".into() },
      CurriculumStep::Challenge { layer: Layer::Mantle, index: 1 },
    ]
  }

  fn catalog() -> Vec<Challenge> {
    vec![
      challenge("c0", "basics", Tier::Core, Layer::Core, 0, None),
      challenge("c1", "basics", Tier::Core, Layer::Core, 1, None),
      challenge("c2", "loops", Tier::Core, Layer::Core, 2, None),
      challenge("c1x", "basics", Tier::Extra, Layer::Core, 2, Some(1)),
      challenge("c2x", "loops", Tier::Extra, Layer::Core, 2, Some(2)),
      challenge("m1", "maps", Tier::Core, Layer::Mantle, 1, None),
      challenge("m1x", "maps", Tier::Extra, Layer::Mantle, 1, Some(1)),
      challenge("k1x", "io", Tier::Extra, Layer::Crust, 1, Some(1)),
      challenge("bridge:core-mantle", "maps", Tier::Core, Layer::Mantle, 0, None),
    ]
  }

  fn ids(v: &[&Challenge]) -> Vec<String> {
    v.iter().map(|c| c.id.clone()).collect()
  }

  #[test]
  fn first_step_unlocks_nothing_above_zero() {
    let cat = catalog();
    let out = eligible_challenges(&cat, &curriculum(), 1, &PracticeFilter::default());
    assert!(out.iter().all(|c| c.practice_index() == 0), "{:?}", ids(&out));
    assert_eq!(ids(&out), vec!["c0"]);
  }

  #[test]
  fn completed_steps_raise_per_layer_maximum() {
    let cat = catalog();
    // steps 1..=3 completed: core max = 2; step 4 is a lesson
    let out = eligible_challenges(&cat, &curriculum(), 4, &PracticeFilter::default());
    assert_eq!(ids(&out), vec!["c0", "c1", "c2", "c1x", "c2x"]);
  }

  #[test]
  fn current_challenge_step_opens_its_layer_for_extras() {
    let cat = catalog();
    // completed: lesson, core 1; current: core 2
    let cov = Coverage::from_progress(&curriculum(), 3);
    assert_eq!(cov.covered(Layer::Core), 1);
    assert!(cov.extra_layers.contains(&Layer::Core));
    let out = eligible_challenges(&cat, &curriculum(), 3, &PracticeFilter::default());
    assert_eq!(ids(&out), vec!["c0", "c1", "c1x"]);
  }

  #[test]
  fn entering_a_new_layer_opens_it_for_extras() {
    let cat = vec![
      challenge("m0x", "maps", Tier::Extra, Layer::Mantle, 0, Some(0)),
      challenge("k0x", "io", Tier::Extra, Layer::Crust, 0, Some(0)),
    ];
    // completed: steps 1..=4 (no mantle work yet); current: mantle 1
    let cov = Coverage::from_progress(&curriculum(), 5);
    assert_eq!(cov.covered(Layer::Mantle), 0);
    assert!(cov.extra_layers.contains(&Layer::Mantle));
    assert!(!cov.finished);

    let out = eligible_challenges(&cat, &curriculum(), 5, &PracticeFilter::default());
    assert_eq!(ids(&out), vec!["m0x"]);

    // one step earlier the mantle layer is still closed
    let out = eligible_challenges(&cat, &curriculum(), 4, &PracticeFilter::default());
    assert!(out.is_empty(), "{:?}", ids(&out));
  }

  #[test]
  fn finishing_opens_every_layer_for_extras() {
    let cat = catalog();
    let cov = Coverage::from_progress(&curriculum(), 99);
    assert!(cov.finished);
    assert_eq!(cov.extra_layers.len(), 3);

    let filter = PracticeFilter { tier: Some(Tier::Extra), ..Default::default() };
    let out = eligible_challenges(&cat, &curriculum(), 99, &filter);
    assert_eq!(ids(&out), vec!["c1x", "c2x", "m1x", "k1x"]);
  }

  #[test]
  fn include_all_bypasses_gating_but_keeps_filters() {
    let cat = catalog();
    let filter = PracticeFilter { include_all: true, topic: Some(Topic::new("maps")), ..Default::default() };
    let out = eligible_challenges(&cat, &curriculum(), 1, &filter);
    assert_eq!(ids(&out), vec!["m1", "m1x"]);
  }

  #[test]
  fn bridge_flag_selects_disjoint_category() {
    let cat = catalog();
    let filter = PracticeFilter { include_all: true, bridge_only: true, ..Default::default() };
    let out = eligible_challenges(&cat, &curriculum(), 1, &filter);
    assert_eq!(ids(&out), vec!["bridge:core-mantle"]);
  }

  #[test]
  fn range_filter_applies_to_core_tier() {
    let cat = catalog();
    let filter = PracticeFilter { range: Some(2..=2), ..Default::default() };
    let out = eligible_challenges(&cat, &curriculum(), 99, &filter);
    // core tier limited to index 2; extras only gated by parent
    assert_eq!(ids(&out), vec!["c2", "c1x", "c2x", "m1x", "k1x"]);

    let filter = PracticeFilter { range: Some(1..=2), layer: Some(Layer::Mantle), ..Default::default() };
    let out = eligible_challenges(&cat, &curriculum(), 99, &filter);
    assert_eq!(ids(&out), vec!["m1", "m1x"]);
  }
}
