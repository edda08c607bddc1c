//! Challenge catalog: config bank plus built-in seeds, indexed by id and topic.
//!
//! Load order matters. `layer_index` is the 1-based position of a core
//! challenge within its layer, in load order; an extra inherits the index of
//! the last core challenge before it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::PracticeConfig;
use crate::domain::{Challenge, CurriculumStep, Layer, Tier, Topic};
use crate::progress::Coverage;
use crate::seeds::{seed_challenges, seed_curriculum};

#[derive(Clone, Debug)]
pub struct Catalog {
  challenges: Vec<Challenge>,
  by_id: HashMap<String, usize>,
  by_topic: BTreeMap<Topic, Vec<usize>>,
  curriculum: Vec<CurriculumStep>,
}

impl Catalog {
  /// Bank from config first, then seeds (never overwriting bank ids).
  #[instrument(level = "info", skip_all)]
  pub fn load(cfg: &PracticeConfig) -> Self {
    let curriculum = if cfg.curriculum.is_empty() { seed_curriculum() } else { cfg.curriculum.clone() };
    Self::from_parts(cfg.challenges.clone(), seed_challenges(), curriculum)
  }

  pub fn from_parts(bank: Vec<Challenge>, seeds: Vec<Challenge>, curriculum: Vec<CurriculumStep>) -> Self {
    let mut ordered: Vec<Challenge> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for mut ch in bank.into_iter().chain(seeds) {
      if ch.id.trim().is_empty() {
        ch.id = Uuid::new_v4().to_string();
      }
      if !seen.insert(ch.id.clone()) {
        warn!(target: "challenge", id = %ch.id, "Duplicate challenge id; keeping the first");
        continue;
      }
      if ch.filename.trim().is_empty() {
        ch.filename = default_filename(&ch.id);
      }
      ordered.push(ch);
    }

    let mut cores: BTreeMap<Layer, u32> = BTreeMap::new();
    let mut challenges = Vec::with_capacity(ordered.len());
    for mut ch in ordered {
      let count = cores.entry(ch.layer).or_insert(0);
      match ch.tier {
        Tier::Core => {
          *count += 1;
          ch.layer_index = *count;
          if ch.extra_parent.take().is_some() {
            warn!(target: "challenge", id = %ch.id, "Core challenge declares a parent; ignored");
          }
        }
        Tier::Extra => {
          ch.layer_index = *count;
          if let Some(parent) = ch.extra_parent {
            if parent == 0 || parent > ch.layer_index {
              warn!(
                target: "challenge",
                id = %ch.id,
                layer = %ch.layer,
                parent,
                available = ch.layer_index,
                "Extra challenge points past its layer's core challenges; dropped"
              );
              continue;
            }
          }
        }
      }
      challenges.push(ch);
    }

    let mut by_id = HashMap::new();
    let mut by_topic: BTreeMap<Topic, Vec<usize>> = BTreeMap::new();
    for (i, ch) in challenges.iter().enumerate() {
      by_id.insert(ch.id.clone(), i);
      by_topic.entry(ch.topic.clone()).or_default().push(i);
    }

    let catalog = Self { challenges, by_id, by_topic, curriculum };
    catalog.log_inventory();
    catalog
  }

  fn log_inventory(&self) {
    let mut per_layer: BTreeMap<Layer, (usize, usize, usize)> = BTreeMap::new();
    for ch in &self.challenges {
      let entry = per_layer.entry(ch.layer).or_default();
      match ch.tier {
        Tier::Core => entry.0 += 1,
        Tier::Extra => entry.1 += 1,
      }
      if ch.is_bridge() {
        entry.2 += 1;
      }
    }
    for (layer, (core, extra, bridge)) in per_layer {
      info!(target: "challenge", %layer, core, extra, bridge, "Startup challenge inventory");
    }
  }

  pub fn challenges(&self) -> &[Challenge] { &self.challenges }

  pub fn curriculum(&self) -> &[CurriculumStep] { &self.curriculum }

  pub fn len(&self) -> usize { self.challenges.len() }

  pub fn is_empty(&self) -> bool { self.challenges.is_empty() }

  pub fn get(&self, id: &str) -> Option<&Challenge> {
    self.by_id.get(id).map(|&i| &self.challenges[i])
  }

  /// Display title for reports; unknown ids echo back.
  pub fn title_of<'s>(&'s self, id: &'s str) -> &'s str {
    self.get(id).map_or(id, |c| c.display_title())
  }

  pub fn topic_of(&self, id: &str) -> Option<&Topic> {
    self.get(id).map(|c| &c.topic)
  }

  pub fn by_topic(&self, topic: &Topic) -> Vec<&Challenge> {
    self
      .by_topic
      .get(topic)
      .map(|ids| ids.iter().map(|&i| &self.challenges[i]).collect())
      .unwrap_or_default()
  }

  pub fn topics(&self) -> impl Iterator<Item = &Topic> {
    self.by_topic.keys()
  }

  /// Topics of every core challenge the learner has already passed through,
  /// plus `extra`.
  pub fn known_concepts(&self, progress_step: usize, extra: &[String]) -> BTreeSet<String> {
    let coverage = Coverage::from_progress(&self.curriculum, progress_step);
    self
      .challenges
      .iter()
      .filter(|c| c.tier == Tier::Core && c.layer_index <= coverage.covered(c.layer))
      .map(|c| c.topic.as_str().to_string())
      .chain(extra.iter().cloned())
      .collect()
  }
}

fn default_filename(id: &str) -> String {
  let stem: String = id
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
    .collect();
  format!("{stem}.go")
}
