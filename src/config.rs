//! Loading practice configuration (session toggles, paths, runner, curriculum
//! and an optional challenge bank) from TOML, plus environment overrides.
//!
//! See `PracticeConfig` for the expected schema. Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{Challenge, CurriculumStep};
use crate::gate::EnforcementPolicy;
use crate::progress::PracticeFilter;
use crate::session::SessionOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
  /// Challenges per batch.
  pub count: usize,
  /// 1-indexed position in the curriculum; earlier steps count as done.
  pub progress_step: usize,
  /// Pick by weakness (true) or from the progress-gated pool (false).
  pub adaptive: bool,
  pub workspace_dir: PathBuf,
  pub fixtures_dir: PathBuf,
  pub stats_path: PathBuf,
  pub events_path: PathBuf,
  /// Runner argv; `{file}` and `{workdir}` are substituted per run.
  pub runner: Vec<String>,
  /// Concepts the learner already knows besides covered topics.
  pub known_concepts: Vec<String>,
  pub session: SessionOptions,
  pub enforcement: EnforcementPolicy,
  pub filter: PracticeFilter,
  pub curriculum: Vec<CurriculumStep>,
  pub challenges: Vec<Challenge>,
}

impl Default for PracticeConfig {
  fn default() -> Self {
    Self {
      count: 5,
      progress_step: 1,
      adaptive: true,
      workspace_dir: PathBuf::from("practice"),
      fixtures_dir: PathBuf::from("fixtures"),
      stats_path: PathBuf::from(".codedrill/stats.jsonl"),
      events_path: PathBuf::from(".codedrill/events.jsonl"),
      runner: vec!["go".into(), "run".into(), "{file}".into()],
      known_concepts: Vec::new(),
      session: SessionOptions::default(),
      enforcement: EnforcementPolicy::default(),
      filter: PracticeFilter::default(),
      curriculum: Vec::new(),
      challenges: Vec::new(),
    }
  }
}

impl PracticeConfig {
  /// Apply `PRACTICE_COUNT`, `PRACTICE_WORKSPACE` and `PRACTICE_STEP`.
  /// Unparseable numbers are ignored with a warning.
  pub fn apply_overrides<F>(&mut self, var: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(v) = var("PRACTICE_COUNT") {
      match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => self.count = n,
        _ => warn!(target: "codedrill", value = %v, "Ignoring invalid PRACTICE_COUNT"),
      }
    }
    if let Some(v) = var("PRACTICE_STEP") {
      match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => self.progress_step = n,
        _ => warn!(target: "codedrill", value = %v, "Ignoring invalid PRACTICE_STEP"),
      }
    }
    if let Some(v) = var("PRACTICE_WORKSPACE").filter(|v| !v.trim().is_empty()) {
      self.workspace_dir = PathBuf::from(v);
    }
  }
}

pub fn load_config(path: &Path) -> Result<PracticeConfig, ConfigError> {
  let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
  toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Load from `PRACTICE_CONFIG_PATH` (defaults when unset or broken), then
/// apply environment overrides.
pub fn load_config_from_env() -> PracticeConfig {
  let mut cfg = match std::env::var("PRACTICE_CONFIG_PATH") {
    Ok(path) => match load_config(Path::new(&path)) {
      Ok(cfg) => {
        info!(target: "codedrill", %path, bank = cfg.challenges.len(), "Loaded practice config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "codedrill", %path, error = %e, "Config unusable; falling back to defaults");
        PracticeConfig::default()
      }
    },
    Err(_) => PracticeConfig::default(),
  };
  cfg.apply_overrides(|k| std::env::var(k).ok());
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Layer, Tier};
  use std::collections::HashMap;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg: PracticeConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.count, 5);
    assert_eq!(cfg.runner, vec!["go", "run", "{file}"]);
    assert!(cfg.session.track_assisted);
    assert_eq!(cfg.enforcement.mastery_threshold, 3);
  }

  #[test]
  fn parses_bank_curriculum_and_nested_tables() {
    let text = r#"
      count = 3
      runner = ["python3", "{file}"]

      [session]
      confirm_solution = false
      gate_threshold = 4

      [filter]
      layer = "mantle"
      range = { start = 1, end = 2 }

      [[curriculum]]
      kind = "challenge"
      layer = "core"
      index = 1

      [[curriculum]]
      kind = "lesson"
      id = "intro"

      [[challenges]]
      id = "hello"
      topic = "basics"
      expected_output = ["hello"]

      [[challenges]]
      id = "hello-x"
      topic = "basics"
      tier = "extra"
      extra_parent = 1
    "#;
    let cfg: PracticeConfig = toml::from_str(text).unwrap();
    assert_eq!(cfg.count, 3);
    assert!(!cfg.session.confirm_solution);
    assert!(cfg.session.track_assisted);
    assert_eq!(cfg.session.gate_threshold, 4);
    assert_eq!(cfg.filter.layer, Some(Layer::Mantle));
    assert_eq!(cfg.filter.range, Some(1..=2));
    assert_eq!(cfg.curriculum[1], CurriculumStep::Lesson { id: "intro".into() });
    assert_eq!(cfg.challenges[1].tier, Tier::Extra);
    assert_eq!(cfg.challenges[1].extra_parent, Some(1));
    assert!(cfg.challenges[0].filename.is_empty());
  }

  #[test]
  fn enforcement_overrides_win_over_mastery() {
    use crate::domain::{OutcomeCounts, Topic, TopicStats};
    use crate::gate::GateState;

    let text = r#"
      [enforcement]
      mastery_threshold = 2

      [enforcement.overrides]
      loops = true
      maps = false
    "#;
    let cfg: PracticeConfig = toml::from_str(text).unwrap();
    assert_eq!(cfg.enforcement.overrides.get(&Topic::new("maps")), Some(&false));

    let (loops, maps, io) = (Topic::new("loops"), Topic::new("maps"), Topic::new("io"));
    let mut stats = TopicStats::new();
    stats.insert(maps.clone(), OutcomeCounts { pass: 5, ..Default::default() });
    stats.insert(io.clone(), OutcomeCounts { pass: 2, ..Default::default() });

    let plain = GateState::default().enforced_topics([&loops, &maps, &io], &cfg.enforcement, &stats);
    assert_eq!(plain.into_iter().collect::<Vec<_>>(), vec![io.clone(), maps.clone()]);

    let seeded = GateState::from_policy(&cfg.enforcement).enforced_topics([&loops, &maps, &io], &cfg.enforcement, &stats);
    assert_eq!(seeded.into_iter().collect::<Vec<_>>(), vec![io, loops]);
  }

  #[test]
  fn env_overrides_ignore_garbage() {
    let vars: HashMap<&str, &str> =
      [("PRACTICE_COUNT", "8"), ("PRACTICE_STEP", "zero"), ("PRACTICE_WORKSPACE", "/tmp/ws")].into();
    let mut cfg = PracticeConfig::default();
    cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.count, 8);
    assert_eq!(cfg.progress_step, 1);
    assert_eq!(cfg.workspace_dir, PathBuf::from("/tmp/ws"));
  }

  #[test]
  fn load_reports_read_and_parse_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.toml");
    assert!(matches!(load_config(&missing), Err(ConfigError::Read { .. })));

    let broken = tmp.path().join("broken.toml");
    std::fs::write(&broken, "count = [").unwrap();
    assert!(matches!(load_config(&broken), Err(ConfigError::Parse { .. })));
  }
}
