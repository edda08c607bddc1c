//! codedrill · adaptive Go practice in the terminal
//!
//! - Picks a batch of challenges weighted toward weak topics
//! - Runs an interactive edit / check loop per challenge
//! - Records outcomes and events as JSON lines for the next run
//!
//! Important env variables:
//!   PRACTICE_CONFIG_PATH : path to TOML config (toggles, paths, curriculum, challenge bank)
//!   PRACTICE_COUNT       : challenges per batch (default 5)
//!   PRACTICE_STEP        : 1-indexed curriculum position (default 1)
//!   PRACTICE_WORKSPACE   : directory the learner edits in (default ./practice)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use chrono::Utc;
use rand::thread_rng;
use tracing::{info, instrument, warn};

use codedrill::catalog::Catalog;
use codedrill::config::load_config_from_env;
use codedrill::console::{Console, InlineLessons, StdConsole};
use codedrill::constraints::RuleConstraints;
use codedrill::domain::Challenge;
use codedrill::events::{extract_field, EventKind, EventLog, JsonlEventLog};
use codedrill::gate::GateState;
use codedrill::practice::{build_practice_set, pick_adaptive_practice_set};
use codedrill::progress::eligible_challenges;
use codedrill::sandbox::ProcessSandbox;
use codedrill::session::{Collaborators, PracticeSession};
use codedrill::stats::{top_failing_challenges, weakness_report, JsonlStatsStore, StatsSnapshot, StatsStore};
use codedrill::telemetry;
use codedrill::workspace::{FsWorkspace, WorkspaceLease};

#[instrument(level = "info", skip_all)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env();
  let catalog = Catalog::load(&cfg);

  let mut stats = JsonlStatsStore::new(&cfg.stats_path);
  let snapshot = stats.snapshot().unwrap_or_else(|e| {
    warn!(target: "codedrill", error = %e, "Stats unreadable; starting without history");
    StatsSnapshot::default()
  });

  // Progress gating first, then adaptive (or plain stratified) selection.
  let pool: Vec<Challenge> = eligible_challenges(catalog.challenges(), catalog.curriculum(), cfg.progress_step, &cfg.filter)
    .into_iter()
    .cloned()
    .collect();

  let mut console = StdConsole;
  if pool.is_empty() {
    console.print("No challenges are unlocked yet. Advance PRACTICE_STEP or set filter.include_all.");
    return Ok(());
  }

  let mut rng = thread_rng();
  let batch = if cfg.adaptive {
    let now = Utc::now().timestamp();
    pick_adaptive_practice_set(&pool, &snapshot.topics, &snapshot.challenges, cfg.count, now, &mut rng)
  } else {
    build_practice_set(&pool, cfg.count, None, |_| 1, &mut rng)
  };
  info!(target: "codedrill", pool = pool.len(), batch = batch.len(), adaptive = cfg.adaptive, "Practice batch ready");

  let mut gate = GateState::from_policy(&cfg.enforcement);
  let enforced = gate.enforced_topics(catalog.topics(), &cfg.enforcement, &snapshot.topics);
  let rules = RuleConstraints::new(catalog.known_concepts(cfg.progress_step, &cfg.known_concepts), enforced);
  let sandbox = ProcessSandbox::new(cfg.runner.clone());
  let mut lease = WorkspaceLease::new(FsWorkspace::new(&cfg.workspace_dir, &cfg.fixtures_dir));
  let mut events = JsonlEventLog::new(&cfg.events_path);
  let mut lessons = InlineLessons;

  let mut session = PracticeSession::new(
    cfg.session.clone(),
    Collaborators {
      console: &mut console,
      lessons: &mut lessons,
      constraints: &rules,
      sandbox: &sandbox,
      workspace: &mut lease.workspace,
      stats: &mut stats,
      events: &mut events,
      gate: &mut gate,
    },
  );
  let report = session.run_batch(&batch).await;
  let session_id = session.session_id.clone();
  drop(session);

  if report.interrupted {
    return Ok(());
  }

  let attempts = events
    .read_all()
    .map(|all| {
      let mine: Vec<_> = all.into_iter().filter(|r| r.session.as_deref() == Some(session_id.as_str())).collect();
      extract_field(&mine, EventKind::ChallengeAttempt, "outcome").len()
    })
    .unwrap_or(0);
  console.print(&format!("Checks run this session: {attempts}"));

  match stats.snapshot() {
    Ok(after) => {
      let weakest: Vec<String> = weakness_report(&after)
        .into_iter()
        .filter(|l| l.score > 1)
        .take(3)
        .map(|l| format!("{} ({})", l.topic, l.score))
        .collect();
      if !weakest.is_empty() {
        console.print(&format!("Weakest topics: {}", weakest.join(", ")));
      }
      for (id, counts) in top_failing_challenges(&after, 3) {
        let topic = catalog.topic_of(&id).map(|t| t.as_str()).unwrap_or("?");
        console.print(&format!("  {} [{topic}]: {} failed check(s)", catalog.title_of(&id), counts.failures()));
      }
    }
    Err(e) => warn!(target: "codedrill", error = %e, "Could not summarise stats"),
  }
  Ok(())
}
