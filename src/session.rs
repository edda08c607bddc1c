//! Interactive practice session: one command loop per challenge.
//!
//! States per challenge:
//!   Editing  -> learner inspects hints / cheatsheet / lesson / solution
//!   Checking -> gate, constraints, run, compare output
//!   Complete -> success or manual attestation; the batch moves on
//!
//! Every collaborator failure is turned into a message and a state
//! transition here; nothing escapes to the caller.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::console::{Console, LessonViewer};
use crate::constraints::ConstraintIndex;
use crate::domain::{Challenge, Outcome};
use crate::events::{EventKind, EventLog, EventRecord};
use crate::gate::{should_trigger_adaptive_gate, GateState};
use crate::sandbox::{RunRequest, Sandbox};
use crate::scoring::topic_score;
use crate::stats::{OutcomeRecord, StatsStore};
use crate::util::normalize;
use crate::validate::{mismatch_diagnostics, validate_output};
use crate::workspace::Workspace;

const COMMAND_HELP: &str = "Enter = check, h = hint, c = cheatsheet, l = lesson, s = solution";

/// Static toggles for one session.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
  /// Ask before every check.
  pub confirm_check: bool,
  /// Ask before the first solution reveal.
  pub confirm_solution: bool,
  /// Mark attempts as assisted once the solution was shown.
  pub track_assisted: bool,
  pub constraint_profiles: bool,
  pub heuristics: bool,
  /// Topic score at which the focus notice fires; 0 disables it.
  pub gate_threshold: u32,
}

impl Default for SessionOptions {
  fn default() -> Self {
    Self {
      confirm_check: false,
      confirm_solution: true,
      track_assisted: true,
      constraint_profiles: true,
      heuristics: true,
      gate_threshold: 3,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  Check,
  Hint,
  Cheatsheet,
  Lesson,
  Solution,
  Unknown(String),
}

impl Command {
  pub fn parse(input: &str) -> Self {
    let cmd = input.trim().to_lowercase();
    match cmd.as_str() {
      "" => Command::Check,
      "h" => Command::Hint,
      "c" => Command::Cheatsheet,
      "l" => Command::Lesson,
      "s" => Command::Solution,
      _ => Command::Unknown(cmd),
    }
  }
}

/// Transient state of one challenge attempt.
#[derive(Clone, Debug, Default)]
pub struct ChallengeState {
  pub hint_index: usize,
  solution_viewed: bool,
  /// Source as of the last failed run.
  pub last_source: Option<String>,
}

impl ChallengeState {
  pub fn solution_viewed(&self) -> bool { self.solution_viewed }

  /// Sticky; returns true only on the first call.
  fn mark_solution_viewed(&mut self) -> bool {
    !std::mem::replace(&mut self.solution_viewed, true)
  }

  /// Whitespace-insensitive match against the last failed run's source.
  fn unchanged_since_failure(&self, source: Option<&str>) -> bool {
    match (self.last_source.as_deref(), source) {
      (Some(prev), Some(now)) => normalize(prev) == normalize(now),
      _ => false,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeEnd {
  Complete(Outcome),
  /// Input ended before completion; nothing more is recorded.
  Interrupted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
  pub completed: Vec<(String, Outcome)>,
  pub interrupted: bool,
}

/// Everything a session talks to.
pub struct Collaborators<'a, S: Sandbox> {
  pub console: &'a mut dyn Console,
  pub lessons: &'a mut dyn LessonViewer,
  pub constraints: &'a dyn ConstraintIndex,
  pub sandbox: &'a S,
  pub workspace: &'a mut dyn Workspace,
  pub stats: &'a mut dyn StatsStore,
  pub events: &'a mut dyn EventLog,
  pub gate: &'a mut GateState,
}

pub struct PracticeSession<'a, S: Sandbox> {
  pub options: SessionOptions,
  pub session_id: String,
  io: Collaborators<'a, S>,
  /// Files to remove when the batch ends.
  cleanup: Vec<PathBuf>,
}

impl<'a, S: Sandbox> PracticeSession<'a, S> {
  pub fn new(options: SessionOptions, io: Collaborators<'a, S>) -> Self {
    Self { options, session_id: uuid::Uuid::new_v4().to_string(), io, cleanup: Vec::new() }
  }

  fn say(&mut self, text: &str) {
    self.io.console.print(text);
  }

  fn log(&mut self, record: EventRecord) {
    let record = record.with_session(&self.session_id);
    if let Err(e) = self.io.events.append(record) {
      warn!(target: "codedrill", error = %e, "Failed to append event");
    }
  }

  fn record(&mut self, ch: &Challenge, outcome: Outcome) {
    let rec = OutcomeRecord {
      topic: ch.topic.clone(),
      challenge: ch.id.clone(),
      outcome,
      at: Utc::now().timestamp(),
    };
    if let Err(e) = self.io.stats.record(rec) {
      warn!(target: "codedrill", id = %ch.id, outcome = outcome.as_str(), error = %e, "Failed to record outcome");
    }
    info!(target: "challenge", id = %ch.id, topic = %ch.topic, outcome = outcome.as_str(), "Outcome recorded");
  }

  fn log_attempt(&mut self, ch: &Challenge, outcome: Outcome, elapsed_secs: u64, exit_code: i32) {
    self.log(
      EventRecord::new(EventKind::ChallengeAttempt)
        .with_str("challenge", ch.id.clone())
        .with_str("topic", ch.topic.as_str())
        .with_str("outcome", outcome.as_str())
        .with_int("elapsed_secs", elapsed_secs as i64)
        .with_int("exit_code", exit_code as i64),
    );
  }

  /// Run every challenge in order, then clean the workspace.
  #[instrument(level = "info", skip_all, fields(session = %self.session_id, size = batch.len()))]
  pub async fn run_batch(&mut self, batch: &[Challenge]) -> BatchReport {
    let mut report = BatchReport::default();
    self.log(EventRecord::new(EventKind::SessionStart).with_int("size", batch.len() as i64));

    for (i, ch) in batch.iter().enumerate() {
      self.say(&format!("\n[{}/{}] {}", i + 1, batch.len(), ch.display_title()));
      match self.run_challenge(ch).await {
        ChallengeEnd::Complete(outcome) => report.completed.push((ch.id.clone(), outcome)),
        ChallengeEnd::Interrupted => {
          report.interrupted = true;
          break;
        }
      }
      if i + 1 < batch.len() && self.io.console.prompt("Press Enter for the next challenge.").is_none() {
        report.interrupted = true;
        break;
      }
    }

    if !report.interrupted {
      self.say(&format!("\n=== Practice complete: {} challenge(s) done ===", report.completed.len()));
      let _ = self.io.console.prompt("Press Enter to finish and clean up the workspace.");
      self.log(EventRecord::new(EventKind::SessionComplete).with_int("completed", report.completed.len() as i64));
    }

    self.release_workspace();
    info!(target: "codedrill", completed = report.completed.len(), interrupted = report.interrupted, "Batch finished");
    report
  }

  fn release_workspace(&mut self) {
    let files = std::mem::take(&mut self.cleanup);
    self.io.workspace.remove(&files);
    if let Err(e) = self.io.workspace.clear() {
      warn!(target: "codedrill", error = %e, "Failed to clear workspace");
    }
  }

  /// The Editing loop for one challenge.
  #[instrument(level = "info", skip_all, fields(id = %ch.id))]
  pub async fn run_challenge(&mut self, ch: &Challenge) -> ChallengeEnd {
    match self.io.workspace.setup(ch) {
      Ok(path) => self.say(&format!("Edit {} then press Enter to check.", path.display())),
      Err(e) => {
        warn!(target: "codedrill", id = %ch.id, error = %e, "Workspace setup failed");
        self.say(&format!("Could not prepare {}: {e}", ch.filename));
      }
    }
    self.say(&format!("Topic: {} · layer {} · commands: {COMMAND_HELP}", ch.topic, ch.layer));
    self.log(EventRecord::new(EventKind::ChallengeStart).with_str("challenge", ch.id.clone()));

    let mut state = ChallengeState::default();
    loop {
      let Some(line) = self.io.console.prompt("> ") else {
        info!(target: "challenge", id = %ch.id, "Input closed; leaving challenge");
        return ChallengeEnd::Interrupted;
      };
      match Command::parse(&line) {
        Command::Check => {
          if let Some(outcome) = self.check(ch, &mut state).await {
            return ChallengeEnd::Complete(outcome);
          }
        }
        Command::Hint => self.reveal_hint(ch, &mut state),
        Command::Cheatsheet => {
          if ch.cheatsheet.trim().is_empty() {
            self.say("No cheatsheet available for this challenge.");
          } else {
            let text = ch.cheatsheet.clone();
            self.say(&text);
          }
        }
        Command::Lesson => self.io.lessons.show(ch, &mut *self.io.console),
        Command::Solution => self.reveal_solution(ch, &mut state),
        Command::Unknown(cmd) => self.say(&format!("Unknown command `{cmd}`. Commands: {COMMAND_HELP}")),
      }
    }
  }

  fn reveal_hint(&mut self, ch: &Challenge, state: &mut ChallengeState) {
    if ch.hints.is_empty() {
      self.say("No hints for this challenge.");
    } else if state.hint_index >= ch.hints.len() {
      self.say("No more hints.");
    } else {
      let n = state.hint_index;
      self.say(&format!("Hint {}/{}: {}", n + 1, ch.hints.len(), ch.hints[n]));
      state.hint_index += 1;
    }
  }

  fn reveal_solution(&mut self, ch: &Challenge, state: &mut ChallengeState) {
    if ch.solution.trim().is_empty() {
      self.say("No solution available for this challenge.");
      return;
    }
    if self.options.track_assisted && !state.solution_viewed() {
      if self.options.confirm_solution
        && !self.io.console.confirm("Viewing the solution marks this attempt as assisted. Show it?")
      {
        self.say("Solution stays hidden.");
        return;
      }
      if state.mark_solution_viewed() {
        self.log(EventRecord::new(EventKind::SolutionViewed).with_str("challenge", ch.id.clone()));
      }
    }
    self.say("── Solution ──");
    self.say(ch.solution.trim_end());
  }

  /// Checking. `Some` means the challenge is complete.
  async fn check(&mut self, ch: &Challenge, state: &mut ChallengeState) -> Option<Outcome> {
    if self.options.confirm_check && !self.io.console.confirm("Check your solution now?") {
      return None;
    }
    let missing = self.io.constraints.missing_prerequisites(ch);
    if !missing.is_empty() {
      self.say("This challenge needs concepts you have not covered yet:");
      for concept in &missing {
        self.say(&format!("  - {concept}"));
      }
      return None;
    }

    if ch.manual_check {
      return Some(self.complete_manually(ch, state));
    }

    let source = match self.io.workspace.read_source(ch) {
      Ok(source) => {
        if !self.passes_constraints(ch, &source) {
          return None;
        }
        Some(source)
      }
      Err(e) => {
        warn!(target: "codedrill", id = %ch.id, error = %e, "Source unreadable; skipping constraint checks");
        None
      }
    };

    let fixtures = match self.io.workspace.copy_fixtures(ch) {
      Ok(f) => f,
      Err(e) => {
        warn!(target: "codedrill", id = %ch.id, error = %e, "Fixture copy failed");
        self.say(&format!("Some fixture files could not be copied: {e}"));
        Vec::new()
      }
    };
    self.cleanup.extend(fixtures.iter().cloned());

    let req = RunRequest {
      file: self.io.workspace.source_path(ch),
      workdir: self.io.workspace.root().to_path_buf(),
      args: ch.args.clone(),
      stdin: ch.stdin.clone(),
    };
    let started = Instant::now();
    let out = self.io.sandbox.run(&req).await;
    let elapsed = started.elapsed().as_secs();

    if !out.success() {
      let err = out.combined();
      if !err.trim().is_empty() {
        self.say(err.trim_end());
      }
      self.say(&format!("── run finished: exit code {} ({elapsed}s) ──", out.exit_code));
      self.say("Compile/runtime error. Fix it and press Enter to check again.");
      self.note_unchanged(state, source);
      self.record(ch, Outcome::CompileFail);
      self.log_attempt(ch, Outcome::CompileFail, elapsed, out.exit_code);
      self.check_gate(ch);
      return None;
    }

    self.say(&format!("── run finished: exit code 0 ({elapsed}s) ──"));
    if validate_output(&ch.expected_output, &out.stdout) {
      self.say(out.stdout.trim_end());
      let outcome = if state.solution_viewed() {
        self.say("✓ Correct (assisted: the solution was viewed).");
        Outcome::PassAssisted
      } else {
        self.say("✓ Correct!");
        Outcome::Pass
      };
      self.record(ch, outcome);
      self.log_attempt(ch, outcome, elapsed, 0);
      self.io.workspace.remove(&fixtures);
      self.cleanup.push(req.file);
      Some(outcome)
    } else {
      self.say("✗ Output did not match the expected result.");
      self.say("Your output:");
      self.say(out.stdout.trim_end());
      self.say("Expected:");
      let expected = ch.expected_output.join("\n");
      self.say(&expected);
      for note in mismatch_diagnostics(&ch.expected_output, &out.stdout) {
        self.say(&format!("  • {note}"));
      }
      self.note_unchanged(state, source);
      self.record(ch, Outcome::Fail);
      self.log_attempt(ch, Outcome::Fail, elapsed, 0);
      self.check_gate(ch);
      None
    }
  }

  /// Point out a re-check of identical code, then snapshot it.
  fn note_unchanged(&mut self, state: &mut ChallengeState, source: Option<String>) {
    if state.unchanged_since_failure(source.as_deref()) {
      self.say("  • no code changes since the previous failed check");
    }
    if source.is_some() {
      state.last_source = source;
    }
  }

  /// Violations always block; warnings block only for enforced topics.
  fn passes_constraints(&mut self, ch: &Challenge, source: &str) -> bool {
    let violations = self.io.constraints.violations(source, ch, self.options.constraint_profiles);
    if !violations.is_empty() {
      self.say("Constraint violations:");
      for v in &violations {
        self.say(&format!("  ✗ {v}"));
      }
      self.log(
        EventRecord::new(EventKind::ConstraintViolation)
          .with_str("challenge", ch.id.clone())
          .with_str("first", violations[0].clone())
          .with_int("count", violations.len() as i64),
      );
      return false;
    }

    let warnings = self.io.constraints.warnings(source, ch, self.options.heuristics);
    if warnings.is_empty() {
      return true;
    }
    for w in &warnings {
      self.say(&format!("  ! {w}"));
    }
    if self.io.constraints.is_enforced(&ch.topic) {
      self.say(&format!("Warnings are enforced for '{}'. Address them before running.", ch.topic));
      return false;
    }
    true
  }

  fn complete_manually(&mut self, ch: &Challenge, state: &ChallengeState) -> Outcome {
    self.say("This challenge is checked manually: compare your program's behaviour with the task yourself.");
    let outcome = if state.solution_viewed() { Outcome::PassAssisted } else { Outcome::ManualPass };
    self.record(ch, outcome);
    self.log(
      EventRecord::new(EventKind::ManualComplete)
        .with_str("challenge", ch.id.clone())
        .with_str("outcome", outcome.as_str()),
    );
    let path = self.io.workspace.source_path(ch);
    self.cleanup.push(path);
    self.say("Marked complete.");
    outcome
  }

  fn check_gate(&mut self, ch: &Challenge) {
    let threshold = self.options.gate_threshold;
    if threshold == 0 {
      return;
    }
    let snapshot = match self.io.stats.snapshot() {
      Ok(s) => s,
      Err(e) => {
        warn!(target: "codedrill", error = %e, "Stats snapshot failed; skipping adaptive gate");
        return;
      }
    };
    let score = topic_score(&ch.topic, &snapshot.topics);
    if should_trigger_adaptive_gate(self.io.gate, &ch.topic, score, threshold) {
      self.say(&format!(
        "'{}' keeps tripping you up (weakness {score}). A focused practice run on it is recommended.",
        ch.topic
      ));
      self.log(
        EventRecord::new(EventKind::AdaptiveGate)
          .with_str("topic", ch.topic.as_str())
          .with_int("score", score as i64),
      );
    }
  }
}
