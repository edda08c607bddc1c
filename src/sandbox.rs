//! Compile+run step for learner code.
//!
//! `Sandbox::run` is the one await point of a session; a timeout or
//! cancellation would wrap this call.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::util::{fill_template, trunc_for_log};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
  pub file: PathBuf,
  pub workdir: PathBuf,
  pub args: Vec<String>,
  pub stdin: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOutput {
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
}

impl RunOutput {
  pub fn success(&self) -> bool { self.exit_code == 0 }

  pub fn combined(&self) -> String {
    match (self.stdout.is_empty(), self.stderr.is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
    }
  }
}

/// Blocking-in-spirit execution: no timeout, failures become exit codes.
#[allow(async_fn_in_trait)]
pub trait Sandbox {
  async fn run(&self, req: &RunRequest) -> RunOutput;
}

/// Runs a command template such as `["go", "run", "{file}"]`.
#[derive(Clone, Debug)]
pub struct ProcessSandbox {
  pub command: Vec<String>,
}

impl ProcessSandbox {
  pub fn new(command: Vec<String>) -> Self {
    Self { command }
  }

  fn argv(&self, req: &RunRequest) -> Vec<String> {
    let file = req.file.display().to_string();
    let workdir = req.workdir.display().to_string();
    self
      .command
      .iter()
      .map(|part| fill_template(part, &[("file", file.as_str()), ("workdir", workdir.as_str())]))
      .chain(req.args.iter().cloned())
      .collect()
  }
}

impl Sandbox for ProcessSandbox {
  async fn run(&self, req: &RunRequest) -> RunOutput {
    let argv = self.argv(req);
    info!(target: "codedrill", file = %req.file.display(), argv = ?argv, "Running learner code");
    let Some((program, rest)) = argv.split_first() else {
      return RunOutput { exit_code: -1, stderr: "no runner command configured".into(), ..Default::default() };
    };

    let spawned = Command::new(program)
      .args(rest)
      .current_dir(&req.workdir)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn();
    let mut child = match spawned {
      Ok(c) => c,
      Err(e) => {
        error!(target: "codedrill", %program, error = %e, "Failed to start runner");
        return RunOutput { exit_code: -1, stderr: format!("failed to start `{program}`: {e}"), ..Default::default() };
      }
    };

    // stdin must be fed concurrently with draining stdout/stderr.
    let pipe = child.stdin.take();
    let feed = async move {
      if let Some(mut pipe) = pipe {
        if let Some(input) = &req.stdin {
          if let Err(e) = pipe.write_all(input.as_bytes()).await {
            debug!(target: "codedrill", error = %e, "Runner closed stdin early");
          }
        }
        // dropping closes the pipe
      }
    };
    let ((), waited) = tokio::join!(feed, child.wait_with_output());

    match waited {
      Ok(out) => {
        let res = RunOutput {
          exit_code: out.status.code().unwrap_or(-1),
          stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
          stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        };
        debug!(
          target: "codedrill",
          exit_code = res.exit_code,
          stdout = %trunc_for_log(&res.stdout, 200),
          stderr = %trunc_for_log(&res.stderr, 200),
          "Runner finished"
        );
        res
      }
      Err(e) => {
        error!(target: "codedrill", error = %e, "Runner wait failed");
        RunOutput { exit_code: -1, stderr: format!("runner failed: {e}"), ..Default::default() }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn req(dir: &std::path::Path) -> RunRequest {
    RunRequest { file: dir.join("main.sh"), workdir: dir.to_path_buf(), args: vec![], stdin: None }
  }

  #[test]
  fn argv_fills_placeholders_and_appends_args() {
    let sb = ProcessSandbox::new(vec!["go".into(), "run".into(), "{file}".into()]);
    let mut r = req(std::path::Path::new("/tmp/ws"));
    r.args = vec!["--n".into(), "3".into()];
    assert_eq!(sb.argv(&r), vec!["go", "run", "/tmp/ws/main.sh", "--n", "3"]);
  }

  #[test]
  fn combined_output_joins_streams() {
    let out = RunOutput { exit_code: 1, stdout: "a\n".into(), stderr: "b".into() };
    assert_eq!(out.combined(), "a\nb");
    assert_eq!(RunOutput { stderr: "only".into(), ..Default::default() }.combined(), "only");
  }

  #[tokio::test]
  async fn missing_program_becomes_failed_exit() {
    let dir = tempfile::tempdir().unwrap();
    let sb = ProcessSandbox::new(vec!["definitely-not-a-real-runner-xyz".into()]);
    let out = sb.run(&req(dir.path())).await;
    assert_eq!(out.exit_code, -1);
    assert!(out.stderr.contains("failed to start"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn large_output_before_reading_stdin_does_not_stall() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join("main.sh"),
      "yes a | head -c 200000\ncat > /dev/null\necho done >&2\n",
    )
    .unwrap();
    let sb = ProcessSandbox::new(vec!["sh".into(), "{file}".into()]);
    let mut r = req(dir.path());
    r.stdin = Some("x".repeat(200_000));
    let out = tokio::time::timeout(std::time::Duration::from_secs(20), sb.run(&r))
      .await
      .expect("runner stalled");
    assert_eq!(out.exit_code, 0);
    assert_eq!(out.stdout.len(), 200_000);
    assert_eq!(out.stderr.trim(), "done");
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn runs_with_stdin_and_captures_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.sh"), "read x\necho \"got $x\"\necho oops >&2\nexit 3\n").unwrap();
    let sb = ProcessSandbox::new(vec!["sh".into(), "{file}".into()]);
    let mut r = req(dir.path());
    r.stdin = Some("7\n".into());
    let out = sb.run(&r).await;
    assert_eq!(out.exit_code, 3);
    assert_eq!(out.stdout.trim(), "got 7");
    assert_eq!(out.stderr.trim(), "oops");
  }
}
