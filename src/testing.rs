//! Test doubles shared by unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use crate::console::Console;
use crate::domain::{Challenge, Layer, Tier, Topic};
use crate::sandbox::{RunOutput, RunRequest, Sandbox};
use crate::workspace::Workspace;

pub fn challenge(id: &str, topic: &str, tier: Tier, layer: Layer, index: u32, parent: Option<u32>) -> Challenge {
  Challenge {
    id: id.into(),
    title: String::new(),
    topic: Topic::new(topic),
    tier,
    layer,
    layer_index: index,
    extra_parent: parent,
    hints: vec![],
    cheatsheet: String::new(),
    solution: String::new(),
    lesson: String::new(),
    expected_output: vec![],
    manual_check: false,
    filename: format!("{}.go", id.replace(':', "_")),
    template: String::new(),
    args: vec![],
    stdin: None,
    fixtures: vec![],
    prerequisites: vec![],
    forbidden: vec![],
    required: vec![],
  }
}

/// Feeds queued input lines and records everything printed.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
  pub inputs: VecDeque<String>,
  pub output: Vec<String>,
}

impl ScriptedConsole {
  pub fn new<I, S>(inputs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self { inputs: inputs.into_iter().map(Into::into).collect(), output: Vec::new() }
  }

  pub fn transcript(&self) -> String {
    self.output.join("\n")
  }

  /// Index of the first printed line containing `needle`.
  pub fn position(&self, needle: &str) -> Option<usize> {
    self.output.iter().position(|l| l.contains(needle))
  }
}

impl Console for ScriptedConsole {
  fn print(&mut self, text: &str) {
    self.output.push(text.to_string());
  }

  fn read_line(&mut self) -> Option<String> {
    self.inputs.pop_front()
  }
}

/// Returns queued outputs (success with empty stdout once drained) and
/// remembers every request.
#[derive(Debug, Default)]
pub struct FakeSandbox {
  pub outputs: RefCell<VecDeque<RunOutput>>,
  pub calls: RefCell<Vec<RunRequest>>,
}

impl FakeSandbox {
  pub fn with_outputs(outputs: impl IntoIterator<Item = RunOutput>) -> Self {
    Self { outputs: RefCell::new(outputs.into_iter().collect()), calls: RefCell::default() }
  }

  pub fn call_count(&self) -> usize {
    self.calls.borrow().len()
  }
}

impl Sandbox for FakeSandbox {
  async fn run(&self, req: &RunRequest) -> RunOutput {
    self.calls.borrow_mut().push(req.clone());
    self.outputs.borrow_mut().pop_front().unwrap_or_default()
  }
}

pub fn ok(stdout: &str) -> RunOutput {
  RunOutput { exit_code: 0, stdout: stdout.into(), stderr: String::new() }
}

pub fn failed(code: i32, stderr: &str) -> RunOutput {
  RunOutput { exit_code: code, stdout: String::new(), stderr: stderr.into() }
}

/// In-memory workspace: file name -> contents.
#[derive(Debug)]
pub struct MemoryWorkspace {
  pub root: PathBuf,
  pub files: BTreeMap<PathBuf, String>,
  pub cleared: usize,
}

impl Default for MemoryWorkspace {
  fn default() -> Self {
    Self { root: PathBuf::from("/ws"), files: BTreeMap::new(), cleared: 0 }
  }
}

impl MemoryWorkspace {
  pub fn write(&mut self, challenge: &Challenge, source: &str) {
    let path = self.source_path(challenge);
    self.files.insert(path, source.to_string());
  }
}

impl Workspace for MemoryWorkspace {
  fn setup(&mut self, challenge: &Challenge) -> io::Result<PathBuf> {
    let path = self.source_path(challenge);
    self.files.entry(path.clone()).or_insert_with(|| challenge.template.clone());
    Ok(path)
  }

  fn root(&self) -> &Path { &self.root }

  fn read_source(&self, challenge: &Challenge) -> io::Result<String> {
    self
      .files
      .get(&self.source_path(challenge))
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
  }

  fn copy_fixtures(&mut self, challenge: &Challenge) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for f in &challenge.fixtures {
      let p = self.root.join(f);
      self.files.insert(p.clone(), "fixture".into());
      out.push(p);
    }
    Ok(out)
  }

  fn remove(&mut self, paths: &[PathBuf]) {
    for p in paths {
      self.files.remove(p);
    }
  }

  fn clear(&mut self) -> io::Result<()> {
    self.files.clear();
    self.cleared += 1;
    Ok(())
  }
}
