//! Workspace directory the learner edits in.
//!
//! Everything a session puts here is removed by the end of the batch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::Challenge;

pub trait Workspace {
  /// Create the directory and write the challenge's starter file (kept if present).
  fn setup(&mut self, challenge: &Challenge) -> io::Result<PathBuf>;
  fn root(&self) -> &Path;
  fn source_path(&self, challenge: &Challenge) -> PathBuf {
    self.root().join(&challenge.filename)
  }
  fn read_source(&self, challenge: &Challenge) -> io::Result<String>;
  /// Copy the challenge's fixture files in; returns what was created.
  fn copy_fixtures(&mut self, challenge: &Challenge) -> io::Result<Vec<PathBuf>>;
  /// Best effort; missing files are fine.
  fn remove(&mut self, paths: &[PathBuf]);
  /// Remove everything inside the workspace directory.
  fn clear(&mut self) -> io::Result<()>;
}

#[derive(Clone, Debug)]
pub struct FsWorkspace {
  root: PathBuf,
  fixtures_dir: PathBuf,
}

impl FsWorkspace {
  pub fn new(root: impl Into<PathBuf>, fixtures_dir: impl Into<PathBuf>) -> Self {
    Self { root: root.into(), fixtures_dir: fixtures_dir.into() }
  }
}

impl Workspace for FsWorkspace {
  fn setup(&mut self, challenge: &Challenge) -> io::Result<PathBuf> {
    fs::create_dir_all(&self.root)?;
    let path = self.source_path(challenge);
    if !path.exists() {
      fs::write(&path, &challenge.template)?;
      debug!(target: "codedrill", path = %path.display(), "Starter file written");
    }
    Ok(path)
  }

  fn root(&self) -> &Path { &self.root }

  fn read_source(&self, challenge: &Challenge) -> io::Result<String> {
    fs::read_to_string(self.source_path(challenge))
  }

  fn copy_fixtures(&mut self, challenge: &Challenge) -> io::Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for name in &challenge.fixtures {
      let from = self.fixtures_dir.join(name);
      let to = self.root.join(name);
      if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(&from, &to)?;
      created.push(to);
    }
    Ok(created)
  }

  fn remove(&mut self, paths: &[PathBuf]) {
    for p in paths {
      match fs::remove_file(p) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(target: "codedrill", path = %p.display(), error = %e, "Failed to remove workspace file"),
      }
    }
  }

  fn clear(&mut self) -> io::Result<()> {
    let entries = match fs::read_dir(&self.root) {
      Ok(e) => e,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
      Err(e) => return Err(e),
    };
    for entry in entries {
      let path = entry?.path();
      if path.is_dir() {
        fs::remove_dir_all(&path)?;
      } else {
        fs::remove_file(&path)?;
      }
    }
    debug!(target: "codedrill", root = %self.root.display(), "Workspace cleared");
    Ok(())
  }
}

/// Clears the workspace when dropped, whatever path the session took out.
pub struct WorkspaceLease<W: Workspace> {
  pub workspace: W,
}

impl<W: Workspace> WorkspaceLease<W> {
  pub fn new(workspace: W) -> Self {
    Self { workspace }
  }
}

impl<W: Workspace> Drop for WorkspaceLease<W> {
  fn drop(&mut self) {
    if let Err(e) = self.workspace.clear() {
      warn!(target: "codedrill", root = %self.workspace.root().display(), error = %e, "Workspace cleanup failed");
    }
  }
}
