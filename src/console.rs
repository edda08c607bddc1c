//! Line-based interactive I/O and the lesson viewer seam.

use std::io::{self, BufRead, Write};

use crate::domain::Challenge;

pub trait Console {
  fn print(&mut self, text: &str);
  /// One line without the trailing newline; `None` on end of input.
  fn read_line(&mut self) -> Option<String>;

  fn prompt(&mut self, text: &str) -> Option<String> {
    self.print(text);
    self.read_line()
  }

  /// Yes/no gate; anything but `y`/`yes` is a no.
  fn confirm(&mut self, question: &str) -> bool {
    match self.prompt(&format!("{question} [y/N]")) {
      Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
      None => false,
    }
  }
}

#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
  fn print(&mut self, text: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
  }

  fn read_line(&mut self) -> Option<String> {
    let mut buf = String::new();
    match io::stdin().lock().read_line(&mut buf) {
      Ok(0) | Err(_) => None,
      Ok(_) => Some(buf.trim_end_matches(['\r', '\n']).to_string()),
    }
  }
}

/// Shows the lesson behind a challenge.
pub trait LessonViewer {
  fn show(&mut self, challenge: &Challenge, console: &mut dyn Console);
}

/// Prints the challenge's lesson text as-is.
#[derive(Debug, Default)]
pub struct InlineLessons;

impl LessonViewer for InlineLessons {
  fn show(&mut self, challenge: &Challenge, console: &mut dyn Console) {
    if challenge.lesson.trim().is_empty() {
      console.print(&format!("No lesson available for topic '{}'.", challenge.topic));
    } else {
      console.print(&format!("── Lesson: {} ──", challenge.topic));
      console.print(challenge.lesson.trim_end());
    }
  }
}
