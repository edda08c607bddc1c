//! Constraint checks on submitted source.
//!
//! The session only sees the `ConstraintIndex` trait. `RuleConstraints` is a
//! small token-based implementation driven by each challenge's
//! `forbidden` / `required` / `prerequisites` lists.

use std::collections::BTreeSet;

use crate::domain::{Challenge, Topic};
use crate::util::normalize;

pub trait ConstraintIndex {
  /// Concepts the challenge relies on that the learner has not met yet.
  fn missing_prerequisites(&self, challenge: &Challenge) -> Vec<String>;
  /// Hard rule breaks. Empty when profiles are disabled.
  fn violations(&self, source: &str, challenge: &Challenge, profiles_enabled: bool) -> Vec<String>;
  /// Heuristic smells; blocking only when the topic is enforced.
  fn warnings(&self, source: &str, challenge: &Challenge, heuristics_enabled: bool) -> Vec<String>;
  fn is_enforced(&self, topic: &Topic) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct RuleConstraints {
  /// Concepts already introduced to the learner.
  pub known_concepts: BTreeSet<String>,
  pub enforced: BTreeSet<Topic>,
}

impl RuleConstraints {
  pub fn new(known_concepts: BTreeSet<String>, enforced: BTreeSet<Topic>) -> Self {
    Self { known_concepts, enforced }
  }
}

/// Byte offset of a `//` comment outside string and rune literals.
fn comment_start(line: &str) -> Option<usize> {
  let bytes = line.as_bytes();
  let mut quote: Option<u8> = None;
  let mut i = 0;
  while i < bytes.len() {
    let b = bytes[i];
    match quote {
      Some(q) => {
        if b == b'\\' && q != b'`' {
          i += 1;
        } else if b == q {
          quote = None;
        }
      }
      None => match b {
        b'"' | b'\'' | b'`' => quote = Some(b),
        b'/' if bytes.get(i + 1) == Some(&b'/') => return Some(i),
        _ => {}
      },
    }
    i += 1;
  }
  None
}

/// Source with `//` line comments and blank lines removed.
fn code_only(source: &str) -> String {
  source
    .lines()
    .map(|l| match comment_start(l) {
      Some(at) => &l[..at],
      None => l,
    })
    .filter(|l| !l.trim().is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

impl ConstraintIndex for RuleConstraints {
  fn missing_prerequisites(&self, challenge: &Challenge) -> Vec<String> {
    challenge
      .prerequisites
      .iter()
      .filter(|p| !self.known_concepts.contains(*p))
      .cloned()
      .collect()
  }

  fn violations(&self, source: &str, challenge: &Challenge, profiles_enabled: bool) -> Vec<String> {
    if !profiles_enabled {
      return Vec::new();
    }
    let code = code_only(source);
    let mut out = Vec::new();
    for token in &challenge.forbidden {
      if code.contains(token.as_str()) {
        out.push(format!("`{token}` is not allowed in this challenge"));
      }
    }
    for token in &challenge.required {
      if !code.contains(token.as_str()) {
        out.push(format!("this challenge must use `{token}`"));
      }
    }
    out
  }

  fn warnings(&self, source: &str, challenge: &Challenge, heuristics_enabled: bool) -> Vec<String> {
    if !heuristics_enabled {
      return Vec::new();
    }
    let mut out = Vec::new();
    if !challenge.template.trim().is_empty() && normalize(source) == normalize(&challenge.template) {
      out.push("file is unchanged from the starter template".to_string());
    }
    let code = code_only(source);
    let literal_hits = challenge
      .expected_output
      .iter()
      .filter(|l| !l.trim().is_empty())
      .filter(|l| code.contains(&format!("\"{}\"", l.trim())))
      .count();
    let expected_lines = challenge.expected_output.iter().filter(|l| !l.trim().is_empty()).count();
    if expected_lines > 1 && literal_hits == expected_lines {
      out.push("expected output looks hard-coded as string literals".to_string());
    }
    out
  }

  fn is_enforced(&self, topic: &Topic) -> bool {
    self.enforced.contains(topic)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Layer, Tier};
  use crate::testing::challenge;

  fn loop_challenge() -> Challenge {
    let mut ch = challenge("loops-3", "loops", Tier::Core, Layer::Core, 3, None);
    ch.forbidden = vec!["goto".into()];
    ch.required = vec!["for ".into()];
    ch.prerequisites = vec!["variables".into(), "loops".into()];
    ch.template = "package main\n\nfunc main() {\n}\n".into();
    ch.expected_output = vec!["1".into(), "2".into()];
    ch
  }

  #[test]
  fn violations_ignore_comments_and_respect_toggle() {
    let rules = RuleConstraints::default();
    let ch = loop_challenge();
    let src = "package main\n// goto is bad\nfunc main() {\n  for i := 0; i < 2; i++ {}\n}\n";
    assert!(rules.violations(src, &ch, true).is_empty());

    let bad = "package main\nfunc main() {\n  goto end\n}\n";
    let v = rules.violations(bad, &ch, true);
    assert_eq!(v.len(), 2, "{v:?}");
    assert!(rules.violations(bad, &ch, false).is_empty());
  }

  #[test]
  fn slashes_inside_literals_are_not_comments() {
    let rules = RuleConstraints::default();
    let mut ch = challenge("urls", "strings", Tier::Core, Layer::Core, 1, None);
    ch.required = vec!["strings.Split".into()];
    ch.forbidden = vec!["goto".into()];

    let src = "u := \"http://x\"; parts := strings.Split(u, \"/\")\n";
    assert!(rules.violations(src, &ch, true).is_empty());

    let src = "s := \"a//b\"; goto end // strings.Split\n";
    let v = rules.violations(src, &ch, true);
    assert_eq!(v, vec!["`goto` is not allowed in this challenge".to_string(), "this challenge must use `strings.Split`".to_string()]);

    assert_eq!(comment_start(r#"x := "\"//" // note"#), Some(12));
    assert_eq!(comment_start("r := '/' // c"), Some(9));
    assert_eq!(comment_start("p := `//raw`"), None);
  }

  #[test]
  fn missing_prerequisites_lists_unknown_concepts() {
    let rules = RuleConstraints::new(["variables".to_string()].into(), BTreeSet::new());
    assert_eq!(rules.missing_prerequisites(&loop_challenge()), vec!["loops".to_string()]);
  }

  #[test]
  fn heuristics_flag_untouched_template_and_hardcoding() {
    let rules = RuleConstraints::default();
    let ch = loop_challenge();
    let w = rules.warnings("package main\nfunc main() {}\n", &ch, true);
    assert_eq!(w.len(), 1);

    let cheat = "package main\nfunc main() { println(\"1\"); println(\"2\") }\n";
    let w = rules.warnings(cheat, &ch, true);
    assert_eq!(w, vec!["expected output looks hard-coded as string literals".to_string()]);
    assert!(rules.warnings(cheat, &ch, false).is_empty());
  }

  #[test]
  fn enforcement_is_a_set_lookup() {
    let rules = RuleConstraints::new(BTreeSet::new(), [Topic::new("loops")].into());
    assert!(rules.is_enforced(&Topic::new("loops")));
    assert!(!rules.is_enforced(&Topic::new("maps")));
  }
}
