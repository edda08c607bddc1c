//! Line-oriented output validation and mismatch diagnostics.

/// Trimmed, non-trailing-blank lines of program output.
fn output_lines(text: &str) -> Vec<&str> {
  let mut lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
  while lines.last().map_or(false, |l| l.is_empty()) {
    lines.pop();
  }
  lines
}

fn expected_lines(expected: &[String]) -> Vec<&str> {
  let joined: Vec<&str> = expected.iter().flat_map(|l| l.lines()).map(str::trim).collect();
  let start = joined.iter().position(|l| !l.is_empty()).unwrap_or(joined.len());
  let end = joined.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
  joined[start..end].to_vec()
}

/// True when `actual` matches `expected` line by line, whitespace-trimmed.
pub fn validate_output(expected: &[String], actual: &str) -> bool {
  expected_lines(expected) == output_lines(actual)
}

/// Human-readable notes on where `actual` diverges from `expected`.
pub fn mismatch_diagnostics(expected: &[String], actual: &str) -> Vec<String> {
  let want = expected_lines(expected);
  let got = output_lines(actual);
  let mut notes = Vec::new();

  if got.is_empty() {
    notes.push("program printed nothing".to_string());
    return notes;
  }
  if want.len() != got.len() {
    notes.push(format!("expected {} line(s), got {}", want.len(), got.len()));
  }
  if let Some(i) = want.iter().zip(got.iter()).position(|(w, g)| w != g) {
    notes.push(format!("line {}: expected `{}`, got `{}`", i + 1, want[i], got[i]));
    if want[i].eq_ignore_ascii_case(got[i]) {
      notes.push("the difference is only letter case".to_string());
    }
  } else if got.len() > want.len() {
    notes.push(format!("unexpected extra output starting with `{}`", got[want.len()]));
  } else if want.len() > got.len() {
    notes.push(format!("missing output starting with `{}`", want[got.len()]));
  }
  notes
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exp(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn trailing_whitespace_is_ignored() {
    assert!(validate_output(&exp(&["3"]), "3"));
    assert!(validate_output(&exp(&["3"]), "3 "));
    assert!(validate_output(&exp(&["3"]), "\n3\n\n"));
    assert!(!validate_output(&exp(&["3"]), "4"));
  }

  #[test]
  fn multi_line_compare_trims_each_line() {
    assert!(validate_output(&exp(&["a", "b"]), "a  \n  b\n"));
    assert!(validate_output(&exp(&["a\nb"]), "a\nb"));
    assert!(!validate_output(&exp(&["a", "b"]), "a\nc"));
    assert!(!validate_output(&exp(&["a", "b"]), "a"));
  }

  #[test]
  fn diagnostics_point_at_first_difference() {
    let d = mismatch_diagnostics(&exp(&["3"]), "4");
    assert_eq!(d, vec!["line 1: expected `3`, got `4`".to_string()]);

    let d = mismatch_diagnostics(&exp(&["Hello"]), "hello\nextra");
    assert!(d[0].contains("expected 1 line(s), got 2"));
    assert!(d.iter().any(|n| n.contains("letter case")));

    let d = mismatch_diagnostics(&exp(&["a", "b"]), "a");
    assert!(d.iter().any(|n| n.contains("missing output starting with `b`")));

    assert_eq!(mismatch_diagnostics(&exp(&["a"]), "  "), vec!["program printed nothing".to_string()]);
  }
}
