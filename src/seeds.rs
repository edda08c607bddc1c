//! Built-in Go challenges and curriculum so the binary is useful without a
//! config file.

use crate::domain::{Challenge, CurriculumStep, Layer, Tier, Topic};

fn go(id: &str, title: &str, topic: &str, tier: Tier, layer: Layer) -> Challenge {
  Challenge {
    id: id.into(),
    title: title.into(),
    topic: Topic::new(topic),
    tier,
    layer,
    layer_index: 0,
    extra_parent: None,
    hints: vec![],
    cheatsheet: String::new(),
    solution: String::new(),
    lesson: String::new(),
    expected_output: vec![],
    manual_check: false,
    filename: String::new(),
    template: "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println()\n}\n".into(),
    args: vec![],
    stdin: None,
    fixtures: vec![],
    prerequisites: vec![],
    forbidden: vec![],
    required: vec![],
  }
}

/// Seed bank in curriculum order; `layer_index` is filled by the catalog.
pub fn seed_challenges() -> Vec<Challenge> {
  let mut hello = go("hello", "Hello, gopher", "basics", Tier::Core, Layer::Core);
  hello.expected_output = vec!["Hello, gopher!".into()];
  hello.hints = vec!["fmt.Println prints a line.".into()];
  hello.solution = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, gopher!\")\n}\n".into();
  hello.lesson = "Every Go program starts in package main, func main.".into();

  let mut sum = go("sum-loop", "Sum one to ten", "loops", Tier::Core, Layer::Core);
  sum.expected_output = vec!["55".into()];
  sum.hints = vec!["Go has only `for`.".into(), "Accumulate into a variable declared before the loop.".into()];
  sum.cheatsheet = "for i := 1; i <= n; i++ { ... }".into();
  sum.required = vec!["for ".into()];
  sum.forbidden = vec!["goto".into()];
  sum.solution = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\ttotal := 0\n\tfor i := 1; i <= 10; i++ {\n\t\ttotal += i\n\t}\n\tfmt.Println(total)\n}\n".into();

  let mut evens = go("sum-evens", "Sum the even numbers", "loops", Tier::Extra, Layer::Core);
  evens.extra_parent = Some(2);
  evens.expected_output = vec!["30".into()];
  evens.required = vec!["for ".into()];

  let mut fizz = go("fizzbuzz", "FizzBuzz to fifteen", "conditionals", Tier::Core, Layer::Core);
  fizz.expected_output = (1..=15)
    .map(|i| match (i % 3, i % 5) {
      (0, 0) => "FizzBuzz".to_string(),
      (0, _) => "Fizz".to_string(),
      (_, 0) => "Buzz".to_string(),
      _ => i.to_string(),
    })
    .collect();
  fizz.hints = vec!["Check the combined case first.".into()];
  fizz.prerequisites = vec!["loops".into()];

  let mut words = go("word-count", "Count words from stdin", "maps", Tier::Core, Layer::Mantle);
  words.stdin = Some("go is fun and go is fast\n".into());
  words.expected_output = vec!["go 2".into(), "is 2".into()];
  words.hints = vec!["bufio.Scanner with ScanWords splits input.".into(), "Print only words seen more than once, sorted.".into()];
  words.cheatsheet = "counts := map[string]int{}\ncounts[w]++".into();
  words.prerequisites = vec!["loops".into()];

  let mut reverse = go("reverse-slice", "Reverse a slice in place", "slices", Tier::Core, Layer::Mantle);
  reverse.expected_output = vec!["[5 4 3 2 1]".into()];
  reverse.forbidden = vec!["slices.Reverse".into()];

  let mut args = go("echo-args", "Echo command-line arguments", "basics", Tier::Extra, Layer::Mantle);
  args.extra_parent = Some(1);
  args.args = vec!["alpha".into(), "beta".into()];
  args.expected_output = vec!["alpha beta".into()];

  let mut bridge = go("bridge:maps-to-structs", "From maps to structs", "structs", Tier::Core, Layer::Mantle);
  bridge.expected_output = vec!["{Ada 36}".into()];

  let mut server = go("http-hello", "Serve hello over HTTP", "net", Tier::Core, Layer::Crust);
  server.manual_check = true;
  server.lesson = "net/http: http.HandleFunc then http.ListenAndServe.".into();
  server.prerequisites = vec!["maps".into()];

  vec![hello, sum, evens, fizz, words, reverse, args, bridge, server]
}

/// Linear curriculum over the seed bank.
pub fn seed_curriculum() -> Vec<CurriculumStep> {
  vec![
    CurriculumStep::Lesson { id: "intro".into() },
    CurriculumStep::Challenge { layer: Layer::Core, index: 1 },
    CurriculumStep::Challenge { layer: Layer::Core, index: 2 },
    CurriculumStep::Challenge { layer: Layer::Core, index: 3 },
    CurriculumStep::Lesson { id: "collections".into() },
    CurriculumStep::Challenge { layer: Layer::Mantle, index: 1 },
    CurriculumStep::Challenge { layer: Layer::Mantle, index: 2 },
    CurriculumStep::Challenge { layer: Layer::Mantle, index: 3 },
    CurriculumStep::Challenge { layer: Layer::Crust, index: 1 },
  ]
}
