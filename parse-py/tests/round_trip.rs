use parse_py::emit::emit;
use parse_py::parse;

fn canonical(source: &str) -> String {
  emit(&parse(source).unwrap())
}

#[test]
fn canonical_output_is_a_fixed_point() {
  let sources = [
    "a = 3\ndef square(x):\n    return x ** 2\n",
    "from main import square\nsquare(3)\n",
    "class Greeter:\n    def greet(self, name):\n        return 'hi ' + name\n",
    "for i in items:\n    if i % 2 == 0:\n        total += i\n    else:\n        continue\n",
    "while not done:\n    done = step(state) or advance(state) is None\n",
    "values = {'k': [1, 2, 3], 'other': (x, y)}\n",
  ];
  for source in sources {
    let once = canonical(&source);
    assert_eq!(canonical(&once), once, "not canonical for {:?}", source);
  }
}

#[test]
fn canonicalization_normalizes_layout_not_semantics() {
  assert_eq!(
    canonical("x=1;y=2\nif x:y=3\n"),
    "x = 1\ny = 2\nif x:\n    y = 3\n"
  );
}

#[test]
fn comments_and_blank_lines_are_dropped() {
  assert_eq!(
    canonical("# header\n\nx = 1  # trailing\n\n\ny = 2\n"),
    "x = 1\ny = 2\n"
  );
}

#[test]
fn syntax_errors_surface_with_positions() {
  let err = parse("def f(:\n    pass\n").unwrap_err();
  assert!(err.loc.0 > 0);
}
