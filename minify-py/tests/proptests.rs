use minify_py::minify;
use minify_py::MinifyOptions;
use minify_py::ModuleSource;
use parse_py::parse;
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
  const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
  prop::collection::vec(prop::sample::select(CHARS.to_vec()), 3..8)
    .prop_map(|bytes| String::from_utf8(bytes).unwrap())
    .prop_filter("identifiers must not be reserved words", |s| {
      !parse_py::token::is_keyword(s)
    })
}

fn statement() -> impl Strategy<Value = String> {
  prop_oneof![
    (ident(), 0u32..100).prop_map(|(name, n)| format!("{name} = {n} + 2 * 3")),
    (ident(), ident()).prop_map(|(f, p)| format!("def {f}({p}):\n    return {p} ** 2")),
    (ident(), ident()).prop_map(|(f, p)| format!(
      "def {f}({p}):\n    result = {p} * {p}\n    return result"
    )),
    (ident(), ident()).prop_map(|(name, s)| format!("{name} = '{s}'")),
    (ident(), ident()).prop_map(|(a, b)| format!("{a} = '{b}'\n{a}_copy = '{b}'")),
    (ident(), ident()).prop_map(|(cond, body)| format!(
      "if {cond}:\n    {body} = 1\nelse:\n    {body} = 2"
    )),
    (ident(), ident()).prop_map(|(i, total)| format!(
      "for {i} in items:\n    {total} += {i}"
    )),
    ident().prop_map(|name| format!("while {name}:\n    {name} = step({name})")),
  ]
}

fn program() -> impl Strategy<Value = String> {
  prop::collection::vec(statement(), 1..8).prop_map(|stmts| {
    let mut joined = stmts.join("\n");
    joined.push('\n');
    joined
  })
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn minified_output_reparses(source in program()) {
    let out = minify(&MinifyOptions::new(), &[ModuleSource {
      name: "main".to_string(),
      text: source.clone(),
    }])
    .unwrap();
    prop_assert_eq!(out.len(), 1);
    prop_assert!(
      parse(&format!("{}\n", out[0].text)).is_ok(),
      "output no longer parses: {:?}",
      out[0].text
    );
  }

  #[test]
  fn minification_is_deterministic(source in program()) {
    let inputs = [ModuleSource {
      name: "main".to_string(),
      text: source,
    }];
    let first = minify(&MinifyOptions::new(), &inputs).unwrap();
    let second = minify(&MinifyOptions::new(), &inputs).unwrap();
    prop_assert_eq!(first, second);
  }

  #[test]
  fn minified_output_never_grows(source in program()) {
    let out = minify(&MinifyOptions::new(), &[ModuleSource {
      name: "main".to_string(),
      text: source.clone(),
    }])
    .unwrap();
    prop_assert!(out[0].text.len() <= source.len());
  }

  #[test]
  fn kept_module_names_round_trip(source in program(), name in ident()) {
    let out = minify(
      &MinifyOptions::new().with_keep_module_names(true),
      &[ModuleSource { name: name.clone(), text: source }],
    )
    .unwrap();
    prop_assert_eq!(&out[0].name, &name);
  }
}
