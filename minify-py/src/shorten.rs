use crate::err::MinifyError;
use crate::names::NameGenerator;
use crate::pass::Ctx;
use crate::pass::Pass;
use crate::Module;
use ahash::HashMap;
use ahash::HashSet;
use parse_py::ast::NodeId;
use parse_py::ast::Syntax;
use parse_py::ast::Tree;
use parse_py::loc::Loc;
use parse_py::token::RESERVED_WORDS;

/// Seeds the shared name generator with every identifier that occurs anywhere
/// in the input, plus the reserved words, so issued names can never collide
/// with a name that survives renaming.
pub struct CollectNamesPass;

impl Pass for CollectNamesPass {
  fn name(&self) -> &'static str {
    "collect_names"
  }

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    let mut excluded: HashSet<String> = RESERVED_WORDS.iter().map(|w| w.to_string()).collect();
    for module in modules.iter() {
      excluded.insert(module.name.clone());
      let tree = &module.tree;
      for id in tree.descendants(tree.root()) {
        match &tree[id].stx {
          Syntax::Name { name } => {
            excluded.insert(name.clone());
          }
          Syntax::FuncDecl { name, params, .. } => {
            excluded.insert(name.clone());
            for p in params {
              excluded.insert(p.name.clone());
            }
          }
          Syntax::ClassDecl { name, .. } => {
            excluded.insert(name.clone());
          }
          Syntax::Import { aliases } => {
            for a in aliases {
              excluded.insert(a.bound_name().to_string());
            }
          }
          Syntax::ImportFrom { module, aliases } => {
            excluded.insert(module.clone());
            for a in aliases {
              excluded.insert(a.bound_name().to_string());
            }
          }
          _ => {}
        }
      }
    }
    cx.generator = Some(NameGenerator::new(excluded));
    Ok(())
  }
}

enum StringEntry {
  Seen(Vec<NodeId>),
  Hoisted(String),
}

/// Renames one module's identifiers to generated short names. Free names and
/// string literals read at least twice earn a hoisted rebinding; a single
/// occurrence is never worth the extra line. The generator is shared across
/// modules by the caller.
struct Shortener<'a> {
  tree: &'a mut Tree,
  generator: &'a mut NameGenerator,
  eliminated: &'a HashSet<String>,
  project_modules: &'a HashSet<String>,
  keep_top_level: bool,
  mapping: HashMap<String, String>,
  imported: HashSet<String>,
  seen_names: HashMap<String, NodeId>,
  strings: HashMap<String, StringEntry>,
  hoists: Vec<NodeId>,
}

impl<'a> Shortener<'a> {
  fn run(&mut self) {
    // Names imported from sibling modules are reconciled against the
    // exporting module later, so references to them stay untouched here.
    for id in self.tree.descendants(self.tree.root()) {
      match &self.tree[id].stx {
        Syntax::ImportFrom { module, aliases } if self.project_modules.contains(module) => {
          for a in aliases {
            self.imported.insert(a.bound_name().to_string());
          }
        }
        Syntax::Import { aliases } => {
          for a in aliases {
            if self.project_modules.contains(&a.name) {
              self.imported.insert(a.bound_name().to_string());
            }
          }
        }
        _ => {}
      }
    }
    for stmt in self.tree.module_body().to_vec() {
      self.visit_stmt(stmt);
    }
  }

  /// Aliases each binding of an import from outside the module set to a
  /// fresh short name. One-character bindings are already minimal.
  fn alias_imports(&mut self, id: NodeId, skip_project_names: bool) {
    let mut aliases = match &self.tree[id].stx {
      Syntax::Import { aliases } | Syntax::ImportFrom { aliases, .. } => aliases.clone(),
      _ => return,
    };
    for a in aliases.iter_mut() {
      if skip_project_names && self.project_modules.contains(&a.name) {
        continue;
      }
      let old = a.bound_name().to_string();
      if old.len() <= 1 || self.mapping.contains_key(&old) {
        continue;
      }
      let new = self.generator.next_name();
      self.mapping.insert(old, new.clone());
      a.asname = Some(new);
    }
    match &mut self.tree[id].stx {
      Syntax::Import { aliases: slot } | Syntax::ImportFrom { aliases: slot, .. } => *slot = aliases,
      _ => {}
    }
  }

  fn rename(&mut self, id: NodeId, new: String) {
    self.tree[id].stx = Syntax::Name { name: new };
  }

  /// Short name for a definition of `name`. Reuses the existing mapping for
  /// rebindings; top-level definitions keep their own name when requested.
  fn define(&mut self, name: &str, top_level: bool) -> String {
    if let Some(mapped) = self.mapping.get(name) {
      return mapped.clone();
    }
    let new = if top_level && self.keep_top_level {
      name.to_string()
    } else {
      self.generator.next_name()
    };
    self.mapping.insert(name.to_string(), new.clone());
    new
  }

  fn visit_stmt(&mut self, id: NodeId) {
    match &self.tree[id].stx {
      Syntax::Assign { targets, value } => {
        let (targets, value) = (targets.clone(), *value);
        for t in targets {
          self.visit_target(t);
        }
        self.visit_expr(value);
      }
      Syntax::AugAssign { target, value, .. } => {
        let (target, value) = (*target, *value);
        self.visit_expr(target);
        self.visit_expr(value);
      }
      Syntax::ExprStmt { value } => {
        let value = *value;
        self.visit_expr(value);
      }
      Syntax::ReturnStmt { value } => {
        if let Some(value) = *value {
          self.visit_expr(value);
        }
      }
      Syntax::FuncDecl { params, body, .. } => {
        let body = body.clone();
        let defaults = params.iter().filter_map(|p| p.default).collect::<Vec<_>>();
        let renamed = params
          .iter()
          .map(|p| p.name.clone())
          .collect::<Vec<_>>()
          .into_iter()
          .map(|name| self.define(&name, false))
          .collect::<Vec<_>>();
        if let Syntax::FuncDecl { params, .. } = &mut self.tree[id].stx {
          for (p, new) in params.iter_mut().zip(renamed) {
            p.name = new;
          }
        }
        for d in defaults {
          self.visit_expr(d);
        }
        let top_level = self.tree.is_top_level(id);
        if let Syntax::FuncDecl { name, .. } = &self.tree[id].stx {
          let name = name.clone();
          if !self.imported.contains(&name) {
            let new = self.define(&name, top_level);
            if let Syntax::FuncDecl { name, .. } = &mut self.tree[id].stx {
              *name = new;
            }
          }
        }
        for stmt in body {
          self.visit_stmt(stmt);
        }
      }
      Syntax::ClassDecl { bases, body, .. } => {
        let (bases, body) = (bases.clone(), body.clone());
        for b in bases {
          self.visit_expr(b);
        }
        let top_level = self.tree.is_top_level(id);
        if let Syntax::ClassDecl { name, .. } = &self.tree[id].stx {
          let name = name.clone();
          let new = self.define(&name, top_level);
          if let Syntax::ClassDecl { name, .. } = &mut self.tree[id].stx {
            *name = new;
          }
        }
        for stmt in body {
          self.visit_stmt(stmt);
        }
      }
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        let (test, consequent, alternate) = (*test, consequent.clone(), alternate.clone());
        self.visit_expr(test);
        for stmt in consequent {
          self.visit_stmt(stmt);
        }
        for stmt in alternate {
          self.visit_stmt(stmt);
        }
      }
      Syntax::WhileStmt { test, body } => {
        let (test, body) = (*test, body.clone());
        self.visit_expr(test);
        for stmt in body {
          self.visit_stmt(stmt);
        }
      }
      Syntax::ForStmt { target, iter, body } => {
        let (target, iter, body) = (*target, *iter, body.clone());
        self.visit_target(target);
        self.visit_expr(iter);
        for stmt in body {
          self.visit_stmt(stmt);
        }
      }
      Syntax::Import { .. } => self.alias_imports(id, true),
      Syntax::ImportFrom { module, .. } => {
        let module = module.clone();
        if !self.project_modules.contains(&module) {
          self.alias_imports(id, false);
        }
      }
      Syntax::PassStmt | Syntax::BreakStmt | Syntax::ContinueStmt => {}
      _ => {
        self.visit_expr(id);
      }
    }
  }

  fn visit_target(&mut self, id: NodeId) {
    match &self.tree[id].stx {
      Syntax::Name { name } => {
        let name = name.clone();
        if self.imported.contains(&name) {
          return;
        }
        let top_level = self.tree.is_top_level(id);
        let new = self.define(&name, top_level);
        self.rename(id, new);
      }
      Syntax::TupleLit { elements } | Syntax::ListLit { elements } => {
        for e in elements.clone() {
          self.visit_target(e);
        }
      }
      // Attribute and subscript targets read their base object.
      _ => self.visit_expr(id),
    }
  }

  fn visit_expr(&mut self, id: NodeId) {
    match &self.tree[id].stx {
      Syntax::Name { name } => {
        let name = name.clone();
        if self.imported.contains(&name) {
          return;
        }
        if let Some(mapped) = self.mapping.get(&name) {
          let mapped = mapped.clone();
          self.rename(id, mapped);
          return;
        }
        if self.eliminated.contains(&name) {
          let new = self.define(&name, false);
          self.rename(id, new);
          return;
        }
        if name.len() <= 1 || (self.keep_top_level && self.tree.is_top_level(id)) {
          return;
        }
        // A free name pays for its rebinding only once it is read twice; the
        // first sighting is recorded and renamed retroactively.
        match self.seen_names.remove(&name) {
          Some(first) => {
            let new = self.generator.next_name();
            let original = self.tree.create_node(Loc(0, 0), Syntax::Name { name: name.clone() });
            let target = self
              .tree
              .create_node(Loc(0, 0), Syntax::Name { name: new.clone() });
            let hoist = self.tree.create_node(Loc(0, 0), Syntax::Assign {
              targets: vec![target],
              value: original,
            });
            self.hoists.push(hoist);
            self.mapping.insert(name, new.clone());
            self.rename(first, new.clone());
            self.rename(id, new);
          }
          None => {
            self.seen_names.insert(name, id);
          }
        }
      }
      Syntax::LitStr { value } => {
        let value = value.clone();
        self.visit_string(id, value);
      }
      Syntax::Binary { left, right, .. } => {
        let (left, right) = (*left, *right);
        self.visit_expr(left);
        self.visit_expr(right);
      }
      Syntax::Unary { operand, .. } => {
        let operand = *operand;
        self.visit_expr(operand);
      }
      Syntax::Call { callee, args } => {
        let (callee, args) = (*callee, args.clone());
        // Method names are renamed only in call position; attribute reads
        // and stores may reach objects this module does not own.
        if let Syntax::Attribute { attr, .. } = &self.tree[callee].stx {
          if let Some(mapped) = self.mapping.get(attr) {
            let mapped = mapped.clone();
            if let Syntax::Attribute { attr, .. } = &mut self.tree[callee].stx {
              *attr = mapped;
            }
          }
        }
        self.visit_expr(callee);
        for a in args {
          self.visit_expr(a);
        }
      }
      Syntax::Attribute { object, .. } => {
        let object = *object;
        self.visit_expr(object);
      }
      Syntax::Subscript { object, index } => {
        let (object, index) = (*object, *index);
        self.visit_expr(object);
        self.visit_expr(index);
      }
      Syntax::TupleLit { elements } | Syntax::ListLit { elements } => {
        for e in elements.clone() {
          self.visit_expr(e);
        }
      }
      Syntax::DictLit { entries } => {
        for (k, v) in entries.clone() {
          self.visit_expr(k);
          self.visit_expr(v);
        }
      }
      Syntax::LitNum { .. } | Syntax::LitBool { .. } | Syntax::LitNone => {}
      _ => {}
    }
  }

  /// Second occurrence of a literal hoists one shared binding; both the
  /// recorded first occurrence and every later one become references to it.
  fn visit_string(&mut self, id: NodeId, value: String) {
    let pending = match self.strings.remove(&value) {
      Some(StringEntry::Hoisted(name)) => {
        self.rename(id, name.clone());
        self.strings.insert(value, StringEntry::Hoisted(name));
        return;
      }
      Some(StringEntry::Seen(mut occurrences)) => {
        occurrences.push(id);
        occurrences
      }
      None => {
        self.strings.insert(value, StringEntry::Seen(vec![id]));
        return;
      }
    };
    let new = self.generator.next_name();
    let literal = self.tree.create_node(Loc(0, 0), Syntax::LitStr {
      value: value.clone(),
    });
    let target = self
      .tree
      .create_node(Loc(0, 0), Syntax::Name { name: new.clone() });
    let hoist = self.tree.create_node(Loc(0, 0), Syntax::Assign {
      targets: vec![target],
      value: literal,
    });
    self.hoists.push(hoist);
    for occurrence in pending {
      self.rename(occurrence, new.clone());
    }
    self.strings.insert(value, StringEntry::Hoisted(new));
  }
}

pub struct ShortenPass;

impl Pass for ShortenPass {
  fn name(&self) -> &'static str {
    "shorten"
  }

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    let keep_top_level = cx.options.keep_global_variables;
    let Ctx {
      generator,
      eliminated,
      module_maps,
      ..
    } = cx;
    let generator = generator
      .as_mut()
      .expect("name generator must be initialized");
    let project_modules: HashSet<String> = modules.iter().map(|m| m.name.clone()).collect();
    for (idx, module) in modules.iter_mut().enumerate() {
      let mut shortener = Shortener {
        tree: &mut module.tree,
        generator: &mut *generator,
        eliminated: &eliminated[idx],
        project_modules: &project_modules,
        keep_top_level,
        mapping: HashMap::default(),
        imported: HashSet::default(),
        seen_names: HashMap::default(),
        strings: HashMap::default(),
        hoists: Vec::new(),
      };
      shortener.run();
      let hoists = shortener.hoists;
      module_maps[idx] = shortener.mapping;
      for hoist in hoists.iter().copied() {
        module.tree.module_body_mut().insert(0, hoist);
      }
      module.hoists = hoists;
      module.tree.link_parents();
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pass::Pipeline;
  use crate::simplify::LinkParentsPass;
  use crate::MinifyOptions;
  use parse_py::emit::emit;
  use parse_py::parse;

  fn shorten(options: MinifyOptions, sources: &[(&str, &str)]) -> (Ctx, Vec<String>) {
    let mut modules = sources
      .iter()
      .map(|(name, text)| Module {
        name: name.to_string(),
        tree: parse(text).unwrap(),
        hoists: Vec::new(),
      })
      .collect::<Vec<_>>();
    let mut cx = Ctx::new(options, modules.len());
    let mut pipeline = Pipeline::new()
      .register(Box::new(LinkParentsPass))
      .register(Box::new(CollectNamesPass))
      .register(Box::new(ShortenPass));
    pipeline.run_all(&mut cx, &mut modules).unwrap();
    let texts = modules.iter().map(|m| emit(&m.tree)).collect();
    (cx, texts)
  }

  #[test]
  fn definitions_get_generated_names_in_visit_order() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "a = 3\ndef square(x):\n    return x ** 2\n",
    )]);
    assert_eq!(texts[0], "b = 3\ndef d(c):\n    return c ** 2\n");
  }

  #[test]
  fn free_names_are_rebound_once_at_the_top() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "total = compute(compute(compute(3)))\n",
    )]);
    assert_eq!(texts[0], "b = compute\na = b(b(b(3)))\n");
  }

  #[test]
  fn repeated_strings_share_one_hoisted_binding() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "total = compute(compute(compute(3)))\nlabel = 'demiurgic'\ntag = 'demiurgic'\n",
    )]);
    assert_eq!(
      texts[0],
      "e = 'demiurgic'\nb = compute\na = b(b(b(3)))\nc = e\nd = e\n"
    );
  }

  #[test]
  fn single_use_free_names_are_left_alone() {
    let (_, texts) = shorten(MinifyOptions::new(), &[("main", "total = compute(3)\n")]);
    assert_eq!(texts[0], "a = compute(3)\n");
  }

  #[test]
  fn external_imports_are_aliased() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "from os import path\npath\n",
    )]);
    assert_eq!(texts[0], "from os import path as a\na\n");
  }

  #[test]
  fn attribute_stores_keep_their_field_names() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "count = 1\ntotal = count\nobj.count = 5\n",
    )]);
    assert_eq!(texts[0], "a = 1\nb = a\nobj.count = 5\n");
  }

  #[test]
  fn method_calls_follow_the_mapping() {
    let (_, texts) = shorten(MinifyOptions::new(), &[(
      "main",
      "def tick(x):\n    return x\nobj.tick(3)\n",
    )]);
    assert_eq!(texts[0], "def b(a):\n    return a\nobj.b(3)\n");
  }

  #[test]
  fn single_occurrence_strings_stay_inline() {
    let (_, texts) = shorten(MinifyOptions::new(), &[("main", "label = 'once'\n")]);
    assert_eq!(texts[0], "a = 'once'\n");
  }

  #[test]
  fn keep_global_variables_pins_top_level_names() {
    let (cx, texts) = shorten(
      MinifyOptions::new().with_keep_global_variables(true),
      &[("main", "def greet(x):\n    return x\n")],
    );
    assert_eq!(texts[0], "def greet(a):\n    return a\n");
    assert_eq!(cx.module_maps[0].get("greet").map(String::as_str), Some("greet"));
  }

  #[test]
  fn imported_names_are_left_for_reconciliation() {
    let (cx, texts) = shorten(MinifyOptions::new(), &[
      ("main", "def square(x):\n    return x\n"),
      ("side", "from main import square\nsquare(3)\n"),
    ]);
    assert_eq!(texts[1], "from main import square\nsquare(3)\n");
    assert!(cx.module_maps[1].is_empty());
  }

  #[test]
  fn generator_is_shared_across_modules() {
    let (_, texts) = shorten(MinifyOptions::new(), &[
      ("one", "x = 1\nx\n"),
      ("two", "y = 2\ny\n"),
    ]);
    assert_eq!(texts[0], "a = 1\na\n");
    assert_eq!(texts[1], "b = 2\nb\n");
  }

  mod properties {
    use super::*;
    use proptest::prelude::*;

    fn ident() -> impl Strategy<Value = String> {
      const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
      prop::collection::vec(prop::sample::select(CHARS.to_vec()), 3..8)
        .prop_map(|bytes| String::from_utf8(bytes).unwrap())
        .prop_filter("identifiers must not be reserved words", |s| {
          !parse_py::token::is_keyword(s)
        })
    }

    fn program() -> impl Strategy<Value = String> {
      prop::collection::vec(
        prop_oneof![
          (ident(), 0u32..100).prop_map(|(name, n)| format!("{name} = {n}")),
          (ident(), ident()).prop_map(|(f, p)| format!("def {f}({p}):\n    return {p} ** 2")),
          (ident(), ident()).prop_map(|(a, b)| format!("{a} = '{b}'\n{a}_copy = '{b}'")),
          (ident(), ident()).prop_map(|(name, free)| format!("{name} = {free}({free}(1))")),
          ident().prop_map(|module| format!("from {module} import thing")),
        ],
        1..8,
      )
      .prop_map(|stmts| {
        let mut joined = stmts.join("\n");
        joined.push('\n');
        joined
      })
    }

    proptest! {
      #![proptest_config(ProptestConfig::with_cases(64))]

      // No two distinct original names may ever share a generated name.
      #[test]
      fn rename_maps_are_injective(source in program()) {
        let (cx, _) = shorten(MinifyOptions::new(), &[("main", source.as_str())]);
        for map in &cx.module_maps {
          let mut values: Vec<&String> = map.values().collect();
          let before = values.len();
          values.sort();
          values.dedup();
          prop_assert_eq!(values.len(), before);
        }
      }
    }
  }
}
