use crate::err::MinifyError;
use crate::pass::Ctx;
use crate::pass::Pass;
use crate::Module;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use parse_py::ast::ImportAlias;
use parse_py::ast::NodeId;
use parse_py::ast::Syntax;

/// Reconciles renaming decisions across the module set: renames the modules
/// themselves, rewrites import statements against the exporting module's
/// rename map, patches remaining references, and optionally concatenates
/// everything into the first module.
pub struct FusePass;

impl FusePass {
  fn reconcile_imports(
    cx: &Ctx,
    module: &mut Module,
    index_by_original: &HashMap<String, usize>,
  ) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let ids = module.tree.descendants(module.tree.root());
    for id in ids {
      match &module.tree[id].stx {
        Syntax::ImportFrom {
          module: source,
          aliases,
        } => {
          let Some(renamed) = cx.module_renames.get(source) else {
            continue;
          };
          let source_map = &cx.module_maps[index_by_original[source]];
          let new_aliases = aliases
            .iter()
            .map(|a| {
              let old_bound = a.bound_name().to_string();
              let new_name = source_map.get(&a.name).cloned().unwrap_or(a.name.clone());
              let alias = ImportAlias {
                name: new_name,
                asname: a.asname.clone(),
              };
              entries.insert(old_bound, alias.bound_name().to_string());
              alias
            })
            .collect::<Vec<_>>();
          module.tree[id].stx = Syntax::ImportFrom {
            module: renamed.clone(),
            aliases: new_aliases,
          };
        }
        Syntax::Import { aliases } => {
          if !aliases.iter().any(|a| cx.module_renames.contains_key(&a.name)) {
            continue;
          }
          let new_aliases = aliases
            .iter()
            .map(|a| {
              let old_bound = a.bound_name().to_string();
              let alias = match cx.module_renames.get(&a.name) {
                Some(renamed) => ImportAlias {
                  name: renamed.clone(),
                  asname: a.asname.clone(),
                },
                None => a.clone(),
              };
              entries.insert(old_bound, alias.bound_name().to_string());
              alias
            })
            .collect::<Vec<_>>();
          module.tree[id].stx = Syntax::Import {
            aliases: new_aliases,
          };
        }
        _ => {}
      }
    }
    entries
  }

  /// Rewrites references the per-module shortener had to leave alone, mainly
  /// names bound by imports. Hoisted bindings keep their right-hand side, and
  /// names the generator issued are already final.
  fn apply(cx: &Ctx, module: &mut Module, idx: usize, entries: &HashMap<String, String>) {
    let mut skip: HashSet<NodeId> = HashSet::default();
    for hoist in module.hoists.iter().copied() {
      skip.extend(module.tree.descendants(hoist));
    }
    for id in module.tree.descendants(module.tree.root()) {
      if skip.contains(&id) {
        continue;
      }
      let Syntax::Name { name } = &module.tree[id].stx else {
        continue;
      };
      if cx.generator().was_issued(name) {
        continue;
      }
      let replacement = entries
        .get(name)
        .or_else(|| cx.module_maps[idx].get(name))
        .cloned();
      if let Some(replacement) = replacement {
        if replacement != *name {
          module.tree[id].stx = Syntax::Name { name: replacement };
        }
      }
    }
  }
}

impl Pass for FusePass {
  fn name(&self) -> &'static str {
    "fuse"
  }

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    let index_by_original: HashMap<String, usize> = modules
      .iter()
      .enumerate()
      .map(|(i, m)| (m.name.clone(), i))
      .collect();
    for module in modules.iter_mut() {
      let new = if cx.options.keep_module_names {
        module.name.clone()
      } else {
        cx.generator_mut().next_name()
      };
      cx.module_renames.insert(module.name.clone(), new.clone());
      module.name = new;
    }
    for (idx, module) in modules.iter_mut().enumerate() {
      let entries = Self::reconcile_imports(cx, module, &index_by_original);
      Self::apply(cx, module, idx, &entries);
      module.tree.link_parents();
    }
    if cx.options.single_file && modules.len() > 1 {
      let rest = modules.split_off(1);
      let fused = &mut modules[0];
      for module in &rest {
        let grafted = fused.tree.import_from(&module.tree);
        fused.tree.module_body_mut().extend(grafted);
      }
      fused.tree.link_parents();
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pass::Pipeline;
  use crate::shorten::CollectNamesPass;
  use crate::shorten::ShortenPass;
  use crate::simplify::LinkParentsPass;
  use crate::MinifyOptions;
  use parse_py::emit::emit;
  use parse_py::parse;

  fn fuse(options: MinifyOptions, sources: &[(&str, &str)]) -> Vec<(String, String)> {
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
      .register(Box::new(ShortenPass))
      .register(Box::new(FusePass));
    pipeline.run_all(&mut cx, &mut modules).unwrap();
    modules
      .into_iter()
      .map(|m| (m.name, emit(&m.tree)))
      .collect()
  }

  #[test]
  fn imports_are_rewritten_against_the_source_module() {
    let out = fuse(MinifyOptions::new(), &[
      ("main", "a = 3\ndef square(x):\n    return x ** 2\n"),
      ("side", "from main import square\nsquare(3)\n"),
    ]);
    assert_eq!(out[0], ("e".to_string(), "b = 3\ndef d(c):\n    return c ** 2\n".to_string()));
    assert_eq!(out[1], ("f".to_string(), "from e import d\nd(3)\n".to_string()));
  }

  #[test]
  fn keep_module_names_leaves_imports_addressable() {
    let out = fuse(MinifyOptions::new().with_keep_module_names(true), &[
      ("main", "def square(x):\n    return x\n"),
      ("side", "from main import square\nsquare(3)\n"),
    ]);
    assert_eq!(out[0].0, "main");
    assert_eq!(out[1].1, "from main import b\nb(3)\n");
  }

  #[test]
  fn aliased_imports_keep_their_local_binding() {
    let out = fuse(MinifyOptions::new(), &[
      ("main", "def square(x):\n    return x\n"),
      ("side", "from main import square as sq\nsq(3)\n"),
    ]);
    assert_eq!(out[1].1, "from c import b as sq\nsq(3)\n");
  }

  #[test]
  fn external_imports_keep_their_module_path() {
    let out = fuse(MinifyOptions::new(), &[(
      "main",
      "from os import path\npath\n",
    )]);
    assert_eq!(out[0].1, "from os import path as a\na\n");
  }

  #[test]
  fn single_file_concatenates_in_input_order() {
    let out = fuse(MinifyOptions::new().with_single_file(true), &[
      ("main", "a = 3\ndef square(x):\n    return x ** 2\n"),
      ("side", "from main import square\nsquare(3)\n"),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0, "e");
    assert_eq!(
      out[0].1,
      "b = 3\ndef d(c):\n    return c ** 2\nfrom e import d\nd(3)\n"
    );
  }

  #[test]
  fn hoisted_rebindings_keep_their_source_name() {
    let out = fuse(MinifyOptions::new(), &[("main", "total = compute(compute(3))\n")]);
    assert_eq!(out[0].1, "b = compute\na = b(b(3))\n");
  }
}
