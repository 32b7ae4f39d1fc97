use crate::err::MinifyError;
use crate::pass::Ctx;
use crate::pass::Pass;
use crate::Module;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use parse_py::ast::NodeId;
use parse_py::ast::Syntax;
use parse_py::ast::Tree;
use parse_py::loc::Loc;

/// Recomputes parent links on every module. Must run before any pass that
/// asks whether a node is top level, and again after structural rewrites.
pub struct LinkParentsPass;

impl Pass for LinkParentsPass {
  fn name(&self) -> &'static str {
    "link_parents"
  }

  fn run(&mut self, _cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    for module in modules.iter_mut() {
      module.tree.link_parents();
    }
    Ok(())
  }
}

fn is_const_expr_stmt(tree: &Tree, id: NodeId) -> bool {
  match &tree[id].stx {
    Syntax::ExprStmt { value } => matches!(
      tree[*value].stx,
      Syntax::LitStr { .. } | Syntax::LitNum { .. } | Syntax::LitBool { .. } | Syntax::LitNone
    ),
    _ => false,
  }
}

fn placeholder_stmt(tree: &mut Tree) -> NodeId {
  let zero = tree.create_node(Loc(0, 0), Syntax::LitNum { raw: "0".into() });
  tree.create_node(Loc(0, 0), Syntax::ExprStmt { value: zero })
}

/// Drops docstrings and other bare constant statements. A suite reduced to
/// nothing gets a `0` placeholder so it still parses.
pub struct StripDocstringsPass;

impl Pass for StripDocstringsPass {
  fn name(&self) -> &'static str {
    "strip_docstrings"
  }

  fn run(&mut self, _cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    for module in modules.iter_mut() {
      let tree = &mut module.tree;
      for id in tree.descendants(tree.root()) {
        let lists = tree[id]
          .stx
          .body_lists()
          .into_iter()
          .cloned()
          .collect::<Vec<_>>();
        if lists.is_empty() {
          continue;
        }
        let mut rewritten = Vec::with_capacity(lists.len());
        for list in lists {
          let mut kept = list
            .iter()
            .copied()
            .filter(|stmt| !is_const_expr_stmt(tree, *stmt))
            .collect::<Vec<_>>();
          if kept.is_empty() && !list.is_empty() {
            kept.push(placeholder_stmt(tree));
          }
          rewritten.push(kept);
        }
        let mut rewritten = rewritten.into_iter();
        for list in tree[id].stx.body_lists_mut() {
          *list = rewritten.next().unwrap();
        }
      }
      tree.link_parents();
    }
    Ok(())
  }
}

/// Folds `return name` into the expression last assigned to `name`, walking
/// the module in document order. The folded name is recorded so the store
/// elimination pass can delete its assignments. Returning a name with no
/// recorded assignment (a parameter, usually) is left alone.
pub struct ReturnFoldPass;

impl Pass for ReturnFoldPass {
  fn name(&self) -> &'static str {
    "return_fold"
  }

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    for (idx, module) in modules.iter_mut().enumerate() {
      let tree = &mut module.tree;
      let mut producers: HashMap<String, NodeId> = HashMap::new();
      let mut folded_names = HashSet::default();
      for id in tree.descendants(tree.root()) {
        let returned = match &tree[id].stx {
          Syntax::Assign { targets, .. } if targets.len() == 1 => {
            if let Syntax::Name { name } = &tree[targets[0]].stx {
              producers.insert(name.clone(), id);
            }
            continue;
          }
          Syntax::ReturnStmt { value: Some(value) } => *value,
          _ => continue,
        };
        let name = match &tree[returned].stx {
          Syntax::Name { name } => name.clone(),
          _ => continue,
        };
        let Some(producer) = producers.get(&name).copied() else {
          continue;
        };
        let folded = match &tree[producer].stx {
          Syntax::Assign { value, .. } => *value,
          _ => {
            return Err(MinifyError::InternalInvariant {
              module: module.name.clone(),
              detail: format!("recorded producer of `{}` is not an assignment", name),
            })
          }
        };
        let Syntax::ReturnStmt { value } = &mut tree[id].stx else {
          unreachable!();
        };
        *value = Some(folded);
        folded_names.insert(name);
      }
      cx.eliminated[idx] = folded_names;
    }
    Ok(())
  }
}

/// Deletes every single-target assignment to a name the return folder
/// consumed. A suite emptied this way keeps a `0` placeholder.
pub struct DeadStorePass;

impl Pass for DeadStorePass {
  fn name(&self) -> &'static str {
    "dead_stores"
  }

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    let keep_top_level = cx.options.keep_global_variables;
    for (idx, module) in modules.iter_mut().enumerate() {
      let tree = &mut module.tree;
      let eliminated = &cx.eliminated[idx];
      for id in tree.descendants(tree.root()) {
        let lists = tree[id]
          .stx
          .body_lists()
          .into_iter()
          .cloned()
          .collect::<Vec<_>>();
        if lists.is_empty() {
          continue;
        }
        let top_level = matches!(tree[id].stx, Syntax::Module { .. });
        let mut rewritten = Vec::with_capacity(lists.len());
        for list in lists {
          let mut kept = Vec::with_capacity(list.len());
          for stmt in list.iter().copied() {
            let dead = match &tree[stmt].stx {
              Syntax::Assign { targets, .. } if targets.len() == 1 => {
                matches!(&tree[targets[0]].stx, Syntax::Name { name } if eliminated.contains(name))
              }
              _ => false,
            };
            if !dead || (top_level && keep_top_level) {
              kept.push(stmt);
            }
          }
          if kept.is_empty() && !list.is_empty() {
            kept.push(placeholder_stmt(tree));
          }
          rewritten.push(kept);
        }
        let mut rewritten = rewritten.into_iter();
        for list in tree[id].stx.body_lists_mut() {
          *list = rewritten.next().unwrap();
        }
      }
      tree.link_parents();
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::MinifyOptions;
  use parse_py::emit::emit;
  use parse_py::parse;

  fn module_of(source: &str) -> Module {
    Module {
      name: "main".to_string(),
      tree: parse(source).unwrap(),
      hoists: Vec::new(),
    }
  }

  fn run_pass(pass: &mut dyn Pass, source: &str) -> (Ctx, String) {
    let mut modules = vec![module_of(source)];
    let mut cx = Ctx::new(MinifyOptions::new(), modules.len());
    LinkParentsPass.run(&mut cx, &mut modules).unwrap();
    pass.run(&mut cx, &mut modules).unwrap();
    let text = emit(&modules[0].tree);
    (cx, text)
  }

  #[test]
  fn docstrings_are_stripped() {
    let (_, text) = run_pass(
      &mut StripDocstringsPass,
      "'module doc'\ndef f(x):\n    'doc'\n    return x\n",
    );
    assert_eq!(text, "def f(x):\n    return x\n");
  }

  #[test]
  fn emptied_suite_gets_a_placeholder() {
    let (_, text) = run_pass(&mut StripDocstringsPass, "def f():\n    'doc only'\n");
    assert_eq!(text, "def f():\n    0\n");
  }

  fn run_simplify(options: MinifyOptions, source: &str) -> (Ctx, String) {
    let mut modules = vec![module_of(source)];
    let mut cx = Ctx::new(options, modules.len());
    LinkParentsPass.run(&mut cx, &mut modules).unwrap();
    ReturnFoldPass.run(&mut cx, &mut modules).unwrap();
    DeadStorePass.run(&mut cx, &mut modules).unwrap();
    let text = emit(&modules[0].tree);
    (cx, text)
  }

  #[test]
  fn return_of_local_assignment_is_folded() {
    let (cx, text) = run_simplify(
      MinifyOptions::new(),
      "def f(x):\n    y = x * 2\n    return y\n",
    );
    assert_eq!(text, "def f(x):\n    return x * 2\n");
    assert!(cx.eliminated[0].contains("y"));
  }

  #[test]
  fn returned_parameter_is_left_alone() {
    let source = "def f(x):\n    return x\n";
    let (cx, text) = run_simplify(MinifyOptions::new(), source);
    assert_eq!(text, source);
    assert!(cx.eliminated[0].is_empty());
  }

  #[test]
  fn later_reassignment_wins_the_fold() {
    let (_, text) = run_simplify(
      MinifyOptions::new(),
      "def f(x):\n    y = 1\n    y = x\n    return y\n",
    );
    // Every store to the folded name goes, including earlier ones.
    assert_eq!(text, "def f(x):\n    return x\n");
  }

  #[test]
  fn unfolded_stores_are_never_deleted() {
    let source = "a = 3\ndef square(x):\n    return x ** 2\n";
    let (cx, text) = run_simplify(MinifyOptions::new(), source);
    assert_eq!(text, source);
    assert!(cx.eliminated[0].is_empty());
  }

  #[test]
  fn folding_works_across_nesting() {
    let (_, text) = run_simplify(
      MinifyOptions::new(),
      "def f(x):\n    y = x * 2\n    if g():\n        return y\n",
    );
    assert_eq!(text, "def f(x):\n    if g():\n        return x * 2\n");
  }

  #[test]
  fn emptied_suite_keeps_a_placeholder() {
    let (_, text) = run_simplify(
      MinifyOptions::new(),
      "def f():\n    if g():\n        y = 1\n    return y\n",
    );
    assert_eq!(text, "def f():\n    if g():\n        0\n    return 1\n");
  }

  #[test]
  fn keep_global_variables_protects_top_level_stores() {
    let (cx, text) = run_simplify(
      MinifyOptions::new().with_keep_global_variables(true),
      "y = 1\ndef f():\n    return y\n",
    );
    assert_eq!(text, "y = 1\ndef f():\n    return 1\n");
    assert!(cx.eliminated[0].contains("y"));
  }
}
