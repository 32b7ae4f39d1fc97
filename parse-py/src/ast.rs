use crate::loc::Loc;
use std::ops::Index;
use std::ops::IndexMut;

/// Handle into a [`Tree`] arena. Stable for the lifetime of the tree, so
/// later passes can revisit nodes recorded by earlier ones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
  Or,
  And,
  Eq,
  NotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  In,
  NotIn,
  Is,
  IsNot,
  Add,
  Sub,
  Mul,
  Div,
  FloorDiv,
  Mod,
  Pow,
}

impl BinOp {
  pub fn as_str(self) -> &'static str {
    match self {
      BinOp::Or => "or",
      BinOp::And => "and",
      BinOp::Eq => "==",
      BinOp::NotEq => "!=",
      BinOp::Lt => "<",
      BinOp::LtEq => "<=",
      BinOp::Gt => ">",
      BinOp::GtEq => ">=",
      BinOp::In => "in",
      BinOp::NotIn => "not in",
      BinOp::Is => "is",
      BinOp::IsNot => "is not",
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
      BinOp::FloorDiv => "//",
      BinOp::Mod => "%",
      BinOp::Pow => "**",
    }
  }

  pub fn precedence(self) -> u8 {
    match self {
      BinOp::Or => 1,
      BinOp::And => 2,
      BinOp::Eq
      | BinOp::NotEq
      | BinOp::Lt
      | BinOp::LtEq
      | BinOp::Gt
      | BinOp::GtEq
      | BinOp::In
      | BinOp::NotIn
      | BinOp::Is
      | BinOp::IsNot => 4,
      BinOp::Add | BinOp::Sub => 5,
      BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 6,
      BinOp::Pow => 8,
    }
  }

  pub fn is_right_associative(self) -> bool {
    matches!(self, BinOp::Pow)
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
  Not,
  Pos,
  Neg,
}

impl UnaryOp {
  pub fn as_str(self) -> &'static str {
    match self {
      UnaryOp::Not => "not ",
      UnaryOp::Pos => "+",
      UnaryOp::Neg => "-",
    }
  }

  pub fn precedence(self) -> u8 {
    match self {
      UnaryOp::Not => 3,
      UnaryOp::Pos | UnaryOp::Neg => 7,
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamKind {
  Positional,
  Vararg,
  KwVararg,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Param {
  pub name: String,
  pub kind: ParamKind,
  pub default: Option<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImportAlias {
  pub name: String,
  pub asname: Option<String>,
}

impl ImportAlias {
  /// The name the import binds in the importing scope.
  pub fn bound_name(&self) -> &str {
    self.asname.as_deref().unwrap_or(&self.name)
  }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Syntax {
  // Statements.
  Module {
    body: Vec<NodeId>,
  },
  FuncDecl {
    name: String,
    params: Vec<Param>,
    body: Vec<NodeId>,
  },
  ClassDecl {
    name: String,
    bases: Vec<NodeId>,
    body: Vec<NodeId>,
  },
  ReturnStmt {
    value: Option<NodeId>,
  },
  Assign {
    targets: Vec<NodeId>,
    value: NodeId,
  },
  AugAssign {
    target: NodeId,
    op: BinOp,
    value: NodeId,
  },
  ExprStmt {
    value: NodeId,
  },
  IfStmt {
    test: NodeId,
    consequent: Vec<NodeId>,
    alternate: Vec<NodeId>,
  },
  WhileStmt {
    test: NodeId,
    body: Vec<NodeId>,
  },
  ForStmt {
    target: NodeId,
    iter: NodeId,
    body: Vec<NodeId>,
  },
  Import {
    aliases: Vec<ImportAlias>,
  },
  ImportFrom {
    module: String,
    aliases: Vec<ImportAlias>,
  },
  PassStmt,
  BreakStmt,
  ContinueStmt,

  // Expressions.
  Name {
    name: String,
  },
  LitNum {
    raw: String,
  },
  LitStr {
    value: String,
  },
  LitBool {
    value: bool,
  },
  LitNone,
  Binary {
    op: BinOp,
    left: NodeId,
    right: NodeId,
  },
  Unary {
    op: UnaryOp,
    operand: NodeId,
  },
  Call {
    callee: NodeId,
    args: Vec<NodeId>,
  },
  Attribute {
    object: NodeId,
    attr: String,
  },
  Subscript {
    object: NodeId,
    index: NodeId,
  },
  ListLit {
    elements: Vec<NodeId>,
  },
  TupleLit {
    elements: Vec<NodeId>,
  },
  DictLit {
    entries: Vec<(NodeId, NodeId)>,
  },
}

impl Syntax {
  pub fn is_statement(&self) -> bool {
    matches!(
      self,
      Syntax::Module { .. }
        | Syntax::FuncDecl { .. }
        | Syntax::ClassDecl { .. }
        | Syntax::ReturnStmt { .. }
        | Syntax::Assign { .. }
        | Syntax::AugAssign { .. }
        | Syntax::ExprStmt { .. }
        | Syntax::IfStmt { .. }
        | Syntax::WhileStmt { .. }
        | Syntax::ForStmt { .. }
        | Syntax::Import { .. }
        | Syntax::ImportFrom { .. }
        | Syntax::PassStmt
        | Syntax::BreakStmt
        | Syntax::ContinueStmt
    )
  }

  pub fn child_ids(&self) -> Vec<NodeId> {
    let mut out = Vec::new();
    self.for_each_child(|id| out.push(id));
    out
  }

  pub fn for_each_child(&self, mut f: impl FnMut(NodeId)) {
    match self {
      Syntax::Module { body } => body.iter().copied().for_each(&mut f),
      Syntax::FuncDecl { params, body, .. } => {
        for p in params {
          if let Some(d) = p.default {
            f(d);
          }
        }
        body.iter().copied().for_each(&mut f);
      }
      Syntax::ClassDecl { bases, body, .. } => {
        bases.iter().copied().for_each(&mut f);
        body.iter().copied().for_each(&mut f);
      }
      Syntax::ReturnStmt { value } => {
        if let Some(v) = value {
          f(*v);
        }
      }
      Syntax::Assign { targets, value } => {
        targets.iter().copied().for_each(&mut f);
        f(*value);
      }
      Syntax::AugAssign { target, value, .. } => {
        f(*target);
        f(*value);
      }
      Syntax::ExprStmt { value } => f(*value),
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        f(*test);
        consequent.iter().copied().for_each(&mut f);
        alternate.iter().copied().for_each(&mut f);
      }
      Syntax::WhileStmt { test, body } => {
        f(*test);
        body.iter().copied().for_each(&mut f);
      }
      Syntax::ForStmt { target, iter, body } => {
        f(*target);
        f(*iter);
        body.iter().copied().for_each(&mut f);
      }
      Syntax::Import { .. }
      | Syntax::ImportFrom { .. }
      | Syntax::PassStmt
      | Syntax::BreakStmt
      | Syntax::ContinueStmt
      | Syntax::Name { .. }
      | Syntax::LitNum { .. }
      | Syntax::LitStr { .. }
      | Syntax::LitBool { .. }
      | Syntax::LitNone => {}
      Syntax::Binary { left, right, .. } => {
        f(*left);
        f(*right);
      }
      Syntax::Unary { operand, .. } => f(*operand),
      Syntax::Call { callee, args } => {
        f(*callee);
        args.iter().copied().for_each(&mut f);
      }
      Syntax::Attribute { object, .. } => f(*object),
      Syntax::Subscript { object, index } => {
        f(*object);
        f(*index);
      }
      Syntax::ListLit { elements } | Syntax::TupleLit { elements } => {
        elements.iter().copied().for_each(&mut f)
      }
      Syntax::DictLit { entries } => {
        for (k, v) in entries {
          f(*k);
          f(*v);
        }
      }
    }
  }

  /// The statement lists this node owns, if any.
  pub fn body_lists(&self) -> Vec<&Vec<NodeId>> {
    match self {
      Syntax::Module { body }
      | Syntax::FuncDecl { body, .. }
      | Syntax::ClassDecl { body, .. }
      | Syntax::WhileStmt { body, .. }
      | Syntax::ForStmt { body, .. } => vec![body],
      Syntax::IfStmt {
        consequent,
        alternate,
        ..
      } => vec![consequent, alternate],
      _ => Vec::new(),
    }
  }

  pub fn body_lists_mut(&mut self) -> Vec<&mut Vec<NodeId>> {
    match self {
      Syntax::Module { body }
      | Syntax::FuncDecl { body, .. }
      | Syntax::ClassDecl { body, .. }
      | Syntax::WhileStmt { body, .. }
      | Syntax::ForStmt { body, .. } => vec![body],
      Syntax::IfStmt {
        consequent,
        alternate,
        ..
      } => vec![consequent, alternate],
      _ => Vec::new(),
    }
  }

  pub fn remap_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
    match self {
      Syntax::Module { body } => body.iter_mut().for_each(|id| *id = f(*id)),
      Syntax::FuncDecl { params, body, .. } => {
        for p in params.iter_mut() {
          if let Some(d) = p.default.as_mut() {
            *d = f(*d);
          }
        }
        body.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::ClassDecl { bases, body, .. } => {
        bases.iter_mut().for_each(|id| *id = f(*id));
        body.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::ReturnStmt { value } => {
        if let Some(v) = value.as_mut() {
          *v = f(*v);
        }
      }
      Syntax::Assign { targets, value } => {
        targets.iter_mut().for_each(|id| *id = f(*id));
        *value = f(*value);
      }
      Syntax::AugAssign { target, value, .. } => {
        *target = f(*target);
        *value = f(*value);
      }
      Syntax::ExprStmt { value } => *value = f(*value),
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        *test = f(*test);
        consequent.iter_mut().for_each(|id| *id = f(*id));
        alternate.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::WhileStmt { test, body } => {
        *test = f(*test);
        body.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::ForStmt { target, iter, body } => {
        *target = f(*target);
        *iter = f(*iter);
        body.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::Import { .. }
      | Syntax::ImportFrom { .. }
      | Syntax::PassStmt
      | Syntax::BreakStmt
      | Syntax::ContinueStmt
      | Syntax::Name { .. }
      | Syntax::LitNum { .. }
      | Syntax::LitStr { .. }
      | Syntax::LitBool { .. }
      | Syntax::LitNone => {}
      Syntax::Binary { left, right, .. } => {
        *left = f(*left);
        *right = f(*right);
      }
      Syntax::Unary { operand, .. } => *operand = f(*operand),
      Syntax::Call { callee, args } => {
        *callee = f(*callee);
        args.iter_mut().for_each(|id| *id = f(*id));
      }
      Syntax::Attribute { object, .. } => *object = f(*object),
      Syntax::Subscript { object, index } => {
        *object = f(*object);
        *index = f(*index);
      }
      Syntax::ListLit { elements } | Syntax::TupleLit { elements } => {
        elements.iter_mut().for_each(|id| *id = f(*id))
      }
      Syntax::DictLit { entries } => {
        for (k, v) in entries.iter_mut() {
          *k = f(*k);
          *v = f(*v);
        }
      }
    }
  }
}

#[derive(Clone, Debug)]
pub struct Node {
  pub loc: Loc,
  pub parent: Option<NodeId>,
  pub stx: Syntax,
}

/// Arena of AST nodes for one module. All node handles index into the owning
/// tree; nodes detached by rewrites stay allocated but unreachable.
#[derive(Clone, Debug)]
pub struct Tree {
  nodes: Vec<Node>,
  root: NodeId,
}

impl Tree {
  pub fn new() -> Tree {
    Tree {
      nodes: Vec::new(),
      root: NodeId(0),
    }
  }

  pub fn create_node(&mut self, loc: Loc, stx: Syntax) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(Node {
      loc,
      parent: None,
      stx,
    });
    id
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn set_root(&mut self, root: NodeId) {
    self.root = root;
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Recomputes parent links for every node reachable from the root. Must be
  /// rerun after structural rewrites for `is_top_level` to stay accurate.
  pub fn link_parents(&mut self) {
    let mut stack = vec![self.root];
    while let Some(id) = stack.pop() {
      for child in self[id].stx.child_ids() {
        self[child].parent = Some(id);
        stack.push(child);
      }
    }
  }

  /// True if the statement holding this node sits directly in the module body.
  pub fn is_top_level(&self, id: NodeId) -> bool {
    let mut at = id;
    while let Some(parent) = self[at].parent {
      if matches!(self[parent].stx, Syntax::Module { .. }) {
        return true;
      }
      if self[at].stx.is_statement() {
        return false;
      }
      at = parent;
    }
    at == self.root
  }

  pub fn module_body(&self) -> &[NodeId] {
    match &self[self.root].stx {
      Syntax::Module { body } => body,
      _ => &[],
    }
  }

  pub fn module_body_mut(&mut self) -> &mut Vec<NodeId> {
    let root = self.root;
    match &mut self[root].stx {
      Syntax::Module { body } => body,
      _ => unreachable!("tree root must be a module"),
    }
  }

  /// Preorder walk of `id` and everything beneath it.
  pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(at) = stack.pop() {
      out.push(at);
      let mut children = self[at].stx.child_ids();
      children.reverse();
      stack.extend(children);
    }
    out
  }

  /// Grafts every node of `other` into this arena and returns `other`'s
  /// module body statements remapped to their new handles.
  pub fn import_from(&mut self, other: &Tree) -> Vec<NodeId> {
    let offset = self.nodes.len() as u32;
    for node in &other.nodes {
      let mut grafted = node.clone();
      grafted.parent = grafted.parent.map(|p| NodeId(p.0 + offset));
      grafted.stx.remap_children(|id| NodeId(id.0 + offset));
      self.nodes.push(grafted);
    }
    other
      .module_body()
      .iter()
      .map(|id| NodeId(id.0 + offset))
      .collect()
  }
}

impl Default for Tree {
  fn default() -> Self {
    Tree::new()
  }
}

impl Index<NodeId> for Tree {
  type Output = Node;

  fn index(&self, id: NodeId) -> &Node {
    &self.nodes[id.index()]
  }
}

impl IndexMut<NodeId> for Tree {
  fn index_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.index()]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leaf(tree: &mut Tree, stx: Syntax) -> NodeId {
    tree.create_node(Loc(0, 0), stx)
  }

  fn module_of(tree: &mut Tree, body: Vec<NodeId>) -> NodeId {
    let root = tree.create_node(Loc(0, 0), Syntax::Module { body });
    tree.set_root(root);
    tree.link_parents();
    root
  }

  #[test]
  fn link_parents_reaches_nested_expressions() {
    let mut tree = Tree::new();
    let name = leaf(&mut tree, Syntax::Name { name: "x".into() });
    let value = leaf(&mut tree, Syntax::LitNum { raw: "1".into() });
    let assign = leaf(&mut tree, Syntax::Assign {
      targets: vec![name],
      value,
    });
    let root = module_of(&mut tree, vec![assign]);
    assert_eq!(tree[assign].parent, Some(root));
    assert_eq!(tree[name].parent, Some(assign));
    assert_eq!(tree[value].parent, Some(assign));
  }

  #[test]
  fn top_level_is_scoped_to_the_module_body() {
    let mut tree = Tree::new();
    let inner_name = leaf(&mut tree, Syntax::Name { name: "x".into() });
    let ret = leaf(&mut tree, Syntax::ReturnStmt {
      value: Some(inner_name),
    });
    let func = leaf(&mut tree, Syntax::FuncDecl {
      name: "f".into(),
      params: vec![],
      body: vec![ret],
    });
    let outer_name = leaf(&mut tree, Syntax::Name { name: "y".into() });
    let value = leaf(&mut tree, Syntax::LitNum { raw: "2".into() });
    let assign = leaf(&mut tree, Syntax::Assign {
      targets: vec![outer_name],
      value,
    });
    module_of(&mut tree, vec![func, assign]);
    assert!(tree.is_top_level(outer_name));
    assert!(tree.is_top_level(func));
    assert!(!tree.is_top_level(inner_name));
  }

  #[test]
  fn import_from_remaps_grafted_handles() {
    let mut a = Tree::new();
    let a_name = leaf(&mut a, Syntax::Name { name: "a".into() });
    let a_stmt = leaf(&mut a, Syntax::ExprStmt { value: a_name });
    module_of(&mut a, vec![a_stmt]);

    let mut b = Tree::new();
    let b_name = leaf(&mut b, Syntax::Name { name: "b".into() });
    let b_stmt = leaf(&mut b, Syntax::ExprStmt { value: b_name });
    module_of(&mut b, vec![b_stmt]);

    let grafted = a.import_from(&b);
    assert_eq!(grafted.len(), 1);
    let Syntax::ExprStmt { value } = &a[grafted[0]].stx else {
      panic!("grafted statement changed shape");
    };
    assert_eq!(a[*value].stx, Syntax::Name { name: "b".into() });
  }

  #[test]
  fn descendants_walk_in_preorder() {
    let mut tree = Tree::new();
    let left = leaf(&mut tree, Syntax::LitNum { raw: "1".into() });
    let right = leaf(&mut tree, Syntax::LitNum { raw: "2".into() });
    let sum = leaf(&mut tree, Syntax::Binary {
      op: BinOp::Add,
      left,
      right,
    });
    let stmt = leaf(&mut tree, Syntax::ExprStmt { value: sum });
    let root = module_of(&mut tree, vec![stmt]);
    assert_eq!(tree.descendants(root), vec![root, stmt, sum, left, right]);
  }
}
