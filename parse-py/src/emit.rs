use crate::ast::NodeId;
use crate::ast::ParamKind;
use crate::ast::Syntax;
use crate::ast::Tree;

const INDENT: &str = "    ";

/// Renders a tree back to source. Output is canonical: four-space indents,
/// one statement per line, parentheses only where precedence demands them.
pub fn emit(tree: &Tree) -> String {
  let mut emitter = Emitter {
    tree,
    out: String::new(),
  };
  for stmt in tree.module_body() {
    emitter.emit_stmt(*stmt, 0);
  }
  emitter.out
}

pub fn quote_str(value: &str) -> String {
  let quote = if value.contains('\'') && !value.contains('"') {
    '"'
  } else {
    '\''
  };
  let mut out = String::with_capacity(value.len() + 2);
  out.push(quote);
  for c in value.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      c if c == quote => {
        out.push('\\');
        out.push(c);
      }
      c => out.push(c),
    }
  }
  out.push(quote);
  out
}

struct Emitter<'a> {
  tree: &'a Tree,
  out: String,
}

impl<'a> Emitter<'a> {
  fn line(&mut self, level: usize, text: &str) {
    for _ in 0..level {
      self.out.push_str(INDENT);
    }
    self.out.push_str(text);
    self.out.push('\n');
  }

  fn emit_body(&mut self, body: &[NodeId], level: usize) {
    for stmt in body {
      self.emit_stmt(*stmt, level);
    }
  }

  fn emit_stmt(&mut self, id: NodeId, level: usize) {
    match &self.tree[id].stx {
      Syntax::Module { body } => self.emit_body(body, level),
      Syntax::FuncDecl { name, params, body } => {
        let mut rendered = Vec::with_capacity(params.len());
        for p in params {
          let mut s = match p.kind {
            ParamKind::Positional => String::new(),
            ParamKind::Vararg => "*".to_string(),
            ParamKind::KwVararg => "**".to_string(),
          };
          s.push_str(&p.name);
          if let Some(default) = p.default {
            s.push('=');
            s.push_str(&self.expr(default, 0));
          }
          rendered.push(s);
        }
        self.line(level, &format!("def {}({}):", name, rendered.join(", ")));
        self.emit_body(body, level + 1);
      }
      Syntax::ClassDecl { name, bases, body } => {
        let header = if bases.is_empty() {
          format!("class {}:", name)
        } else {
          let bases = bases
            .iter()
            .map(|b| self.expr(*b, 0))
            .collect::<Vec<_>>()
            .join(", ");
          format!("class {}({}):", name, bases)
        };
        self.line(level, &header);
        self.emit_body(body, level + 1);
      }
      Syntax::ReturnStmt { value } => match value {
        Some(v) => {
          let v = self.expr(*v, 0);
          self.line(level, &format!("return {}", v));
        }
        None => self.line(level, "return"),
      },
      Syntax::Assign { targets, value } => {
        let mut parts = targets
          .iter()
          .map(|t| self.expr(*t, 0))
          .collect::<Vec<_>>();
        parts.push(self.expr(*value, 0));
        self.line(level, &parts.join(" = "));
      }
      Syntax::AugAssign { target, op, value } => {
        let target = self.expr(*target, 0);
        let value = self.expr(*value, 0);
        self.line(level, &format!("{} {}= {}", target, op.as_str(), value));
      }
      Syntax::ExprStmt { value } => {
        let value = self.expr(*value, 0);
        self.line(level, &value);
      }
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => self.emit_if(level, "if", *test, consequent, alternate),
      Syntax::WhileStmt { test, body } => {
        let test = self.expr(*test, 0);
        self.line(level, &format!("while {}:", test));
        self.emit_body(body, level + 1);
      }
      Syntax::ForStmt { target, iter, body } => {
        let target = self.expr(*target, 0);
        let iter = self.expr(*iter, 0);
        self.line(level, &format!("for {} in {}:", target, iter));
        self.emit_body(body, level + 1);
      }
      Syntax::Import { aliases } => {
        let aliases = aliases
          .iter()
          .map(|a| match &a.asname {
            Some(asname) => format!("{} as {}", a.name, asname),
            None => a.name.clone(),
          })
          .collect::<Vec<_>>()
          .join(", ");
        self.line(level, &format!("import {}", aliases));
      }
      Syntax::ImportFrom { module, aliases } => {
        let aliases = aliases
          .iter()
          .map(|a| match &a.asname {
            Some(asname) => format!("{} as {}", a.name, asname),
            None => a.name.clone(),
          })
          .collect::<Vec<_>>()
          .join(", ");
        self.line(level, &format!("from {} import {}", module, aliases));
      }
      Syntax::PassStmt => self.line(level, "pass"),
      Syntax::BreakStmt => self.line(level, "break"),
      Syntax::ContinueStmt => self.line(level, "continue"),
      other => {
        debug_assert!(!other.is_statement());
        let value = self.expr(id, 0);
        self.line(level, &value);
      }
    }
  }

  fn emit_if(
    &mut self,
    level: usize,
    keyword: &str,
    test: NodeId,
    consequent: &[NodeId],
    alternate: &[NodeId],
  ) {
    let test = self.expr(test, 0);
    self.line(level, &format!("{} {}:", keyword, test));
    self.emit_body(consequent, level + 1);
    if alternate.len() == 1 {
      if let Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } = &self.tree[alternate[0]].stx
      {
        self.emit_if(level, "elif", *test, consequent, alternate);
        return;
      }
    }
    if !alternate.is_empty() {
      self.line(level, "else:");
      self.emit_body(alternate, level + 1);
    }
  }

  /// Renders an expression, parenthesizing when its precedence falls below
  /// the context's minimum.
  fn expr(&self, id: NodeId, min_prec: u8) -> String {
    let (text, prec) = match &self.tree[id].stx {
      Syntax::Name { name } => (name.clone(), 10),
      Syntax::LitNum { raw } => (raw.clone(), 10),
      Syntax::LitStr { value } => (quote_str(value), 10),
      Syntax::LitBool { value } => (if *value { "True" } else { "False" }.to_string(), 10),
      Syntax::LitNone => ("None".to_string(), 10),
      Syntax::Binary { op, left, right } => {
        let prec = op.precedence();
        let (lmin, rmin) = if op.is_right_associative() {
          (prec + 1, prec)
        } else {
          (prec, prec + 1)
        };
        let left = self.expr(*left, lmin);
        let right = self.expr(*right, rmin);
        (format!("{} {} {}", left, op.as_str(), right), prec)
      }
      Syntax::Unary { op, operand } => {
        let prec = op.precedence();
        let operand = self.expr(*operand, prec);
        (format!("{}{}", op.as_str(), operand), prec)
      }
      Syntax::Call { callee, args } => {
        let callee = self.expr(*callee, 9);
        let args = args
          .iter()
          .map(|a| self.expr(*a, 0))
          .collect::<Vec<_>>()
          .join(", ");
        (format!("{}({})", callee, args), 9)
      }
      Syntax::Attribute { object, attr } => {
        let object = self.expr(*object, 9);
        (format!("{}.{}", object, attr), 9)
      }
      Syntax::Subscript { object, index } => {
        let object = self.expr(*object, 9);
        let index = self.expr(*index, 0);
        (format!("{}[{}]", object, index), 9)
      }
      Syntax::TupleLit { elements } => {
        let text = match elements.len() {
          0 => "()".to_string(),
          1 => format!("({},)", self.expr(elements[0], 0)),
          _ => format!(
            "({})",
            elements
              .iter()
              .map(|e| self.expr(*e, 0))
              .collect::<Vec<_>>()
              .join(", ")
          ),
        };
        (text, 10)
      }
      Syntax::ListLit { elements } => {
        let elements = elements
          .iter()
          .map(|e| self.expr(*e, 0))
          .collect::<Vec<_>>()
          .join(", ");
        (format!("[{}]", elements), 10)
      }
      Syntax::DictLit { entries } => {
        let entries = entries
          .iter()
          .map(|(k, v)| format!("{}: {}", self.expr(*k, 0), self.expr(*v, 0)))
          .collect::<Vec<_>>()
          .join(", ");
        (format!("{{{}}}", entries), 10)
      }
      stmt => {
        debug_assert!(stmt.is_statement(), "expression emitter got {:?}", stmt);
        (String::new(), 10)
      }
    };
    if prec < min_prec {
      format!("({})", text)
    } else {
      text
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse::parse;

  fn rendered(source: &str) -> String {
    emit(&parse(source).unwrap())
  }

  #[test]
  fn renders_function_with_indented_body() {
    assert_eq!(
      rendered("def square(x):return x**2\n"),
      "def square(x):\n    return x ** 2\n"
    );
  }

  #[test]
  fn parenthesizes_by_precedence_only() {
    assert_eq!(rendered("x = (a + b) * c\n"), "x = (a + b) * c\n");
    assert_eq!(rendered("x = a + (b * c)\n"), "x = a + b * c\n");
    assert_eq!(rendered("x = (a ** b) ** c\n"), "x = (a ** b) ** c\n");
    assert_eq!(rendered("x = a ** b ** c\n"), "x = a ** b ** c\n");
  }

  #[test]
  fn renders_elif_chains_flat() {
    let source = "if a:\n    pass\nelif b:\n    pass\nelse:\n    x = 1\n";
    assert_eq!(rendered(source), source);
  }

  #[test]
  fn renders_imports_and_string_quoting() {
    assert_eq!(
      rendered("from main import square as sq\ns='it\\'s'\n"),
      "from main import square as sq\ns = \"it's\"\n"
    );
  }

  #[test]
  fn renders_defaults_without_spaces() {
    assert_eq!(
      rendered("def f(x=1, *args, **kwargs):\n    pass\n"),
      "def f(x=1, *args, **kwargs):\n    pass\n"
    );
  }

  #[test]
  fn renders_containers() {
    assert_eq!(
      rendered("v = {'a': [1, 2], 'b': (3,)}\n"),
      "v = {'a': [1, 2], 'b': (3,)}\n"
    );
  }
}
