use crate::ast::BinOp;
use crate::ast::ImportAlias;
use crate::ast::NodeId;
use crate::ast::Param;
use crate::ast::ParamKind;
use crate::ast::Syntax;
use crate::ast::Tree;
use crate::ast::UnaryOp;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;

/// Parses one module's source into its syntax tree.
pub fn parse(source: &str) -> SyntaxResult<Tree> {
  let tokens = lex(source)?;
  Parser::new(tokens).parse_module()
}

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
  tree: Tree,
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Parser {
    debug_assert!(matches!(tokens.last(), Some(t) if t.tt == TT::EOF));
    Parser {
      tokens,
      pos: 0,
      tree: Tree::new(),
    }
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.pos]
  }

  fn peek_tt(&self) -> TT {
    self.tokens[self.pos].tt
  }

  fn peek2_tt(&self) -> TT {
    self
      .tokens
      .get(self.pos + 1)
      .map(|t| t.tt)
      .unwrap_or(TT::EOF)
  }

  fn advance(&mut self) -> Token {
    let token = self.tokens[self.pos].clone();
    if token.tt != TT::EOF {
      self.pos += 1;
    }
    token
  }

  fn eat(&mut self, tt: TT) -> bool {
    if self.peek_tt() == tt {
      self.advance();
      true
    } else {
      false
    }
  }

  fn require(&mut self, tt: TT) -> SyntaxResult<Token> {
    let actual = self.peek_tt();
    if actual == tt {
      return Ok(self.advance());
    }
    let typ = if actual == TT::EOF {
      SyntaxErrorType::UnexpectedEnd
    } else {
      SyntaxErrorType::RequiredTokenNotFound(tt)
    };
    Err(self.peek().loc.error(typ, Some(actual)))
  }

  fn expected(&self, what: &'static str) -> SyntaxError {
    self
      .peek()
      .loc
      .error(SyntaxErrorType::ExpectedSyntax(what), Some(self.peek_tt()))
  }

  fn start(&self) -> usize {
    self.peek().loc.0
  }

  fn node(&mut self, start: usize, stx: Syntax) -> NodeId {
    let end = if self.pos == 0 {
      start
    } else {
      self.tokens[self.pos - 1].loc.1
    };
    self.tree.create_node(Loc(start, end.max(start)), stx)
  }

  fn parse_module(mut self) -> SyntaxResult<Tree> {
    let start = self.start();
    let mut body = Vec::new();
    while self.peek_tt() != TT::EOF {
      if self.eat(TT::Newline) {
        continue;
      }
      self.parse_line(&mut body)?;
    }
    let root = self.node(start, Syntax::Module { body });
    self.tree.set_root(root);
    Ok(self.tree)
  }

  fn parse_line(&mut self, out: &mut Vec<NodeId>) -> SyntaxResult<()> {
    match self.peek_tt() {
      TT::KeywordIf => out.push(self.parse_if()?),
      TT::KeywordWhile => out.push(self.parse_while()?),
      TT::KeywordFor => out.push(self.parse_for()?),
      TT::KeywordDef => out.push(self.parse_def()?),
      TT::KeywordClass => out.push(self.parse_class()?),
      _ => {
        loop {
          out.push(self.parse_simple()?);
          if !self.eat(TT::Semicolon) || self.peek_tt() == TT::Newline {
            break;
          }
        }
        self.require(TT::Newline)?;
      }
    };
    Ok(())
  }

  /// Parses `:` and the statements it governs, either an indented block or
  /// an inline `;`-separated list.
  fn parse_suite(&mut self) -> SyntaxResult<Vec<NodeId>> {
    self.require(TT::Colon)?;
    let mut body = Vec::new();
    if self.eat(TT::Newline) {
      self.require(TT::Indent)?;
      while !self.eat(TT::Dedent) {
        if self.eat(TT::Newline) {
          continue;
        }
        self.parse_line(&mut body)?;
      }
    } else {
      loop {
        body.push(self.parse_simple()?);
        if !self.eat(TT::Semicolon) || self.peek_tt() == TT::Newline {
          break;
        }
      }
      self.require(TT::Newline)?;
    }
    if body.is_empty() {
      return Err(self.expected("at least one statement in block"));
    }
    Ok(body)
  }

  fn parse_if(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    // `elif` re-enters here as the sole statement of the alternate.
    self.advance();
    let test = self.parse_expr()?;
    let consequent = self.parse_suite()?;
    let alternate = if self.peek_tt() == TT::KeywordElif {
      vec![self.parse_if()?]
    } else if self.eat(TT::KeywordElse) {
      self.parse_suite()?
    } else {
      Vec::new()
    };
    Ok(self.node(start, Syntax::IfStmt {
      test,
      consequent,
      alternate,
    }))
  }

  fn parse_while(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    self.advance();
    let test = self.parse_expr()?;
    let body = self.parse_suite()?;
    Ok(self.node(start, Syntax::WhileStmt { test, body }))
  }

  fn parse_for(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    self.advance();
    let target = self.parse_target_list()?;
    self.require(TT::KeywordIn)?;
    let iter = self.parse_expr_list()?;
    let body = self.parse_suite()?;
    Ok(self.node(start, Syntax::ForStmt { target, iter, body }))
  }

  fn parse_def(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    self.advance();
    let name = self.require(TT::Identifier)?.text;
    self.require(TT::ParenOpen)?;
    let mut params = Vec::new();
    while self.peek_tt() != TT::ParenClose {
      let kind = if self.eat(TT::AsteriskAsterisk) {
        ParamKind::KwVararg
      } else if self.eat(TT::Asterisk) {
        ParamKind::Vararg
      } else {
        ParamKind::Positional
      };
      let pname = self.require(TT::Identifier)?.text;
      let default = if kind == ParamKind::Positional && self.eat(TT::Equals) {
        Some(self.parse_expr()?)
      } else {
        None
      };
      params.push(Param {
        name: pname,
        kind,
        default,
      });
      if !self.eat(TT::Comma) {
        break;
      }
    }
    self.require(TT::ParenClose)?;
    let body = self.parse_suite()?;
    Ok(self.node(start, Syntax::FuncDecl { name, params, body }))
  }

  fn parse_class(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    self.advance();
    let name = self.require(TT::Identifier)?.text;
    let mut bases = Vec::new();
    if self.eat(TT::ParenOpen) {
      while self.peek_tt() != TT::ParenClose {
        bases.push(self.parse_expr()?);
        if !self.eat(TT::Comma) {
          break;
        }
      }
      self.require(TT::ParenClose)?;
    }
    let body = self.parse_suite()?;
    Ok(self.node(start, Syntax::ClassDecl { name, bases, body }))
  }

  fn parse_simple(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    match self.peek_tt() {
      TT::KeywordReturn => {
        self.advance();
        let value = if matches!(self.peek_tt(), TT::Newline | TT::Semicolon | TT::EOF) {
          None
        } else {
          Some(self.parse_expr_list()?)
        };
        Ok(self.node(start, Syntax::ReturnStmt { value }))
      }
      TT::KeywordPass => {
        self.advance();
        Ok(self.node(start, Syntax::PassStmt))
      }
      TT::KeywordBreak => {
        self.advance();
        Ok(self.node(start, Syntax::BreakStmt))
      }
      TT::KeywordContinue => {
        self.advance();
        Ok(self.node(start, Syntax::ContinueStmt))
      }
      TT::KeywordImport => {
        self.advance();
        let aliases = self.parse_aliases()?;
        Ok(self.node(start, Syntax::Import { aliases }))
      }
      TT::KeywordFrom => {
        self.advance();
        let module = self.parse_dotted_name()?;
        self.require(TT::KeywordImport)?;
        let parenthesized = self.eat(TT::ParenOpen);
        let aliases = self.parse_aliases()?;
        if parenthesized {
          self.require(TT::ParenClose)?;
        }
        Ok(self.node(start, Syntax::ImportFrom { module, aliases }))
      }
      _ => self.parse_expr_statement(),
    }
  }

  fn parse_expr_statement(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let first = self.parse_expr_list()?;
    if self.peek_tt() == TT::Equals {
      let mut exprs = vec![first];
      while self.eat(TT::Equals) {
        exprs.push(self.parse_expr_list()?);
      }
      let value = exprs.pop().unwrap();
      for target in &exprs {
        self.check_target(*target)?;
      }
      return Ok(self.node(start, Syntax::Assign {
        targets: exprs,
        value,
      }));
    }
    if let Some(op) = aug_op(self.peek_tt()) {
      self.advance();
      self.check_target(first)?;
      let value = self.parse_expr_list()?;
      return Ok(self.node(start, Syntax::AugAssign {
        target: first,
        op,
        value,
      }));
    }
    Ok(self.node(start, Syntax::ExprStmt { value: first }))
  }

  fn check_target(&self, id: NodeId) -> SyntaxResult<()> {
    match &self.tree[id].stx {
      Syntax::Name { .. } | Syntax::Attribute { .. } | Syntax::Subscript { .. } => Ok(()),
      Syntax::TupleLit { elements } | Syntax::ListLit { elements } => {
        for e in elements {
          self.check_target(*e)?;
        }
        Ok(())
      }
      _ => Err(
        self.tree[id]
          .loc
          .error(SyntaxErrorType::InvalidAssignmentTarget, None),
      ),
    }
  }

  /// Loop targets sit below comparisons in the grammar so that the `in`
  /// separating target from iterable is never read as an operator. Only
  /// names, attributes, subscripts and tuples of those are admitted.
  fn parse_target_list(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let first = self.parse_postfix()?;
    self.check_target(first)?;
    if self.peek_tt() != TT::Comma {
      return Ok(first);
    }
    let mut elements = vec![first];
    while self.eat(TT::Comma) {
      if !self.can_start_expr() {
        break;
      }
      let target = self.parse_postfix()?;
      self.check_target(target)?;
      elements.push(target);
    }
    Ok(self.node(start, Syntax::TupleLit { elements }))
  }

  fn parse_dotted_name(&mut self) -> SyntaxResult<String> {
    let mut name = self.require(TT::Identifier)?.text;
    while self.eat(TT::Dot) {
      name.push('.');
      name.push_str(&self.require(TT::Identifier)?.text);
    }
    Ok(name)
  }

  fn parse_aliases(&mut self) -> SyntaxResult<Vec<ImportAlias>> {
    let mut aliases = Vec::new();
    loop {
      let name = self.parse_dotted_name()?;
      let asname = if self.eat(TT::KeywordAs) {
        Some(self.require(TT::Identifier)?.text)
      } else {
        None
      };
      aliases.push(ImportAlias { name, asname });
      if !self.eat(TT::Comma) {
        return Ok(aliases);
      }
    }
  }

  fn can_start_expr(&self) -> bool {
    matches!(
      self.peek_tt(),
      TT::Identifier
        | TT::LiteralNum
        | TT::LiteralStr
        | TT::KeywordTrue
        | TT::KeywordFalse
        | TT::KeywordNone
        | TT::KeywordNot
        | TT::ParenOpen
        | TT::BracketOpen
        | TT::BraceOpen
        | TT::Plus
        | TT::Hyphen
    )
  }

  /// Expression, or a bare tuple formed by top-level commas.
  fn parse_expr_list(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let first = self.parse_expr()?;
    if self.peek_tt() != TT::Comma {
      return Ok(first);
    }
    let mut elements = vec![first];
    while self.eat(TT::Comma) {
      if !self.can_start_expr() {
        break;
      }
      elements.push(self.parse_expr()?);
    }
    Ok(self.node(start, Syntax::TupleLit { elements }))
  }

  fn parse_expr(&mut self) -> SyntaxResult<NodeId> {
    self.parse_or()
  }

  fn parse_or(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut left = self.parse_and()?;
    while self.eat(TT::KeywordOr) {
      let right = self.parse_and()?;
      left = self.node(start, Syntax::Binary {
        op: BinOp::Or,
        left,
        right,
      });
    }
    Ok(left)
  }

  fn parse_and(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut left = self.parse_not()?;
    while self.eat(TT::KeywordAnd) {
      let right = self.parse_not()?;
      left = self.node(start, Syntax::Binary {
        op: BinOp::And,
        left,
        right,
      });
    }
    Ok(left)
  }

  fn parse_not(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    if self.peek_tt() == TT::KeywordNot && self.peek2_tt() != TT::KeywordIn {
      self.advance();
      let operand = self.parse_not()?;
      return Ok(self.node(start, Syntax::Unary {
        op: UnaryOp::Not,
        operand,
      }));
    }
    self.parse_comparison()
  }

  fn comparison_op(&mut self) -> Option<BinOp> {
    let op = match self.peek_tt() {
      TT::EqualsEquals => BinOp::Eq,
      TT::ExclamationEquals => BinOp::NotEq,
      TT::ChevronLeft => BinOp::Lt,
      TT::ChevronLeftEquals => BinOp::LtEq,
      TT::ChevronRight => BinOp::Gt,
      TT::ChevronRightEquals => BinOp::GtEq,
      TT::KeywordIn => BinOp::In,
      TT::KeywordNot if self.peek2_tt() == TT::KeywordIn => {
        self.advance();
        BinOp::NotIn
      }
      TT::KeywordIs => {
        if self.peek2_tt() == TT::KeywordNot {
          self.advance();
          BinOp::IsNot
        } else {
          BinOp::Is
        }
      }
      _ => return None,
    };
    self.advance();
    Some(op)
  }

  fn parse_comparison(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut left = self.parse_additive()?;
    while let Some(op) = self.comparison_op() {
      let right = self.parse_additive()?;
      left = self.node(start, Syntax::Binary { op, left, right });
    }
    Ok(left)
  }

  fn parse_additive(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut left = self.parse_term()?;
    loop {
      let op = match self.peek_tt() {
        TT::Plus => BinOp::Add,
        TT::Hyphen => BinOp::Sub,
        _ => break,
      };
      self.advance();
      let right = self.parse_term()?;
      left = self.node(start, Syntax::Binary { op, left, right });
    }
    Ok(left)
  }

  fn parse_term(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut left = self.parse_unary()?;
    loop {
      let op = match self.peek_tt() {
        TT::Asterisk => BinOp::Mul,
        TT::Slash => BinOp::Div,
        TT::SlashSlash => BinOp::FloorDiv,
        TT::Percent => BinOp::Mod,
        _ => break,
      };
      self.advance();
      let right = self.parse_unary()?;
      left = self.node(start, Syntax::Binary { op, left, right });
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let op = match self.peek_tt() {
      TT::Plus => UnaryOp::Pos,
      TT::Hyphen => UnaryOp::Neg,
      _ => return self.parse_power(),
    };
    self.advance();
    let operand = self.parse_unary()?;
    Ok(self.node(start, Syntax::Unary { op, operand }))
  }

  fn parse_power(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let left = self.parse_postfix()?;
    if !self.eat(TT::AsteriskAsterisk) {
      return Ok(left);
    }
    // `**` is right associative and admits a signed right operand.
    let right = self.parse_unary()?;
    Ok(self.node(start, Syntax::Binary {
      op: BinOp::Pow,
      left,
      right,
    }))
  }

  fn parse_postfix(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    let mut expr = self.parse_atom()?;
    loop {
      if self.eat(TT::Dot) {
        let attr = self.require(TT::Identifier)?.text;
        expr = self.node(start, Syntax::Attribute { object: expr, attr });
      } else if self.eat(TT::ParenOpen) {
        let mut args = Vec::new();
        while self.peek_tt() != TT::ParenClose {
          args.push(self.parse_expr()?);
          if !self.eat(TT::Comma) {
            break;
          }
        }
        self.require(TT::ParenClose)?;
        expr = self.node(start, Syntax::Call { callee: expr, args });
      } else if self.eat(TT::BracketOpen) {
        let index = self.parse_expr_list()?;
        self.require(TT::BracketClose)?;
        expr = self.node(start, Syntax::Subscript {
          object: expr,
          index,
        });
      } else {
        return Ok(expr);
      }
    }
  }

  fn parse_atom(&mut self) -> SyntaxResult<NodeId> {
    let start = self.start();
    match self.peek_tt() {
      TT::Identifier => {
        let name = self.advance().text;
        Ok(self.node(start, Syntax::Name { name }))
      }
      TT::LiteralNum => {
        let raw = self.advance().text;
        Ok(self.node(start, Syntax::LitNum { raw }))
      }
      TT::LiteralStr => {
        let value = self.advance().text;
        Ok(self.node(start, Syntax::LitStr { value }))
      }
      TT::KeywordTrue => {
        self.advance();
        Ok(self.node(start, Syntax::LitBool { value: true }))
      }
      TT::KeywordFalse => {
        self.advance();
        Ok(self.node(start, Syntax::LitBool { value: false }))
      }
      TT::KeywordNone => {
        self.advance();
        Ok(self.node(start, Syntax::LitNone))
      }
      TT::ParenOpen => {
        self.advance();
        if self.eat(TT::ParenClose) {
          return Ok(self.node(start, Syntax::TupleLit {
            elements: Vec::new(),
          }));
        }
        let expr = self.parse_expr_list()?;
        self.require(TT::ParenClose)?;
        Ok(expr)
      }
      TT::BracketOpen => {
        self.advance();
        let mut elements = Vec::new();
        while self.peek_tt() != TT::BracketClose {
          elements.push(self.parse_expr()?);
          if !self.eat(TT::Comma) {
            break;
          }
        }
        self.require(TT::BracketClose)?;
        Ok(self.node(start, Syntax::ListLit { elements }))
      }
      TT::BraceOpen => {
        self.advance();
        let mut entries = Vec::new();
        while self.peek_tt() != TT::BraceClose {
          let key = self.parse_expr()?;
          self.require(TT::Colon)?;
          let value = self.parse_expr()?;
          entries.push((key, value));
          if !self.eat(TT::Comma) {
            break;
          }
        }
        self.require(TT::BraceClose)?;
        Ok(self.node(start, Syntax::DictLit { entries }))
      }
      _ => Err(self.expected("expression")),
    }
  }
}

fn aug_op(tt: TT) -> Option<BinOp> {
  Some(match tt {
    TT::PlusEquals => BinOp::Add,
    TT::HyphenEquals => BinOp::Sub,
    TT::AsteriskEquals => BinOp::Mul,
    TT::SlashEquals => BinOp::Div,
    TT::SlashSlashEquals => BinOp::FloorDiv,
    TT::PercentEquals => BinOp::Mod,
    TT::AsteriskAsteriskEquals => BinOp::Pow,
    _ => return None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn body_of(source: &str) -> (Tree, Vec<NodeId>) {
    let tree = parse(source).unwrap();
    let body = tree.module_body().to_vec();
    (tree, body)
  }

  #[test]
  fn parses_assignment_with_power() {
    let (tree, body) = body_of("y = x ** 2\n");
    assert_eq!(body.len(), 1);
    let Syntax::Assign { targets, value } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    assert_eq!(tree[targets[0]].stx, Syntax::Name { name: "y".into() });
    assert!(matches!(tree[*value].stx, Syntax::Binary {
      op: BinOp::Pow,
      ..
    }));
  }

  #[test]
  fn parses_def_with_suite() {
    let (tree, body) = body_of("def square(x):\n    return x ** 2\n");
    let Syntax::FuncDecl { name, params, body } = &tree[body[0]].stx else {
      panic!("expected function");
    };
    assert_eq!(name, "square");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "x");
    assert!(matches!(
      tree[body[0]].stx,
      Syntax::ReturnStmt { value: Some(_) }
    ));
  }

  #[test]
  fn parses_inline_suite_and_semicolons() {
    let (tree, body) = body_of("if x:a = 1;b = 2\n");
    let Syntax::IfStmt { consequent, .. } = &tree[body[0]].stx else {
      panic!("expected if");
    };
    assert_eq!(consequent.len(), 2);
  }

  #[test]
  fn elif_becomes_nested_alternate() {
    let (tree, body) = body_of("if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n");
    let Syntax::IfStmt { alternate, .. } = &tree[body[0]].stx else {
      panic!("expected if");
    };
    assert_eq!(alternate.len(), 1);
    let Syntax::IfStmt { alternate, .. } = &tree[alternate[0]].stx else {
      panic!("expected nested elif");
    };
    assert_eq!(alternate.len(), 1);
    assert!(matches!(tree[alternate[0]].stx, Syntax::PassStmt));
  }

  #[test]
  fn parses_imports_with_aliases() {
    let (tree, body) = body_of("from main import square as sq, cube\nimport os.path\n");
    let Syntax::ImportFrom { module, aliases } = &tree[body[0]].stx else {
      panic!("expected from-import");
    };
    assert_eq!(module, "main");
    assert_eq!(aliases[0].name, "square");
    assert_eq!(aliases[0].asname.as_deref(), Some("sq"));
    assert_eq!(aliases[1].bound_name(), "cube");
    let Syntax::Import { aliases } = &tree[body[1]].stx else {
      panic!("expected import");
    };
    assert_eq!(aliases[0].name, "os.path");
  }

  #[test]
  fn chained_assignment_keeps_all_targets() {
    let (tree, body) = body_of("a = b = 1\n");
    let Syntax::Assign { targets, .. } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    assert_eq!(targets.len(), 2);
  }

  #[test]
  fn tuple_assignment_targets() {
    let (tree, body) = body_of("a, b = b, a\n");
    let Syntax::Assign { targets, value } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    assert!(matches!(tree[targets[0]].stx, Syntax::TupleLit { .. }));
    assert!(matches!(tree[*value].stx, Syntax::TupleLit { .. }));
  }

  #[test]
  fn for_target_stops_before_in() {
    let (tree, body) = body_of("for item in items:\n    item += item\n");
    let Syntax::ForStmt { target, iter, .. } = &tree[body[0]].stx else {
      panic!("expected for");
    };
    assert_eq!(tree[*target].stx, Syntax::Name {
      name: "item".into()
    });
    assert_eq!(tree[*iter].stx, Syntax::Name {
      name: "items".into()
    });
  }

  #[test]
  fn for_tuple_target() {
    let (tree, body) = body_of("for k, v in pairs:\n    k\n");
    let Syntax::ForStmt { target, .. } = &tree[body[0]].stx else {
      panic!("expected for");
    };
    let Syntax::TupleLit { elements } = &tree[*target].stx else {
      panic!("expected tuple target");
    };
    assert_eq!(elements.len(), 2);
  }

  #[test]
  fn literal_is_not_an_assignment_target() {
    let err = parse("3 = x\n").unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::InvalidAssignmentTarget);
  }

  #[test]
  fn missing_block_is_an_error() {
    assert!(parse("def f():\n").is_err());
  }

  #[test]
  fn not_in_parses_as_one_operator() {
    let (tree, body) = body_of("x = a not in b\n");
    let Syntax::Assign { value, .. } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    assert!(matches!(tree[*value].stx, Syntax::Binary {
      op: BinOp::NotIn,
      ..
    }));
  }

  #[test]
  fn unary_minus_binds_looser_than_power() {
    let (tree, body) = body_of("x = -y ** 2\n");
    let Syntax::Assign { value, .. } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    let Syntax::Unary {
      op: UnaryOp::Neg,
      operand,
    } = &tree[*value].stx
    else {
      panic!("expected unary");
    };
    assert!(matches!(tree[*operand].stx, Syntax::Binary {
      op: BinOp::Pow,
      ..
    }));
  }

  #[test]
  fn calls_attributes_and_subscripts_chain() {
    let (tree, body) = body_of("v = obj.items()[0]\n");
    let Syntax::Assign { value, .. } = &tree[body[0]].stx else {
      panic!("expected assignment");
    };
    let Syntax::Subscript { object, .. } = &tree[*value].stx else {
      panic!("expected subscript");
    };
    let Syntax::Call { callee, .. } = &tree[*object].stx else {
      panic!("expected call");
    };
    assert!(matches!(tree[*callee].stx, Syntax::Attribute { .. }));
  }
}
