use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::token::keyword_from_str;
use crate::token::Token;
use crate::token::TT;
use memchr::memchr;

fn is_ident_start(b: u8) -> bool {
  b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

fn scan_operator(bytes: &[u8], pos: usize) -> Option<(TT, usize)> {
  let rest = &bytes[pos..];
  let three: &[(&[u8], TT)] = &[
    (b"**=", TT::AsteriskAsteriskEquals),
    (b"//=", TT::SlashSlashEquals),
  ];
  for (syn, tt) in three {
    if rest.starts_with(syn) {
      return Some((*tt, 3));
    }
  }
  let two: &[(&[u8], TT)] = &[
    (b"**", TT::AsteriskAsterisk),
    (b"//", TT::SlashSlash),
    (b"+=", TT::PlusEquals),
    (b"-=", TT::HyphenEquals),
    (b"*=", TT::AsteriskEquals),
    (b"/=", TT::SlashEquals),
    (b"%=", TT::PercentEquals),
    (b"==", TT::EqualsEquals),
    (b"!=", TT::ExclamationEquals),
    (b"<=", TT::ChevronLeftEquals),
    (b">=", TT::ChevronRightEquals),
  ];
  for (syn, tt) in two {
    if rest.starts_with(syn) {
      return Some((*tt, 2));
    }
  }
  let tt = match rest.first()? {
    b'(' => TT::ParenOpen,
    b')' => TT::ParenClose,
    b'[' => TT::BracketOpen,
    b']' => TT::BracketClose,
    b'{' => TT::BraceOpen,
    b'}' => TT::BraceClose,
    b':' => TT::Colon,
    b';' => TT::Semicolon,
    b',' => TT::Comma,
    b'.' => TT::Dot,
    b'=' => TT::Equals,
    b'+' => TT::Plus,
    b'-' => TT::Hyphen,
    b'*' => TT::Asterisk,
    b'/' => TT::Slash,
    b'%' => TT::Percent,
    b'<' => TT::ChevronLeft,
    b'>' => TT::ChevronRight,
    _ => return None,
  };
  Some((tt, 1))
}

fn scan_number(bytes: &[u8], pos: usize) -> usize {
  let mut end = pos;
  while end < bytes.len() {
    let b = bytes[end];
    if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
      // Exponent sign, e.g. `1e-5`.
      if (b == b'e' || b == b'E')
        && end + 2 < bytes.len()
        && (bytes[end + 1] == b'+' || bytes[end + 1] == b'-')
        && bytes[end + 2].is_ascii_digit()
      {
        end += 3;
        continue;
      }
      end += 1;
    } else {
      break;
    }
  }
  end
}

struct Lexer<'a> {
  source: &'a str,
  bytes: &'a [u8],
  pos: usize,
  tokens: Vec<Token>,
  indents: Vec<usize>,
  // Newlines inside brackets do not terminate the logical line.
  bracket_depth: usize,
  at_line_start: bool,
}

impl<'a> Lexer<'a> {
  fn new(source: &'a str) -> Self {
    Lexer {
      source,
      bytes: source.as_bytes(),
      pos: 0,
      tokens: Vec::new(),
      indents: vec![0],
      bracket_depth: 0,
      at_line_start: true,
    }
  }

  fn push(&mut self, tt: TT, loc: Loc, text: String) {
    self.tokens.push(Token { loc, tt, text });
  }

  fn error(&self, typ: SyntaxErrorType) -> crate::error::SyntaxError {
    Loc(self.pos, self.pos + 1).error(typ, None)
  }

  fn skip_comment(&mut self) {
    match memchr(b'\n', &self.bytes[self.pos..]) {
      Some(off) => self.pos += off,
      None => self.pos = self.bytes.len(),
    }
  }

  fn handle_line_start(&mut self) -> SyntaxResult<bool> {
    let start = self.pos;
    while self.pos < self.bytes.len() && self.bytes[self.pos] == b' ' {
      self.pos += 1;
    }
    if self.pos >= self.bytes.len() {
      return Ok(false);
    }
    match self.bytes[self.pos] {
      b'\n' => {
        self.pos += 1;
        return Ok(false);
      }
      b'\r' => {
        self.pos += 1;
        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'\n' {
          self.pos += 1;
        }
        return Ok(false);
      }
      b'#' => {
        self.skip_comment();
        if self.pos < self.bytes.len() {
          self.pos += 1;
        }
        return Ok(false);
      }
      b'\t' => return Err(self.error(SyntaxErrorType::InvalidCharacter('\t'))),
      _ => {}
    }
    let width = self.pos - start;
    let current = *self.indents.last().unwrap();
    if width > current {
      self.indents.push(width);
      self.push(TT::Indent, Loc(start, self.pos), String::new());
    } else if width < current {
      while *self.indents.last().unwrap() > width {
        self.indents.pop();
        self.push(TT::Dedent, Loc(start, self.pos), String::new());
      }
      if *self.indents.last().unwrap() != width {
        return Err(self.error(SyntaxErrorType::InconsistentIndentation));
      }
    }
    self.at_line_start = false;
    Ok(true)
  }

  fn scan_string(&mut self) -> SyntaxResult<()> {
    let start = self.pos;
    let quote = self.bytes[self.pos];
    let triple = self.bytes[self.pos..].len() >= 3
      && self.bytes[self.pos + 1] == quote
      && self.bytes[self.pos + 2] == quote;
    let mut value = Vec::new();
    let mut p = start + if triple { 3 } else { 1 };
    loop {
      if p >= self.bytes.len() {
        return Err(Loc(start, self.bytes.len()).error(SyntaxErrorType::UnterminatedString, None));
      }
      let b = self.bytes[p];
      if b == b'\\' {
        if p + 1 >= self.bytes.len() {
          return Err(Loc(start, self.bytes.len()).error(SyntaxErrorType::UnterminatedString, None));
        }
        let esc = self.bytes[p + 1];
        match esc {
          b'n' => value.push(b'\n'),
          b't' => value.push(b'\t'),
          b'r' => value.push(b'\r'),
          b'0' => value.push(0),
          b'\\' | b'\'' | b'"' => value.push(esc),
          // Unknown escapes are preserved verbatim.
          _ => {
            value.push(b'\\');
            value.push(esc);
          }
        }
        p += 2;
        continue;
      }
      if b == quote {
        if !triple {
          p += 1;
          break;
        }
        if self.bytes[p..].len() >= 3 && self.bytes[p + 1] == quote && self.bytes[p + 2] == quote {
          p += 3;
          break;
        }
        value.push(b);
        p += 1;
        continue;
      }
      if b == b'\n' && !triple {
        return Err(Loc(start, p).error(SyntaxErrorType::UnterminatedString, None));
      }
      value.push(b);
      p += 1;
    }
    let text = String::from_utf8(value)
      .expect("string literal bytes were copied from valid UTF-8 source");
    self.push(TT::LiteralStr, Loc(start, p), text);
    self.pos = p;
    Ok(())
  }

  fn run(mut self) -> SyntaxResult<Vec<Token>> {
    while self.pos < self.bytes.len() {
      if self.at_line_start && self.bracket_depth == 0 {
        if !self.handle_line_start()? {
          continue;
        }
      }
      if self.pos >= self.bytes.len() {
        break;
      }
      let b = self.bytes[self.pos];
      match b {
        b' ' | b'\r' => {
          self.pos += 1;
        }
        b'\n' => {
          self.pos += 1;
          if self.bracket_depth == 0 {
            self.push(TT::Newline, Loc(self.pos - 1, self.pos), String::new());
            self.at_line_start = true;
          }
        }
        b'#' => self.skip_comment(),
        b'\'' | b'"' => self.scan_string()?,
        _ if is_ident_start(b) => {
          let start = self.pos;
          while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
          }
          let word = &self.source[start..self.pos];
          let tt = keyword_from_str(word).unwrap_or(TT::Identifier);
          self.push(tt, Loc(start, self.pos), word.to_string());
        }
        _ if b.is_ascii_digit() => {
          let start = self.pos;
          self.pos = scan_number(self.bytes, self.pos);
          let text = self.source[start..self.pos].to_string();
          self.push(TT::LiteralNum, Loc(start, self.pos), text);
        }
        _ => match scan_operator(self.bytes, self.pos) {
          Some((tt, len)) => {
            match tt {
              TT::ParenOpen | TT::BracketOpen | TT::BraceOpen => self.bracket_depth += 1,
              TT::ParenClose | TT::BracketClose | TT::BraceClose => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1)
              }
              _ => {}
            }
            self.push(tt, Loc(self.pos, self.pos + len), String::new());
            self.pos += len;
          }
          None => {
            let c = self.source[self.pos..].chars().next().unwrap_or('\u{fffd}');
            return Err(self.error(SyntaxErrorType::InvalidCharacter(c)));
          }
        },
      }
    }
    let end = self.bytes.len();
    if !self.at_line_start {
      self.push(TT::Newline, Loc(end, end), String::new());
    }
    while self.indents.len() > 1 {
      self.indents.pop();
      self.push(TT::Dedent, Loc(end, end), String::new());
    }
    self.push(TT::EOF, Loc(end, end), String::new());
    Ok(self.tokens)
  }
}

pub fn lex(source: &str) -> SyntaxResult<Vec<Token>> {
  Lexer::new(source).run()
}

/// Tokenizes a single rendered line into raw token texts (string literals keep
/// their quotes). Indentation is not interpreted and unknown characters become
/// single-character tokens; this is the best-effort re-tokenizer used by
/// text-level post-processing.
pub fn line_tokens(line: &str) -> Vec<String> {
  let bytes = line.as_bytes();
  let mut tokens = Vec::new();
  let mut pos = 0;
  while pos < bytes.len() {
    let b = bytes[pos];
    if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
      pos += 1;
      continue;
    }
    if b == b'#' {
      break;
    }
    if b == b'\'' || b == b'"' {
      let quote = b;
      let start = pos;
      let mut p = pos + 1;
      while p < bytes.len() {
        if bytes[p] == b'\\' {
          p = (p + 2).min(bytes.len());
          continue;
        }
        if bytes[p] == quote {
          p += 1;
          break;
        }
        p += 1;
      }
      tokens.push(line[start..p].to_string());
      pos = p;
      continue;
    }
    if is_ident_start(b) {
      let start = pos;
      while pos < bytes.len() && is_ident_continue(bytes[pos]) {
        pos += 1;
      }
      tokens.push(line[start..pos].to_string());
      continue;
    }
    if b.is_ascii_digit() {
      let start = pos;
      pos = scan_number(bytes, pos);
      tokens.push(line[start..pos].to_string());
      continue;
    }
    if let Some((_, len)) = scan_operator(bytes, pos) {
      tokens.push(line[pos..pos + len].to_string());
      pos += len;
      continue;
    }
    let c = line[pos..].chars().next().unwrap_or('\u{fffd}');
    tokens.push(c.to_string());
    pos += c.len_utf8();
  }
  tokens
}
