use crate::loc::Loc;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use once_cell::sync::Lazy;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum TT {
  // Special token used to represent the end of the source code. Easier than
  // using and handling Option everywhere.
  EOF,

  // Structural tokens produced by the indentation-aware lexer.
  Newline,
  Indent,
  Dedent,

  Identifier,
  LiteralNum,
  LiteralStr,

  KeywordAnd,
  KeywordAs,
  KeywordBreak,
  KeywordClass,
  KeywordContinue,
  KeywordDef,
  KeywordElif,
  KeywordElse,
  KeywordFalse,
  KeywordFor,
  KeywordFrom,
  KeywordIf,
  KeywordImport,
  KeywordIn,
  KeywordIs,
  KeywordNone,
  KeywordNot,
  KeywordOr,
  KeywordPass,
  KeywordReturn,
  KeywordTrue,
  KeywordWhile,

  Asterisk,
  AsteriskAsterisk,
  AsteriskAsteriskEquals,
  AsteriskEquals,
  BraceClose,
  BraceOpen,
  BracketClose,
  BracketOpen,
  ChevronLeft,
  ChevronLeftEquals,
  ChevronRight,
  ChevronRightEquals,
  Colon,
  Comma,
  Dot,
  Equals,
  EqualsEquals,
  ExclamationEquals,
  Hyphen,
  HyphenEquals,
  ParenClose,
  ParenOpen,
  Percent,
  PercentEquals,
  Plus,
  PlusEquals,
  Semicolon,
  Slash,
  SlashEquals,
  SlashSlash,
  SlashSlashEquals,
}

/// One lexed token. `text` holds the identifier/number source text or the
/// decoded string value; it is empty for punctuation and keywords.
#[derive(Clone, Debug)]
pub struct Token {
  pub loc: Loc,
  pub tt: TT,
  pub text: String,
}

/// The full fixed reserved-word set of the surface language. Every member is
/// unusable as an identifier, including the words the parser itself has no
/// syntax for.
pub static RESERVED_WORDS: &[&str] = &[
  "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
  "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
  "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
  "yield",
];

static RESERVED_SET: Lazy<HashSet<&'static str>> =
  Lazy::new(|| RESERVED_WORDS.iter().copied().collect());

/// Reserved words the parser understands, mapped to their token types.
pub static KEYWORDS_MAPPING: Lazy<HashMap<&'static str, TT>> = Lazy::new(|| {
  let mut map = HashMap::new();
  map.insert("and", TT::KeywordAnd);
  map.insert("as", TT::KeywordAs);
  map.insert("break", TT::KeywordBreak);
  map.insert("class", TT::KeywordClass);
  map.insert("continue", TT::KeywordContinue);
  map.insert("def", TT::KeywordDef);
  map.insert("elif", TT::KeywordElif);
  map.insert("else", TT::KeywordElse);
  map.insert("False", TT::KeywordFalse);
  map.insert("for", TT::KeywordFor);
  map.insert("from", TT::KeywordFrom);
  map.insert("if", TT::KeywordIf);
  map.insert("import", TT::KeywordImport);
  map.insert("in", TT::KeywordIn);
  map.insert("is", TT::KeywordIs);
  map.insert("None", TT::KeywordNone);
  map.insert("not", TT::KeywordNot);
  map.insert("or", TT::KeywordOr);
  map.insert("pass", TT::KeywordPass);
  map.insert("return", TT::KeywordReturn);
  map.insert("True", TT::KeywordTrue);
  map.insert("while", TT::KeywordWhile);
  map
});

pub fn keyword_from_str(s: &str) -> Option<TT> {
  KEYWORDS_MAPPING.get(s).copied()
}

/// Whether `s` is a reserved word (parsed or not).
pub fn is_keyword(s: &str) -> bool {
  RESERVED_SET.contains(s)
}
