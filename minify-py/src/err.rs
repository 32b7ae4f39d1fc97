use parse_py::error::SyntaxError;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq)]
pub enum MinifyError {
  /// A module failed to parse. Processing aborts at the first such module.
  Syntax {
    module: String,
    error: SyntaxError,
  },
  /// A pass found state that an earlier pass promised could not occur.
  InternalInvariant {
    module: String,
    detail: String,
  },
}

impl MinifyError {
  pub fn module(&self) -> &str {
    match self {
      MinifyError::Syntax { module, .. } => module,
      MinifyError::InternalInvariant { module, .. } => module,
    }
  }
}

impl Display for MinifyError {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      MinifyError::Syntax { module, error } => {
        write!(f, "syntax error in module `{}`: {}", module, error)
      }
      MinifyError::InternalInvariant { module, detail } => {
        write!(f, "invariant broken in module `{}`: {}", module, detail)
      }
    }
  }
}

impl Error for MinifyError {}
