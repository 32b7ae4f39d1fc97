pub mod err;
pub mod layout;
pub mod names;

mod fuse;
mod pass;
mod shorten;
mod simplify;


pub use crate::err::MinifyError;
pub use crate::names::NameGenerator;

use crate::fuse::FusePass;
use crate::pass::Ctx;
use crate::pass::Pipeline;
use crate::shorten::CollectNamesPass;
use crate::shorten::ShortenPass;
use crate::simplify::DeadStorePass;
use crate::simplify::LinkParentsPass;
use crate::simplify::ReturnFoldPass;
use crate::simplify::StripDocstringsPass;
use parse_py::ast::NodeId;
use parse_py::ast::Tree;
use parse_py::emit::emit;
use parse_py::parse;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MinifyOptions {
  /// Keep module names as given instead of renaming them.
  pub keep_module_names: bool,
  /// Keep the names of top-level bindings, preserving the public surface.
  pub keep_global_variables: bool,
  /// Concatenate all modules into the first one.
  pub single_file: bool,
}

impl MinifyOptions {
  pub fn new() -> MinifyOptions {
    MinifyOptions::default()
  }

  pub fn with_keep_module_names(mut self, keep: bool) -> MinifyOptions {
    self.keep_module_names = keep;
    self
  }

  pub fn with_keep_global_variables(mut self, keep: bool) -> MinifyOptions {
    self.keep_global_variables = keep;
    self
  }

  pub fn with_single_file(mut self, single: bool) -> MinifyOptions {
    self.single_file = single;
    self
  }
}

/// One named module of source text, both as input and output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSource {
  pub name: String,
  pub text: String,
}

pub(crate) struct Module {
  pub name: String,
  pub tree: Tree,
  /// Rebinding statements the shortener spliced at the top of the body.
  pub hoists: Vec<NodeId>,
}

/// Compacts and obfuscates a set of modules as one program. Modules are
/// processed in input order; renaming decisions are shared so cross-module
/// imports stay consistent.
///
/// ```
/// use minify_py::minify;
/// use minify_py::MinifyOptions;
/// use minify_py::ModuleSource;
///
/// let out = minify(&MinifyOptions::new(), &[ModuleSource {
///   name: "main".to_string(),
///   text: "x = 7   \n\n".to_string(),
/// }])
/// .unwrap();
/// assert_eq!(out[0].text, "a=7");
/// ```
pub fn minify(
  options: &MinifyOptions,
  sources: &[ModuleSource],
) -> Result<Vec<ModuleSource>, MinifyError> {
  let mut modules = Vec::with_capacity(sources.len());
  for source in sources {
    let tree = parse(&source.text).map_err(|error| MinifyError::Syntax {
      module: source.name.clone(),
      error,
    })?;
    modules.push(Module {
      name: source.name.clone(),
      tree,
      hoists: Vec::new(),
    });
  }
  let mut cx = Ctx::new(options.clone(), modules.len());
  let mut pipeline = Pipeline::new()
    .register(Box::new(LinkParentsPass))
    .register(Box::new(StripDocstringsPass))
    .register(Box::new(ReturnFoldPass))
    .register(Box::new(DeadStorePass))
    .register(Box::new(CollectNamesPass))
    .register(Box::new(ShortenPass))
    .register(Box::new(FusePass));
  pipeline.run_all(&mut cx, &mut modules)?;
  Ok(
    modules
      .into_iter()
      .map(|module| ModuleSource {
        name: module.name,
        text: layout::compact(&emit(&module.tree)),
      })
      .collect(),
  )
}
