use crate::err::MinifyError;
use crate::names::NameGenerator;
use crate::Module;
use crate::MinifyOptions;
use ahash::HashMap;
use ahash::HashSet;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

/// State threaded through the pipeline. Per-module vectors are indexed the
/// same way as the module list itself.
pub struct Ctx {
  pub options: MinifyOptions,
  /// Shared across all modules so no two modules receive the same short name.
  pub generator: Option<NameGenerator>,
  /// Names whose stores were eliminated, per module.
  pub eliminated: Vec<HashSet<String>>,
  /// Old name to short name, per module.
  pub module_maps: Vec<HashMap<String, String>>,
  /// Original module name to its renamed form.
  pub module_renames: HashMap<String, String>,
}

impl Ctx {
  pub fn new(options: MinifyOptions, module_count: usize) -> Ctx {
    Ctx {
      options,
      generator: None,
      eliminated: vec![HashSet::default(); module_count],
      module_maps: vec![HashMap::default(); module_count],
      module_renames: HashMap::default(),
    }
  }

  pub fn generator_mut(&mut self) -> &mut NameGenerator {
    self
      .generator
      .as_mut()
      .expect("name generator must be initialized")
  }

  pub fn generator(&self) -> &NameGenerator {
    self
      .generator
      .as_ref()
      .expect("name generator must be initialized")
  }
}

pub trait Pass {
  fn name(&self) -> &'static str;

  fn run(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError>;
}

/// Fixed sequence of rewrite passes over the whole module set.
pub struct Pipeline {
  passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
  pub fn new() -> Pipeline {
    Pipeline { passes: Vec::new() }
  }

  pub fn register(mut self, pass: Box<dyn Pass>) -> Pipeline {
    self.passes.push(pass);
    self
  }

  pub fn run_all(&mut self, cx: &mut Ctx, modules: &mut Vec<Module>) -> Result<(), MinifyError> {
    for pass in self.passes.iter_mut() {
      pass.run(cx, modules)?;
    }
    Ok(())
  }
}

impl Default for Pipeline {
  fn default() -> Self {
    Pipeline::new()
  }
}

impl Debug for Pipeline {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_list()
      .entries(self.passes.iter().map(|p| p.name()))
      .finish()
  }
}
