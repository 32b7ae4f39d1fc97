use clap::Parser;
use minify_py::minify;
use minify_py::MinifyOptions;
use minify_py::ModuleSource;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "minify-py", about = "Extremely fast Python source compactor")]
struct Cli {
  /// Files to minify, in dependency order.
  #[arg(required = true)]
  inputs: Vec<PathBuf>,

  /// Directory to write minified modules to.
  #[arg(short, long, default_value = "./")]
  output: PathBuf,

  /// Keep the original module names.
  #[arg(long)]
  keep_module_names: bool,

  /// Keep the original names of top-level variables.
  #[arg(long)]
  keep_global_variables: bool,

  /// Fuse all modules into a single output file.
  #[arg(long)]
  single_file: bool,
}

fn exit_with_error(message: impl AsRef<str>) -> ! {
  eprintln!("{}", message.as_ref());
  process::exit(1);
}

fn module_name(path: &PathBuf) -> String {
  match path.file_stem() {
    Some(stem) => stem.to_string_lossy().into_owned(),
    None => exit_with_error(format!("{} has no file name", path.display())),
  }
}

fn main() {
  let args = Cli::parse();
  let mut sources = Vec::new();
  for path in args.inputs.iter() {
    let text = match fs::read_to_string(path) {
      Ok(text) => text,
      Err(err) => exit_with_error(format!("failed to read {}: {err}", path.display())),
    };
    sources.push(ModuleSource {
      name: module_name(path),
      text,
    });
  }
  let options = MinifyOptions::new()
    .with_keep_module_names(args.keep_module_names)
    .with_keep_global_variables(args.keep_global_variables)
    .with_single_file(args.single_file);
  let outputs = match minify(&options, &sources) {
    Ok(outputs) => outputs,
    Err(err) => exit_with_error(err.to_string()),
  };
  for module in outputs.iter() {
    let dest = args.output.join(format!("{}.py", module.name));
    if let Err(err) = fs::write(&dest, &module.text) {
      exit_with_error(format!("failed to write {}: {err}", dest.display()));
    }
  }
}
