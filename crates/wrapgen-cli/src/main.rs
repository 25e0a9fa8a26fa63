use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;

use wrapgen_lib::ast::AstContext;
use wrapgen_lib::config::Config;
use wrapgen_lib::output::DirectoryTarget;
use wrapgen_lib::{Driver, Error};

/// Generate v8toolkit class bindings from a frontend AST dump.
#[derive(Parser, Debug)]
#[command(name = "wrapgen", version)]
struct Cli {
    /// JSON configuration document; must be the first argument if present.
    #[arg(long = "config-file", value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Enable the three default output modules (bindings, JS stub,
    /// bidirectional).
    #[arg(long = "use-default-output-modules")]
    use_default_output_modules: bool,

    /// AST dump written by the frontend.
    #[arg(value_name = "AST_FILE")]
    ast_file: PathBuf,
}

fn main() {
    env_logger::init();

    // The config file, when given, has to come before everything else so
    // later arguments can consult it.
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if let Some(position) = raw.iter().position(|arg| arg.starts_with("--config-file"))
        && position != 0
    {
        eprintln!("wrapgen: config file must be the first parameter if it is specified at all");
        std::process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("wrapgen: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> wrapgen_lib::Result<()> {
    if !cli.use_default_output_modules {
        eprintln!(
            "no output modules specified - aborting - did you mean to pass --use-default-output-modules"
        );
        std::process::exit(1);
    }

    let config = match &cli.config_file {
        Some(path) => Config::from_file(path)?,
        None => Config::empty(),
    };

    let source = std::fs::read_to_string(&cli.ast_file)?;
    let ctx = AstContext::from_json(&source)
        .map_err(|error| Error::InconsistentAst(format!("invalid AST dump: {error}")))?;

    let target = Rc::new(DirectoryTarget::current_dir());
    Driver::new(&ctx, config)
        .with_default_output_modules(target)
        .run()
}
