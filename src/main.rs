//! Stencil CLI
//!
//! Usage:
//!   stencil [OPTIONS] <DIRECTIVE>
//!
//! Options:
//!   -p, --path-to <FILE>     Destination unit to merge into
//!   -o, --output <FILE>      Write the result here instead of stdout
//!   -w, --write              Rewrite the destination in place
//!   -c, --config <FILE>      Configuration file (TOML format)
//!   -t, --templates <DIR>    Template directory override
//!       --strict             Fail when a template falls back to its stub
//!   -v, --verbose            More logging, repeat for every substitution
//!   -q, --quiet              Errors only
//!   -h, --help               Print help

use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use stencil::{
    Config, GenerateError, GenerateOptions, Generator, Source, TemplateStore, Verbosity,
};

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Instantiate a data-structure template for a concrete element type")]
struct Cli {
    /// Directive naming the structure and element type, e.g. Stack[Widget]
    directive: String,

    /// Destination file to merge into (a missing file starts empty)
    #[arg(short, long)]
    path_to: Option<PathBuf>,

    /// Output file (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rewrite the destination file in place
    #[arg(short, long, requires = "path_to", conflicts_with = "output")]
    write: bool,

    /// Configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the template files
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Fail instead of generating from a fallback template
    #[arg(long)]
    strict: bool,

    /// Increase logging; repeat to log every substitution
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.verbose) {
            (true, _) => Verbosity::Silent,
            (false, 0 | 1) => Verbosity::Normal,
            (false, _) => Verbosity::Noisy,
        }
    }

    fn level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::WARN,
            (false, 1) => Level::INFO,
            (false, _) => Level::DEBUG,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(cli.level().into()))
        .with_writer(io::stderr)
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(dir) = &cli.templates {
        config.templates = config.templates.with_dir(dir.clone());
    }
    if cli.strict {
        config.strict = true;
    }

    // Read destination
    let destination = match &cli.path_to {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => Source::new(path.display().to_string(), text),
            Err(e) if e.kind() == ErrorKind::NotFound => Source::empty(path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Source::empty("generated.rs"),
    };

    let options = GenerateOptions::from_config(&config).with_verbosity(cli.verbosity());
    let generator = Generator::new(TemplateStore::load_from(&config.templates), options);

    let mut buffer = Vec::new();
    if let Err(e) = generator.generate(&cli.directive, &destination, &mut buffer) {
        eprintln!("{}", report(&e, &cli.directive));
        std::process::exit(1);
    }

    let target = if cli.write {
        cli.path_to.as_ref()
    } else {
        cli.output.as_ref()
    };
    let written = match target {
        Some(path) => fs::write(path, &buffer),
        None => io::Write::write_all(&mut io::stdout(), &buffer),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    }
}

/// Error text, with source context where the error carries spans
fn report(err: &GenerateError, directive: &str) -> String {
    match err {
        GenerateError::DirectiveMalformed { source, .. } => source.format(directive),
        GenerateError::SourceUnparsable { name, text, errors } => errors
            .iter()
            .map(|e| e.format(text, name))
            .collect::<Vec<_>>()
            .join("\n"),
        GenerateError::TemplateUnparsable { kind, text, errors } => {
            let filename = format!("{} template", kind);
            errors
                .iter()
                .map(|e| e.format(text, &filename))
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => format!("Error: {}", other),
    }
}
