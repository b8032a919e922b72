//! Brick Builder CLI
//!
//! Usage:
//!   brick-builder [OPTIONS] <SPECS>
//!
//! Options:
//!   -p, --page <FILE>       Host page markup (default: empty body)
//!   -c, --config <FILE>     Builder configuration (TOML format)
//!   -r, --root <SELECTOR>   Root anchor for rendered specs
//!   -D, --data <KEY=VALUE>  Template data, repeatable
//!   -t, --ticks <N>         Templating passes to run after rendering
//!   -v, --verbose           Debug logging
//!   -h, --help              Print help

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use brick_builder::{specs_from_file, Builder, BuilderConfig, MemoryDocument};

#[derive(Parser)]
#[command(name = "brick-builder")]
#[command(about = "Render declarative element specs into a page with live templating")]
struct Cli {
    /// Spec file (JSON: a single spec or an array of specs)
    specs: PathBuf,

    /// Host page markup; its content becomes the document body
    #[arg(short, long)]
    page: Option<PathBuf>,

    /// Builder configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root anchor selector (#id, .class or tag)
    #[arg(short, long)]
    root: Option<String>,

    /// Template data as KEY=VALUE (repeatable)
    #[arg(short = 'D', long = "data", value_parser = parse_key_value)]
    data: Vec<(String, String)>,

    /// Templating passes to run after rendering
    #[arg(short, long, default_value_t = 1)]
    ticks: u32,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration, then apply CLI overrides
    let mut config = match &cli.config {
        Some(path) => match BuilderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => BuilderConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root = Some(root);
    }
    config.data.extend(cli.data);

    // Load host page
    let (page_name, page) = match &cli.page {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (path.display().to_string(), content),
            Err(e) => {
                eprintln!("Error reading page '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ("<empty page>".to_string(), String::new()),
    };
    let document = match MemoryDocument::from_markup(&page) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{}", e.format(&page, &page_name));
            std::process::exit(1);
        }
    };

    // Load specs
    let specs = match specs_from_file(&cli.specs) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("Error loading specs '{}': {}", cli.specs.display(), e);
            std::process::exit(1);
        }
    };

    let mut builder = Builder::with_config(document, config);
    if let Err(e) = builder.create_elements(&specs) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    for pass in 0..cli.ticks {
        let outcome = builder.tick();
        debug!(pass, ?outcome, "templating pass");
    }

    println!("{}", builder.document().markup());
}
