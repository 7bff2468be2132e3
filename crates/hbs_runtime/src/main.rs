//! Handlebars command line runner
//!
//! Thin binary over `hbs_engine`: renders or precompiles template files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hbs_engine::{Engine, EngineConfig, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hbs", about = "Render Handlebars templates with Handlebars.js")]
struct Cli {
    /// Handlebars.js to load (defaults to $HANDLEBARS_JS_PATH)
    #[arg(long, global = true)]
    handlebars: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a template to stdout
    Render(RenderArgs),
    /// Print the precompiled template spec
    Precompile {
        /// Template file
        template: PathBuf,
    },
    /// Print the crate and library versions
    Version,
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Template file
    template: PathBuf,

    /// JSON file with the render context
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Partial to register, as `name=file`
    #[arg(short, long = "partial", value_parser = parse_partial)]
    partials: Vec<(String, PathBuf)>,
}

fn parse_partial(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected name=file, got '{arg}'")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::default();
    if let Some(path) = cli.handlebars {
        config = config.path(path);
    }

    match cli.command {
        Command::Render(args) => {
            let engine = Engine::new(config)?;
            print!("{}", render(&engine, &args)?);
        }
        Command::Precompile { template } => {
            let engine = Engine::new(config)?;
            println!("{}", engine.precompile(&read(&template)?)?);
        }
        Command::Version => {
            println!("hbs {}", hbs_engine::VERSION);
            // Without a library only the crate version is known.
            match Engine::new(config).and_then(|engine| engine.version()) {
                Ok(version) => println!("handlebars {version}"),
                Err(err) => tracing::warn!("Handlebars.js unavailable: {err}"),
            }
        }
    }

    Ok(())
}

fn render(engine: &Engine, args: &RenderArgs) -> Result<String> {
    let partials = args
        .partials
        .iter()
        .map(|(name, path)| Ok((name.clone(), read(path)?)))
        .collect::<Result<Vec<_>>>()?;
    if !partials.is_empty() {
        engine.register_partials(partials)?;
    }

    let context: Value = match &args.data {
        Some(path) => serde_json::from_str(&read(path)?)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        None => Value::Object(Default::default()),
    };

    tracing::info!("rendering {}", args.template.display());
    let renderer = engine.compile(&read(&args.template)?)?;
    Ok(renderer.render(&context)?)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
