//! oxide-sql-template CLI
//!
//! Command-line tool for compiling SQL templates.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sql_template::{BuilderConfig, ParamContext, StatementBuilder};

/// Two-way SQL templates compiled into parameterized statements.
#[derive(Parser)]
#[command(name = "oxide-sql-template")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Builder configuration file (JSON).
    #[arg(short, long, env = "OXIDE_SQL_TEMPLATE_CONFIG")]
    config: Option<PathBuf>,

    /// Nesting limit for brackets, blocks and expression groups.
    #[arg(long, env = "OXIDE_SQL_TEMPLATE_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template into SQL text, bind values and log text.
    Render {
        /// Template file.
        template: PathBuf,

        /// Parameters as a JSON object file.
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Parse a template and report lexical or structural errors.
    Check {
        /// Template file.
        template: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Human readable sections.
    Text,
    /// The whole statement as JSON.
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BuilderConfig::default(),
    };
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    debug!(?config, "Builder configuration");
    let builder = StatementBuilder::from_config(&config);

    match cli.command {
        Commands::Render {
            template,
            params,
            format,
        } => {
            let text = read_template(&template)?;
            let context = match params {
                Some(path) => load_params(&path)?,
                None => ParamContext::new(),
            };
            let statement = builder
                .build(&text, &context)
                .with_context(|| format!("Failed to render {}", template.display()))?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&statement)?),
                Format::Text => {
                    println!("{}", statement.text);
                    println!("{:-<60}", "");
                    for (i, bound) in statement.values.iter().enumerate() {
                        println!(" {:>3}  {} ({})", i + 1, bound.value, bound.ty);
                    }
                    println!("{:-<60}", "");
                    println!("{}", statement.log);
                }
            }
        }

        Commands::Check { template } => {
            let text = read_template(&template)?;
            builder
                .parse(&text)
                .with_context(|| format!("Failed to parse {}", template.display()))?;
            info!("{} is a valid template.", template.display());
        }
    }

    Ok(())
}

fn read_template(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_config(path: &Path) -> anyhow::Result<BuilderConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_params(path: &Path) -> anyhow::Result<ParamContext> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read params {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    ParamContext::from_json(&json)
        .with_context(|| format!("Parameters in {} must be a JSON object", path.display()))
}
