//! Schema Validator CLI
//!
//! Validates payloads against schemas and checks compatibility between two
//! schema files without touching the store.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_monitor::compatibility::content_diff;
use schema_monitor::{Comparator, MonitorConfig, SchemaDocument, SchemaRegistry, ValidationResult};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Validate payloads and check schema compatibility")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a payload against a schema
    Validate {
        /// JSON payload file
        payload: PathBuf,
        /// Schema document file
        #[arg(long, conflicts_with = "stored")]
        schema: Option<PathBuf>,
        /// Use the latest stored version of NAME owned by SERVICE
        #[arg(long, num_args = 2, value_names = ["NAME", "SERVICE"])]
        stored: Option<Vec<String>>,
        /// Treat a top-level array as a batch of payloads
        #[arg(long)]
        each: bool,
    },

    /// Compare two schema files
    Compare {
        /// Old schema document
        old: PathBuf,
        /// New schema document
        new: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Also print a line diff of the contents
        #[arg(long)]
        lines: bool,
        /// Exit non-zero on breaking changes regardless of configuration
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {:?}", path))
}

/// Returns whether everything checked out
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = MonitorConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            payload,
            schema,
            stored,
            each,
        } => {
            let content = match (schema, stored.as_deref()) {
                (Some(path), _) => read_json(&path)?,
                (None, Some([name, service])) => {
                    let registry = SchemaRegistry::new(config.open_store()?);
                    let history = registry.get_schema_history(name, service)?;
                    match history.into_iter().next() {
                        Some(latest) => latest.content,
                        None => bail!("Schema '{}' not found for service '{}'", name, service),
                    }
                }
                _ => bail!("one of --schema or --stored is required"),
            };

            let document = SchemaDocument::from_value(&content);
            let validator = config.validator();
            let payload = read_json(&payload)?;

            let results: Vec<ValidationResult> = match payload {
                Value::Array(events) if each => events
                    .iter()
                    .map(|event| validator.validate_document(event, &document))
                    .collect(),
                single => vec![validator.validate_document(&single, &document)],
            };

            let mut all_valid = true;
            for (index, result) in results.iter().enumerate() {
                if result.valid {
                    println!("✅ payload {} is valid", index);
                } else {
                    all_valid = false;
                    println!("❌ payload {} has {} error(s)", index, result.errors.len());
                    for issue in &result.errors {
                        println!("   └─ {}: {}", issue.path, issue.message);
                    }
                }
            }
            Ok(all_valid)
        }

        Commands::Compare {
            old,
            new,
            json,
            lines,
            strict,
        } => {
            let old_content = read_json(&old)?;
            let new_content = read_json(&new)?;

            let comparator = Comparator::with_options(config.comparator_options());
            let report = comparator.compare(
                &SchemaDocument::from_value(&old_content),
                &SchemaDocument::from_value(&new_content),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("🔍 Checking compatibility: {:?} -> {:?}", old, new);
                println!();
                println!("{}", report.to_human_readable());
                for change in &report.non_breaking {
                    println!("   └─ {} at {}", change.description, change.path);
                }
            }

            if lines {
                println!();
                print!("{}", content_diff(&old_content, &new_content));
            }

            let fail = strict || config.validation.fail_on_breaking;
            Ok(!(fail && report.has_breaking_changes))
        }
    }
}
