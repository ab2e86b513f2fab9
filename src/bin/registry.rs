//! Schema Registry CLI
//!
//! Register schema versions, inspect history, analyze impact and track
//! deployments.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_monitor::{
    Comparator, Dependency, DeploymentStatus, FileStore, MonitorConfig, SchemaRecord, SchemaRegistry,
    SchemaStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Register schema versions and track breaking changes")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Store directory (overrides the configured path)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new version of a schema
    Register {
        /// Schema name
        #[arg(short, long)]
        name: String,
        /// Version label
        #[arg(short = 'v', long)]
        version: String,
        /// Owning service
        #[arg(short = 'S', long)]
        service: String,
        /// JSON file holding the schema document
        file: PathBuf,
        /// Print the full registration result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored versions
    List {
        /// Only versions owned by this service
        #[arg(short = 'S', long)]
        service: Option<String>,
    },

    /// Show all versions of one schema, most recent first
    History {
        name: String,
        service: String,
    },

    /// Compare the two most recent versions of a schema
    Diff {
        name: String,
        service: String,
        /// Also print a line diff of the contents
        #[arg(long)]
        lines: bool,
    },

    /// Record that a consumer depends on a producer's schema
    Depend {
        producer: String,
        consumer: String,
        schema: String,
    },

    /// Show services affected by a change to a schema
    Impact {
        service: String,
        schema: String,
    },

    /// Verify checksums of every stored version
    Verify,

    /// Track rollouts of stored versions
    Deploy {
        #[command(subcommand)]
        action: DeployAction,
    },
}

#[derive(Subcommand)]
enum DeployAction {
    /// Record a deployment of a stored version
    Register {
        /// Id of the stored version
        schema_id: u64,
        /// Target environment
        environment: String,
    },

    /// Set the status of a deployment
    Status {
        id: u64,
        /// pending, monitoring, success, failed or rolled-back
        status: DeploymentStatus,
    },

    /// List deployments, most recent first
    List {
        /// Only deployments of versions owned by this service
        #[arg(short = 'S', long)]
        service: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = MonitorConfig::load_from(cli.config.as_deref())?;
    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());

    let open = || open_registry(&config, &store_path);

    match cli.command {
        Commands::Register {
            name,
            version,
            service,
            file,
            json,
        } => {
            let registry = open()?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {:?}", file))?;
            let content: serde_json::Value =
                serde_json::from_str(&raw).with_context(|| format!("parsing {:?}", file))?;

            let result = registry.register_schema(SchemaRecord::new(name, version, service, content))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "📦 Registered {} {} (id {})",
                    result.schema.identity(),
                    result.schema.version,
                    result.schema.id
                );
                match (&result.previous_version, &result.analysis) {
                    (Some(previous), Some(analysis)) => {
                        println!("🔍 Compared against {}", previous);
                        println!("{}", analysis.to_human_readable());
                    }
                    _ => println!("✨ First version of this schema"),
                }
            }

            let breaking = result
                .analysis
                .as_ref()
                .is_some_and(|analysis| analysis.has_breaking_changes);
            if breaking && config.validation.fail_on_breaking {
                std::process::exit(1);
            }
        }

        Commands::List { service } => {
            let registry = open()?;
            let entries = match service {
                Some(service) => registry.get_schemas_by_service(&service)?,
                None => registry.get_all_schemas()?,
            };

            if entries.is_empty() {
                println!("No schemas registered yet.");
            } else {
                println!("📚 Registered schemas:");
                for entry in entries {
                    println!(
                        "  #{:<4} {:<40} {:<12} {}",
                        entry.id,
                        entry.identity(),
                        entry.version,
                        entry.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }

        Commands::History { name, service } => {
            let history = open()?.get_schema_history(&name, &service)?;
            if history.is_empty() {
                bail!("Schema '{}' not found for service '{}'", name, service);
            }
            for (index, entry) in history.iter().enumerate() {
                let marker = if index == 0 { " (latest)" } else { "" };
                println!(
                    "  {} {} {}{}",
                    entry.version,
                    entry.created_at.format("%Y-%m-%d"),
                    entry.checksum,
                    marker
                );
            }
        }

        Commands::Diff {
            name,
            service,
            lines,
        } => {
            let history = open()?.get_schema_history(&name, &service)?;
            let [newest, previous, ..] = history.as_slice() else {
                bail!("Schema '{}' has fewer than two versions", name);
            };

            println!("📊 {}: {} -> {}", newest.identity(), previous.version, newest.version);
            let comparator = Comparator::with_options(config.comparator_options());
            let report = comparator.compare(&previous.document(), &newest.document());
            println!("{}", report.to_human_readable());
            for change in report.non_breaking.iter() {
                println!("   └─ {}: {}", change.path, change.description);
            }

            if lines {
                println!();
                print!(
                    "{}",
                    schema_monitor::compatibility::content_diff(&previous.content, &newest.content)
                );
            }
        }

        Commands::Depend {
            producer,
            consumer,
            schema,
        } => {
            let dep = open()?.add_dependency(Dependency::new(producer, consumer, schema))?;
            println!(
                "✅ {} now depends on {}/{}",
                dep.consumer_service, dep.producer_service, dep.schema_name
            );
        }

        Commands::Impact { service, schema } => {
            let impact = open()?.get_impacted_services(&service, &schema)?;
            println!("{}", serde_json::to_string_pretty(&impact)?);
        }

        Commands::Verify => {
            let store = FileStore::open(&store_path)?;
            if !store.verify()? {
                eprintln!("❌ Checksum verification failed in {:?}", store.root());
                std::process::exit(1);
            }
            println!("✅ All checksums verified in {:?}", store.root());
        }

        Commands::Deploy { action } => {
            let registry = open()?;
            match action {
                DeployAction::Register {
                    schema_id,
                    environment,
                } => {
                    let deployment = registry.register_deployment(schema_id, &environment)?;
                    println!(
                        "🚀 Deployment #{} of {}/{} {} to {} ({})",
                        deployment.id,
                        deployment.service_name,
                        deployment.schema_name,
                        deployment.version,
                        deployment.environment,
                        deployment.status
                    );
                }
                DeployAction::Status { id, status } => {
                    let deployment = registry.update_deployment_status(id, status)?;
                    println!("✅ Deployment #{} is now {}", deployment.id, deployment.status);
                }
                DeployAction::List { service } => {
                    let deployments = match service {
                        Some(service) => registry.get_deployments_by_service(&service)?,
                        None => registry.get_all_deployments()?,
                    };
                    if deployments.is_empty() {
                        println!("No deployments recorded yet.");
                    }
                    for deployment in deployments {
                        println!(
                            "  #{:<4} {:<40} {:<12} {:<12} {:<12} {}",
                            deployment.id,
                            format!("{}/{}", deployment.service_name, deployment.schema_name),
                            deployment.version,
                            deployment.environment,
                            deployment.status,
                            deployment.deployed_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn open_registry(
    config: &MonitorConfig,
    store_path: &Path,
) -> anyhow::Result<SchemaRegistry<Box<dyn SchemaStore>>> {
    Ok(SchemaRegistry::with_comparator(
        config.open_store_at(store_path)?,
        Comparator::with_options(config.comparator_options()),
    ))
}
