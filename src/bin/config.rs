//! Schema Monitor Config CLI
//!
//! View and manage schema monitor configuration.

use clap::{Parser, Subcommand};
use schema_monitor::MonitorConfig;

#[derive(Parser)]
#[command(name = "schema-config")]
#[command(about = "View and manage schema monitor configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "schema-monitor.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = MonitorConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Schema Monitor Configuration\n");
                println!("Store:");
                println!("  Backend: {:?}", cfg.store.backend);
                println!("  Path: {:?}", cfg.store_path());

                println!("\nComparison:");
                println!("  Required path style: {:?}", cfg.comparison.required_path);

                println!("\nValidation:");
                println!("  Fail on breaking: {}", cfg.validation.fail_on_breaking);
                println!("  Honor required list: {}", cfg.validation.honor_required_list);
            }
        }

        Commands::Init { output } => {
            MonitorConfig::default().save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match MonitorConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Store: {:?} ({:?})", cfg.store_path(), cfg.store.backend);
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
