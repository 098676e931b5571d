use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod compiler;
mod config;
mod repl;

use commands::*;
use config::Config;
use repl::Repl;

#[derive(Parser)]
#[command(name = "qe-plancache")]
#[command(author, version, about = "Query Engine - ad-hoc SQL plan cache shell", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a SQL batch and print plan cache statistics
    Run {
        /// SQL batch to resolve
        #[arg(short, long)]
        sql: String,

        /// Argument bound to a ? marker, in order
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Partition to resolve on
        #[arg(short, long, conflicts_with = "coordinator")]
        partition: Option<u32>,

        /// Resolve on the coordinator
        #[arg(long)]
        coordinator: bool,

        /// Number of times to resolve the batch
        #[arg(short, long, default_value = "1")]
        repeat: usize,
    },

    /// Start interactive REPL
    Repl,

    /// Run a script of shell lines and print plan cache statistics
    Stats {
        /// Script file, one SQL batch or dot command per line
        #[arg(short, long)]
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Load configuration
    let config = if let Some(config_path) = cli.config {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Some(Commands::Run {
            sql,
            args,
            partition,
            coordinator,
            repeat,
        }) => {
            let target = target_from_flags(partition, coordinator);
            run_batch(&config, &sql, &args, target, repeat).await?;
        }
        Some(Commands::Stats { script }) => {
            run_script(&config, &script).await?;
        }
        Some(Commands::Repl) | None => {
            print_banner();
            let mut repl = Repl::new(config)?;
            repl.run().await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        "query_cli=debug,query_cache=debug,query_distributed=debug,query_parser=debug"
    } else {
        "query_cli=info,query_cache=warn,query_distributed=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
   ___  _              ___           _
  | _ \| | __ _ _ _   / __| __ _ __ | |_  ___
  |  _/| |/ _` | ' \ | (__ / _` / _|| ' \/ -_)
  |_|  |_|\__,_|_||_| \___|\__,_\__||_||_\___|
    "#
        .bright_cyan()
    );
    println!(
        "{}",
        "Ad-hoc SQL Plan Cache v0.1.0".bright_yellow()
    );
    println!("{}", "Type '.help' for available commands\n".bright_black());
}
