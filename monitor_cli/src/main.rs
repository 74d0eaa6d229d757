mod commands;
mod ui;
mod workload;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use workload::Workload;

#[derive(Parser)]
#[command(name = "monitor")]
#[command(about = "In-process execution time and stay-set monitoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic concurrent workload and report the collected values
    Run {
        /// Path to monitor config file (YAML, TOML, or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of concurrent producer tasks
        #[arg(short, long, default_value_t = 8)]
        tasks: usize,

        /// Requests issued by every task
        #[arg(short, long, default_value_t = 100)]
        iterations: usize,

        /// Upper bound of a single step's delay
        #[arg(long, default_value = "2ms", value_parser = humantime::parse_duration)]
        max_delay: Duration,

        /// Report format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed of the delay generator
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Validate a monitor config file
    Validate {
        /// Path to config file
        config_file: PathBuf,
    },

    /// Serve collected values over HTTP
    Serve {
        /// Path to monitor config file (YAML, TOML, or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long, default_value_t = 9100)]
        port: u16,

        /// Keep a background workload running so there is something to see
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            tasks,
            iterations,
            max_delay,
            format,
            output,
            seed,
        } => {
            let workload = Workload {
                tasks,
                iterations,
                max_delay,
                seed,
            };
            commands::run::execute(config, workload, format, output).await?;
        }

        Commands::Validate { config_file } => {
            commands::validate::execute(config_file).await?;
        }

        Commands::Serve { config, port, demo } => {
            let demo = demo.then(|| Workload {
                tasks: 4,
                iterations: 10,
                max_delay: Duration::from_millis(20),
                seed: 42,
            });
            commands::serve::execute(config, port, demo).await?;
        }
    }

    Ok(())
}
