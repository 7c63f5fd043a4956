//! Alistaire Command-Line Interface
//!
//! Launches the terminal setup and dispatches jobs to local or remote
//! backends.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

use alistaire_cli::{DemoJob, Settings};
use alistaire_ir::Operation;

mod commands;

use commands::{backends, config, launch, run, version};

/// Alistaire - terminal launcher with remote job dispatch
#[derive(Parser)]
#[command(name = "alistaire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (YAML)
    #[arg(short, long, global = true, env = "ALISTAIRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the terminal, run the Bell job and open the community links
    Launch {
        /// Backend to use instead of the configured one
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Dispatch a job to a backend
    Run {
        /// Job to run
        #[arg(short, long, value_enum, default_value = "bell")]
        job: JobArg,

        /// Number of slots for the ghz job or the --op operations
        #[arg(long, default_value = "3")]
        slots: u32,

        /// Operation to apply instead of a named job, e.g. `h:0`, `cx:0,1`, `rz(0.5):2`
        #[arg(long = "op", value_name = "OP", conflicts_with = "job")]
        ops: Vec<Operation>,

        /// Number of shots (defaults to the configured value)
        #[arg(short, long, allow_negative_numbers = true)]
        shots: Option<i64>,

        /// Backend to use (defaults to the configured one)
        #[arg(short, long)]
        backend: Option<String>,

        /// Timeout in seconds (defaults to the configured value)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List available backends
    Backends,

    /// Show the effective settings
    Config,

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum JobArg {
    Bell,
    Ghz,
}

impl JobArg {
    fn into_job(self, slots: u32, ops: Vec<Operation>) -> DemoJob {
        if !ops.is_empty() {
            return DemoJob::Custom {
                slots,
                operations: ops,
            };
        }
        match self {
            JobArg::Bell => DemoJob::Bell,
            JobArg::Ghz => DemoJob::Ghz(slots),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Version needs no settings
    if let Commands::Version = cli.command {
        version::execute();
        return Ok(());
    }

    let result = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => match cli.command {
            Commands::Launch { backend } => launch::execute(&settings, backend.as_deref()).await,

            Commands::Run {
                job,
                slots,
                ops,
                shots,
                backend,
                timeout,
            } => {
                run::execute(
                    &settings,
                    job.into_job(slots, ops),
                    shots,
                    backend.as_deref(),
                    timeout,
                )
                .await
            }

            Commands::Backends => backends::execute(&settings).await,

            Commands::Config => config::execute(&settings, cli.config.as_deref()).await,

            Commands::Version => Ok(()),
        },
        Err(e) => Err(e.into()),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
