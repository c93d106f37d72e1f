//! RecDB CLI
//!
//! Command-line tools for exercising RecDB engines.
//!
//! # Commands
//!
//! - `load` - Run a concurrent mixed workload and report throughput
//! - `layout` - Show how a configuration maps onto partitions and workers
//! - `version` - Show version information

mod commands;

use clap::{Args, Parser, Subcommand};
use recdb_core::{Backend, StoreConfig, DEFAULT_CACHE_CAPACITY_BYTES, DEFAULT_QUEUE_CAPACITY};
use tracing_subscriber::EnvFilter;

/// RecDB command-line tools.
#[derive(Parser)]
#[command(name = "recdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Engine selection shared by every command.
#[derive(Args)]
struct StoreArgs {
    /// Engine to use (sharded, sharded-affine, actor, lock-free, off-heap)
    #[arg(global = true, short, long, default_value = "sharded")]
    backend: String,

    /// Requested partition count (0 = derive from CPU count)
    #[arg(global = true, short, long, default_value_t = 0)]
    partitions: usize,

    /// Threads per core-affine scan pool
    #[arg(global = true, long, default_value_t = 1)]
    workers_per_pool: usize,

    /// Inbound queue length of the actor engine
    #[arg(global = true, long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Byte budget of the off-heap cache
    #[arg(global = true, long, default_value_t = DEFAULT_CACHE_CAPACITY_BYTES)]
    cache_bytes: u64,
}

impl StoreArgs {
    fn to_config(&self) -> StoreConfig {
        StoreConfig::new()
            .backend(Backend::from_name_or_default(&self.backend))
            .partitions(self.partitions)
            .workers_per_pool(self.workers_per_pool)
            .queue_capacity(self.queue_capacity)
            .cache_capacity_bytes(self.cache_bytes)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a concurrent mixed workload and report throughput
    Load {
        /// Worker threads
        #[arg(short, long, default_value_t = 4)]
        threads: usize,

        /// Operations per thread
        #[arg(short, long, default_value_t = 100_000)]
        ops: usize,

        /// Percentage of operations that are reads
        #[arg(short, long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(0..=100))]
        read_ratio: u8,

        /// Records created before the workload starts
        #[arg(short, long, default_value_t = 10_000)]
        seed: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show how a configuration maps onto partitions and workers
    Layout {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Load {
            threads,
            ops,
            read_ratio,
            seed,
            format,
        } => {
            let workload = commands::load::Workload {
                threads,
                ops_per_thread: ops,
                read_ratio,
                seed_records: seed,
            };
            commands::load::run(&cli.store.to_config(), &workload, &format)?;
        }
        Commands::Layout { format } => {
            commands::layout::run(&cli.store.to_config(), &format)?;
        }
        Commands::Version => {
            println!("RecDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RecDB Core v{}", recdb_core::VERSION);
        }
    }

    Ok(())
}
