//! Built-in `replicore-sim` commands.
use clap::Parser;
use clap::Subcommand;

pub mod demo;

/// Simulated cluster state provider, for exercising orchestration test harnesses.
#[derive(Debug, Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the replicore-sim configuration to use.
    #[arg(short = 'c', long = "config", default_value_t = String::from("replicore-sim.yaml"))]
    pub config: String,

    /// Select the replicore-sim command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Select the replicore-sim command to run.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Create a collection on a fresh in-memory cluster, wait for it to settle, and print the
    /// resulting cluster state as JSON.
    Demo {
        /// Name of the collection to create.
        #[arg(long, default_value_t = String::from("demo"))]
        collection: String,

        /// Number of shards to split the collection into.
        #[arg(long, default_value_t = 2)]
        shards: u32,

        /// Number of replicas per shard.
        #[arg(long, default_value_t = 2)]
        replicas: u32,

        /// Number of simulated nodes to start the cluster with.
        #[arg(long, default_value_t = 4)]
        nodes: u32,
    },
}
