//! Combine individual logical units to initialise and run a replicore-sim process.
use anyhow::Result;
use clap::Parser;

use replicore_conf::Conf;

mod cmd;
mod init;

pub use self::cmd::Cli;

/// Initialise the replicore-sim process and invoke the selected command.
pub async fn execute(cli: Cli, conf: Conf) -> Result<()> {
    match cli.command.clone() {
        cmd::Command::Demo {
            collection,
            shards,
            replicas,
            nodes,
        } => cmd::demo::run(conf, collection, shards, replicas, nodes).await,
    }
}

/// Initialise the async runtime for the process and invoke [`execute`].
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let conf = replicore_conf::load(&cli.config)?;
    conf.runtime
        .tokio
        .clone()
        .into_runtime()
        .expect("failed tokio runtime initialisation")
        .block_on(execute(cli, conf))
}
