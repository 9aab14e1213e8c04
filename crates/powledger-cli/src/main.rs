mod config;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use powledger_core::{Chain, ChainStore, MiningControl};
use powledger_storage::{open_or_create, SledStore};
use tokio::task;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "powledger")]
#[command(about = "Append to and print a proof-of-work chain stored on disk")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a block holding DATA and append it to the chain
    Addblock {
        /// Block data
        #[arg(short, long)]
        data: String,
    },
    /// Print every block from the tip back to genesis
    Printchain,
}

/// Parse arguments, rejecting an empty `--data` with the same usage output
/// as any other bad argument.
fn parse_cli() -> Result<Cli, clap::Error> {
    let cli = Cli::try_parse()?;
    if let Command::Addblock { data } = &cli.cmd {
        if data.is_empty() {
            let mut cmd = Cli::command();
            let err = match cmd.find_subcommand_mut("addblock") {
                Some(sub) => sub.error(ErrorKind::InvalidValue, "--data must not be empty"),
                None => cmd.error(ErrorKind::InvalidValue, "--data must not be empty"),
            };
            return Err(err);
        }
    }
    Ok(cli)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cmd: Command) -> Result<()> {
    let config = CliConfig::from_env()?;
    let chain = open_or_create(&config.db_path, config.pow)
        .with_context(|| format!("opening chain at {}", config.db_path.display()))?;

    match cmd {
        Command::Addblock { data } => add_block(chain, data).await,
        Command::Printchain => {
            print_chain(&chain)?;
            chain.close().context("closing chain")
        }
    }
}

/// Mine on a blocking thread so Ctrl-C can stop the search cooperatively.
async fn add_block(mut chain: Chain<SledStore>, data: String) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let control = MiningControl::default().with_stop_flag(stop.clone());
    info!(data = %data, "mining block");

    let mut mining = task::spawn_blocking(move || {
        let block = chain.append_with(data, &control);
        (chain, block)
    });

    let (chain, block) = tokio::select! {
        res = &mut mining => res?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, stopping miner");
            stop.store(true, Ordering::Relaxed);
            mining.await?
        }
    };

    let block = block.context("appending block")?;
    chain.close().context("closing chain")?;
    println!("Success!");
    println!("Hash: {}", hex::encode(&block.hash));
    Ok(())
}

fn print_chain<S: ChainStore>(chain: &Chain<S>) -> Result<()> {
    for block in chain.iter() {
        let block = block.context("reading chain")?;
        println!("Prev. hash: {}", hex::encode(&block.previous_hash));
        println!("Data: {}", String::from_utf8_lossy(&block.data));
        println!("Hash: {}", hex::encode(&block.hash));
        println!("PoW: {}", chain.validate(&block));
        println!();
    }
    Ok(())
}
