//! The training executor.
//!
//! A thin wrapper around an external federated-learning server: it
//! validates the requested aggregation strategy, starts the server, waits
//! for the configured number of rounds to complete and persists the
//! aggregated parameters as a round-numbered checkpoint. The aggregation
//! algorithm itself is entirely the external framework's business.

use std::{
    path::{Path, PathBuf},
    process,
};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use structopt::StructOpt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::info;
use tracing_subscriber::*;

/// The aggregation strategies the executor knows how to run.
const ALLOWED_STRATEGIES: &[&str] = &["FedAvg"];

/// Name of the file the aggregation server leaves its final parameters in.
const AGGREGATE_FILE: &str = "aggregated.bin";

#[derive(Debug, StructOpt)]
#[structopt(
    name = "trainer",
    about = "Runs a federated-training round schedule against an external aggregation server"
)]
struct Opt {
    /// Address the aggregation server listens on
    #[structopt(long)]
    server_address: Option<String>,

    /// Number of training rounds to run
    #[structopt(long)]
    rounds: Option<u32>,

    /// Aggregation strategy
    #[structopt(long)]
    strategy: Option<String>,

    /// YAML file carrying server_address, rounds and strategy
    #[structopt(long, parse(from_os_str))]
    parameters_file: Option<PathBuf>,

    /// Directory the checkpoint artifacts are written to
    #[structopt(long, parse(from_os_str), default_value = ".")]
    output_path: PathBuf,

    /// The external federated-learning server to start
    #[structopt(long, default_value = "flower-server")]
    server_bin: String,
}

/// The parameters of one training run, either from the command line
/// flags or from a parameters file.
#[derive(Debug, PartialEq, Deserialize)]
struct ServerParameters {
    server_address: String,
    rounds: u32,
    strategy: String,
}

impl ServerParameters {
    fn from_opt(opt: &Opt) -> anyhow::Result<Self> {
        if let Some(path) = &opt.parameters_file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("couldn't read the parameters file {}", path.display()))?;
            return serde_yaml::from_str(&contents)
                .with_context(|| format!("couldn't parse the parameters file {}", path.display()));
        }
        Ok(Self {
            server_address: opt
                .server_address
                .clone()
                .ok_or_else(|| anyhow!("--server-address is required"))?,
            rounds: opt.rounds.ok_or_else(|| anyhow!("--rounds is required"))?,
            strategy: opt
                .strategy
                .clone()
                .ok_or_else(|| anyhow!("--strategy is required"))?,
        })
    }
}

fn validate_strategy(strategy: &str) -> anyhow::Result<()> {
    if ALLOWED_STRATEGIES.contains(&strategy) {
        Ok(())
    } else {
        bail!("the specified strategy couldn't be found: {}", strategy)
    }
}

/// Starts the external aggregation server and blocks until it has run
/// all configured rounds, forwarding its output to the log.
async fn run_server(
    params: &ServerParameters,
    server_bin: &str,
    output_path: &Path,
) -> anyhow::Result<()> {
    let mut child = Command::new(server_bin)
        .arg("--server-address")
        .arg(&params.server_address)
        .arg("--rounds")
        .arg(params.rounds.to_string())
        .arg("--strategy")
        .arg(&params.strategy)
        .current_dir(output_path)
        .stdout(process::Stdio::piped())
        .spawn()
        .with_context(|| format!("couldn't start the aggregation server `{}`", server_bin))?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            info!(target: "aggregation-server", "{}", line);
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        bail!("the aggregation server exited with {}", status);
    }
    Ok(())
}

/// Moves the aggregated parameters to a checkpoint named by the final
/// round, replacing any previous checkpoint of the same round.
fn persist_checkpoint(output_path: &Path, round: u32) -> anyhow::Result<PathBuf> {
    let aggregate = output_path.join(AGGREGATE_FILE);
    if !aggregate.exists() {
        bail!("the aggregation server left no aggregated parameters behind");
    }
    let checkpoint = output_path.join(format!("round-{}-weights.bin", round));
    if checkpoint.exists() {
        std::fs::remove_file(&checkpoint)?;
    }
    std::fs::rename(&aggregate, &checkpoint)?;
    Ok(checkpoint)
}

async fn run(opt: Opt) -> anyhow::Result<()> {
    let params = ServerParameters::from_opt(&opt)?;
    validate_strategy(&params.strategy)?;
    std::fs::create_dir_all(&opt.output_path)?;

    info!(
        rounds = params.rounds,
        strategy = %params.strategy,
        "starting the aggregation server"
    );
    run_server(&params, &opt.server_bin, &opt.output_path).await?;

    let checkpoint = persist_checkpoint(&opt.output_path, params.rounds)?;
    info!("saved aggregated weights to {}", checkpoint.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    let _fmt_subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(true)
        .init();

    if let Err(e) = run(opt).await {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}
