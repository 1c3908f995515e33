use std::sync::Arc;

use anyhow::Context;
use clap::Parser as _;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use txbench::cli::{BalanceOfCmd, Cli, Commands, CommonArgs};
use txbench::config::BenchConfig;
use txbench::core::client::RpcSubmitterFactory;
use txbench::setup::{balance_of, deploy_contract, first_endpoint_client, load_account};
use txbench::utils::logging::init_logging;
use txbench::worker::build_dispatcher;
use txbench::BenchError;
use txbench_sdk::Address;

#[tokio::main]
async fn main() {
    dotenv().ok();
    if let Err(err) = init_logging() {
        logging_failed(err);
    }
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init { common } => init(common).await,
        Commands::Test { common } => test(common).await,
        Commands::BalanceOf { balance_command } => query_balance(balance_command).await,
    };

    if let Err(err) = result {
        error!(error = %err, error_chain = ?err, "Command failed");
        std::process::exit(1);
    }
}

// No subscriber is installed, stderr is the only way out.
#[allow(clippy::print_stderr)]
fn logging_failed(err: anyhow::Error) -> ! {
    eprintln!("Failed to initialize logging: {err:#}");
    std::process::exit(1);
}

fn load_config(common: &CommonArgs) -> anyhow::Result<BenchConfig> {
    let config = BenchConfig::from_json_file(&common.config)?;
    config.validate().with_context(|| format!("Invalid config {}", common.config.display()))?;
    Ok(config)
}

async fn init(common: &CommonArgs) -> anyhow::Result<()> {
    let config = load_config(common)?;
    let account = load_account(&config, common.password.as_deref())?;
    let client = first_endpoint_client(&config)?;
    let code_path = config.contract_code_path()?;
    info!(endpoint = %client.endpoint(), code = %code_path.display(), "Deploying contract");
    let deployed = deploy_contract(&client, &account, code_path).await?;
    info!(contract = %deployed.address, "Contract ready, set it as Contract in the config");
    Ok(())
}

async fn test(common: &CommonArgs) -> anyhow::Result<()> {
    let config = load_config(common)?;
    let account = Arc::new(load_account(&config, common.password.as_deref())?);
    let submitters = Arc::new(RpcSubmitterFactory::new(config.submit_timeout()));
    let dispatcher = build_dispatcher(&config, account, submitters)?;

    let cancel = dispatcher.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping workers");
            cancel.cancel();
        }
    });
    let report = dispatcher.run().await;
    interrupt.abort();
    let report = report?;

    info!(
        total = report.total_transactions,
        elapsed_ms = report.elapsed.as_millis() as u64,
        tps = report.tps(),
        emitted = report.emitted(),
        submitted = report.submitted(),
        failed = report.failed(),
        recorded = report.recorded(),
        "Run finished: {report}"
    );
    if !report.aborted.is_empty() {
        return Err(BenchError::WorkersAborted(report.aborted.len()).into());
    }
    Ok(())
}

async fn query_balance(cmd: &BalanceOfCmd) -> anyhow::Result<()> {
    let config = load_config(&cmd.common)?;
    let contract: Address = config
        .contract
        .as_deref()
        .context("Contract is required to query a balance")?
        .parse()
        .context("Invalid Contract address")?;
    let owner = match cmd.address.as_deref() {
        Some(address) => address.parse().with_context(|| format!("Invalid address `{address}`"))?,
        None => load_account(&config, cmd.common.password.as_deref())?.address(),
    };
    let client = first_endpoint_client(&config)?;
    let balance = balance_of(&client, contract, owner).await?;
    info!(address = %owner, %balance, "balanceOf");
    Ok(())
}
