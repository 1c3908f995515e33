use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Parser, Debug)]
#[command(
    name = "txbench",
    about = "Transaction emission benchmark",
    long_about = "Signs and submits a configurable volume of token transfers from one account, spread over parallel \
    workers with disjoint nonce ranges and a target aggregate rate.",
    after_help = "Examples:\n  \
    txbench init --config config.json\n  \
    txbench test --config config.json\n  \
    txbench balance-of --address 0x0123456789abcdef0123456789abcdef01234567"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy and initialize the token contract
    Init {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run the benchmark described by the config file
    Test {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Query a token balance
    BalanceOf {
        #[command(flatten)]
        balance_command: BalanceOfCmd,
    },
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Init { common } | Commands::Test { common } => common,
            Commands::BalanceOf { balance_command } => &balance_command.common,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the JSON config file
    #[arg(long, short, env = "TXBENCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Wallet password, overriding the config file's
    #[arg(long, env = "TXBENCH_WALLET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BalanceOfCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Account to query, the wallet's default account when omitted
    #[arg(long)]
    pub address: Option<String>,
}
