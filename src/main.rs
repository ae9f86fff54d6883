//! Multisig wallet CLI application
//!
//! A command-line interface for configuring wallets and running scripted
//! sessions against the ledger.

use clap::{Parser, Subcommand};
use multisig_ledger::cli;
use multisig_ledger::Identity;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multi-signature custody wallet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a wallet configuration
    Init {
        /// Owner identity (repeat for each owner)
        #[arg(long = "owner", required = true)]
        owners: Vec<Identity>,

        /// Confirmations required to execute
        #[arg(short, long)]
        threshold: usize,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,

        /// Output file path
        #[arg(short = 'o', long, default_value = "wallet.json")]
        output: PathBuf,
    },

    /// Print the wallet address for a configuration
    Address {
        /// Wallet configuration file
        #[arg(short, long, default_value = "wallet.json")]
        config: PathBuf,
    },

    /// Run a scenario of operations against a fresh ledger
    Run {
        /// Wallet configuration file
        #[arg(short, long, default_value = "wallet.json")]
        config: PathBuf,

        /// Scenario file
        #[arg(short, long)]
        script: PathBuf,

        /// Initial wallet balance
        #[arg(short, long, default_value = "0")]
        fund: u128,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            owners,
            threshold,
            label,
            output,
        } => cli::cmd_init(owners, threshold, label, &output)?,

        Commands::Address { config } => cli::cmd_address(&config)?,

        Commands::Run {
            config,
            script,
            fund,
        } => cli::cmd_run(&config, &script, fund)?,
    }

    Ok(())
}
