//! CLI commands for the multisig wallet
//!
//! Implements all command handlers for the CLI interface.

use crate::cli::scenario::{Scenario, StepOutcome};
use crate::config::LedgerConfig;
use crate::identity::Identity;
use crate::ledger::{EventLog, LogObserver, WalletLedger};
use crate::transfer::Treasury;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Write a new wallet configuration
pub fn cmd_init(
    owners: Vec<Identity>,
    threshold: usize,
    label: Option<String>,
    output: &Path,
) -> CliResult<()> {
    let mut config = LedgerConfig::new(owners, threshold);
    config.label = label;

    // Build once so an invalid owner set never reaches disk
    let ledger = WalletLedger::from_config(&config)?;

    if output.exists() {
        println!("⚠️  Configuration already exists at {:?}", output);
        return Ok(());
    }

    config.save(output)?;

    println!("🔐 Multisig wallet configured!");
    println!("   📍 Address: {}", ledger.address());
    println!("   🔑 Policy: {}", config.description());
    for (position, owner) in ledger.owners().iter().enumerate() {
        println!("   ├─ Owner #{}: {}", position, owner);
    }
    if let Some(l) = &config.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("   📁 Saved to {:?}", output);

    Ok(())
}

/// Print the wallet address for a configuration
pub fn cmd_address(config_path: &Path) -> CliResult<()> {
    let config = LedgerConfig::load(config_path)?;
    let ledger = WalletLedger::from_config(&config)?;

    println!("{}", ledger.address());
    Ok(())
}

/// Ledger state after a scripted run
pub struct Session {
    pub ledger: WalletLedger,
    pub treasury: Treasury,
    pub events: EventLog,
    pub outcomes: Vec<StepOutcome>,
}

/// Build a fresh ledger from `config_path` and apply the scenario in `script_path`
pub fn run_session(config_path: &Path, script_path: &Path, fund: u128) -> CliResult<Session> {
    let config = LedgerConfig::load(config_path)?;
    let scenario = Scenario::load(script_path)?;

    let ledger = WalletLedger::from_config(&config)?;
    let events = EventLog::new();
    ledger.subscribe(events.clone());
    ledger.subscribe(LogObserver);

    let mut treasury = Treasury::new(ledger.address());
    if fund > 0 {
        treasury.deposit(fund)?;
    }

    let outcomes = scenario.run(&ledger, &mut treasury);

    Ok(Session {
        ledger,
        treasury,
        events,
        outcomes,
    })
}

/// Run a scenario against a fresh ledger
pub fn cmd_run(config_path: &Path, script_path: &Path, fund: u128) -> CliResult<()> {
    let session = run_session(config_path, script_path, fund)?;

    println!(
        "🏦 Wallet {} ({})",
        session.treasury.account(),
        session.ledger.description()
    );
    println!("▶️  Ran {} operation(s)\n", session.outcomes.len());

    let mut rejected = 0;
    for outcome in &session.outcomes {
        match &outcome.result {
            Ok(summary) => println!(
                "   ✅ #{} {:?}: {}",
                outcome.step, outcome.operation, summary
            ),
            Err(e) => {
                rejected += 1;
                println!("   ❌ #{} {:?}: {}", outcome.step, outcome.operation, e);
            }
        }
    }

    println!(
        "\n📬 {} event(s), {} rejected operation(s)",
        session.events.len(),
        rejected
    );
    for event in session.events.events() {
        println!(
            "   └─ tx #{} {} by {}",
            event.tx_index(),
            event.name(),
            event.actor().short()
        );
    }

    print_transactions(&session.ledger);
    println!("\n💰 Final wallet balance: {}", session.treasury.balance());

    Ok(())
}

fn print_transactions(ledger: &WalletLedger) {
    let transactions = ledger.transactions();
    if transactions.is_empty() {
        println!("📭 No transactions proposed.");
        return;
    }

    println!("📋 Transactions:");
    for tx in &transactions {
        let status = if tx.executed {
            "executed"
        } else if tx.is_ready(ledger.required_confirmations()) {
            "ready"
        } else {
            "pending"
        };
        println!(
            "   #{} | {} | {} → {} | {}/{} | {}",
            tx.index,
            tx.proposer.short(),
            tx.value,
            tx.target.short(),
            tx.confirmation_count,
            ledger.required_confirmations(),
            status
        );
    }
}
