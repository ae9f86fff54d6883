//! Command-line front end
//!
//! Configuration management and scripted runs against an in-memory
//! ledger and treasury.

pub mod commands;
pub mod scenario;

pub use commands::{cmd_address, cmd_init, cmd_run, run_session, CliResult, Session};
pub use scenario::{Operation, Scenario, StepError, StepOutcome};
