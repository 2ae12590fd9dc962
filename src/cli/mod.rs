//! Command-line interface
//!
//! Operator commands for wallets and for running a local ledger node.

pub mod commands;

pub use commands::{Command, Opt};
