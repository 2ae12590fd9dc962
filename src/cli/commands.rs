use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pow-ledger")]
pub struct Opt {
    #[arg(long = "config", global = true, help = "Path to a TOML node configuration")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "validateaddress", about = "Check an address checksum")]
    ValidateAddress {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(
        name = "demo",
        about = "Fund a miner, send a signed transfer and mine it on a local ledger"
    )]
    Demo {
        #[arg(help = "Amount to send")]
        amount: u64,
        #[arg(long = "print-chain", help = "Print the resulting chain as JSON")]
        print_chain: bool,
    },
    #[command(name = "startnode", about = "Run a ledger with scheduled mining")]
    StartNode {
        #[arg(
            long = "run-secs",
            help = "Stop after this many seconds instead of waiting for Enter"
        )]
        run_secs: Option<u64>,
    },
}
