use clap::Parser;
use log::{error, info, LevelFilter};
use pow_ledger::{validate_address, Command, Ledger, NodeConfig, Opt, Wallet};
use std::io::BufRead;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    match opt.command {
        Command::Createwallet => {
            let wallet = Wallet::new()?;
            println!("{}", serde_json::to_string_pretty(&wallet.info())?);
        }
        Command::ValidateAddress { address } => {
            if validate_address(&address) {
                println!("{address} is valid");
            } else {
                return Err(format!("Invalid address: {address}").into());
            }
        }
        Command::Demo {
            amount,
            print_chain,
        } => {
            let config = NodeConfig::resolve(opt.config.as_deref())?;
            if config.mining_reward == 0 {
                return Err("demo needs a positive mining_reward to fund the miner".into());
            }
            let miner = Wallet::new()?;
            let ledger = Ledger::new(
                miner.get_address(),
                miner.get_public_key().clone(),
                config.ledger_config(),
            )?;

            // Rewards land one cycle after they are earned.
            while ledger.calculate_total_amount(miner.get_address()) < i128::from(amount) {
                if !ledger.mining() {
                    return Err("Mining halted before the miner was funded".into());
                }
            }

            let recipient = Wallet::new()?;
            let transaction = miner.new_transaction(recipient.get_address(), amount)?;
            ledger.try_add_transaction(transaction)?;
            ledger.try_mining()?;

            println!("Chain length: {}", ledger.chain_len());
            println!(
                "Balance of {}: {}",
                miner.get_address(),
                ledger.calculate_total_amount(miner.get_address())
            );
            println!(
                "Balance of {}: {}",
                recipient.get_address(),
                ledger.calculate_total_amount(recipient.get_address())
            );
            if print_chain {
                println!("{}", ledger.chain_json()?);
            }
        }
        Command::StartNode { run_secs } => {
            let config = NodeConfig::resolve(opt.config.as_deref())?;
            let miner = Wallet::new()?;
            info!("Mining rewards go to {}", miner.get_address());
            info!("Miner public key {}", miner.get_public_key());

            let ledger = Arc::new(Ledger::new(
                miner.get_address(),
                miner.get_public_key().clone(),
                config.ledger_config(),
            )?);
            ledger.start_mining()?;

            match run_secs {
                Some(secs) => thread::sleep(Duration::from_secs(secs)),
                None => {
                    println!("Mining every {}s. Press Enter to stop.", config.mining_interval_secs);
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                }
            }
            ledger.stop_mining();

            println!("Chain length: {}", ledger.chain_len());
            println!(
                "Balance of {}: {}",
                miner.get_address(),
                ledger.calculate_total_amount(miner.get_address())
            );
        }
    }
    Ok(())
}
