use std::path::PathBuf;

use clap::{Parser, Subcommand};

use geo_gate::lifecycle::{startup, Shutdown};
use geo_gate::matcher::parse_addr;
use geo_gate::observability::logging;

#[derive(Parser)]
#[command(name = "geo-gate-cli")]
#[command(about = "Check addresses against a geo-gate configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "geo-gate.toml")]
    config: PathBuf,

    /// Print startup logs (table loading, matcher summary).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether each address would be allowed
    Check {
        #[arg(required = true)]
        ips: Vec<String>,
    },
    /// List configured matchers and their prefix counts
    Providers,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.verbose {
        logging::init(&Default::default());
    }

    let shutdown = Shutdown::new();
    let gate = startup::load(&cli.config, &shutdown)?;
    let chain = gate.chain();

    match cli.command {
        Commands::Check { ips } => {
            if !gate.config.filter.enabled {
                println!("filter disabled: every request passes through");
            }
            for ip in &ips {
                match parse_addr(ip) {
                    Ok(addr) if !gate.config.filter.enabled => println!("{addr}\tallowed"),
                    Ok(addr) => match chain.decide(addr) {
                        Some(provider) => println!("{addr}\tallowed\t{provider}"),
                        None => println!("{addr}\tdenied"),
                    },
                    Err(e) => println!("{ip}\t{e}"),
                }
            }
        }
        Commands::Providers => {
            if chain.is_empty() {
                println!("no matchers configured");
            }
            for provider in chain.providers() {
                println!("{}\t{}", provider.provider(), provider.prefix_count());
            }
        }
    }

    Ok(())
}
