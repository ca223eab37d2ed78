mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::query::Origin;

#[derive(Debug, Parser)]
#[command(name = "snaploc-cli")]
#[command(about = "Query the SNAP retailer dataset from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the retailers nearest to a coordinate or zip code centroid
    Closest {
        /// Retailer CSV export
        #[arg(long, env = "SNAPLOC_DATASET_PATH")]
        dataset: PathBuf,

        #[command(flatten)]
        origin: Origin,

        /// Number of retailers to return
        #[arg(long, default_value_t = 10, value_parser = parse_k)]
        k: usize,
    },
    /// Print row counts for a dataset file
    Stats {
        /// Retailer CSV export
        #[arg(long, env = "SNAPLOC_DATASET_PATH")]
        dataset: PathBuf,
    },
}

fn parse_k(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(k) if k >= 1 => Ok(k),
        _ => Err(format!("expected a positive integer, got '{raw}'")),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Closest { dataset, origin, k } => query::run_closest(&dataset, &origin, k)?,
        Commands::Stats { dataset } => query::run_stats(&dataset)?,
    };
    println!("{output}");

    Ok(())
}
