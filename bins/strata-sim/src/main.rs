//! strata-sim — Issuance projections for Strata operators.
//!
//! Converts annual issuance percentages into the per-block fixed-point
//! rates the engine consumes, and projects supply and issued rewards over
//! a block horizon using the same closed-form compounding as the engine.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use strata_core::constants::{BLOCKS_PER_YEAR, FIXED_POINT_SCALE, GRAIN};
use strata_rewards::issuance::compound_issuance;
use tracing::debug;

/// Issuance simulator for the Strata protocol.
#[derive(Parser)]
#[command(name = "strata-sim")]
#[command(version, about = "Project Strata issuance without touching a ledger.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an annual issuance percentage to a per-block rate.
    Rate(RateArgs),
    /// Project supply and issued rewards over a block horizon.
    Project(ProjectArgs),
}

#[derive(Args)]
struct RateArgs {
    /// Annual issuance in percent (e.g. 3.0).
    annual_percent: f64,
}

#[derive(Args)]
struct ProjectArgs {
    /// Annual issuance in percent.
    #[arg(long, conflicts_with = "rate")]
    annual_percent: Option<f64>,

    /// Per-block rate at 1e18 fixed point (e.g. 1000122722344290393).
    #[arg(long)]
    rate: Option<u128>,

    /// Starting total supply in whole STRATA.
    #[arg(long, default_value_t = 10_004_000_000.0)]
    supply: f64,

    /// Horizon in blocks (default: one year).
    #[arg(long, default_value_t = BLOCKS_PER_YEAR)]
    blocks: u64,

    /// Number of projection rows.
    #[arg(long, default_value_t = 10)]
    rows: u64,

    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Rate(args) => show_rate(args),
        Commands::Project(args) => project(args),
    }
}

/// Per-block fixed-point rate for an annual percentage:
/// `(1 + annual/100)^(1/BLOCKS_PER_YEAR)` at 1e18 scale.
fn per_block_rate(annual_percent: f64) -> Result<u128> {
    if annual_percent < 0.0 {
        bail!("annual issuance must be non-negative (rates below 1.0 are not legal)");
    }
    let yearly = 1.0 + annual_percent / 100.0;
    let per_block = yearly.powf(1.0 / BLOCKS_PER_YEAR as f64);
    Ok((per_block * FIXED_POINT_SCALE as f64).round() as u128)
}

fn show_rate(args: RateArgs) -> Result<()> {
    let rate = per_block_rate(args.annual_percent)?;
    println!("annual:    {:.4}%", args.annual_percent);
    println!("per-block: {rate} (fixed-point 1e18)");
    println!("blocks/yr: {BLOCKS_PER_YEAR}");
    Ok(())
}

fn project(args: ProjectArgs) -> Result<()> {
    let rate = match (args.annual_percent, args.rate) {
        (Some(annual), None) => per_block_rate(annual)?,
        (None, Some(rate)) => rate,
        _ => bail!("pass exactly one of --annual-percent or --rate"),
    };
    if rate < FIXED_POINT_SCALE {
        bail!("per-block rate {rate} is below 1.0");
    }
    if args.supply < 0.0 || args.rows == 0 {
        bail!("supply must be non-negative and rows at least 1");
    }
    let supply = (args.supply * GRAIN as f64) as u128;
    debug!(rate, supply, blocks = args.blocks, "sim: projecting");

    let mut points = Vec::with_capacity(args.rows as usize);
    for i in 1..=args.rows {
        let block = args.blocks * i / args.rows;
        let issued = compound_issuance(supply, rate, block)?;
        points.push((block, issued));
    }

    if args.json {
        let rows: Vec<serde_json::Value> = points
            .iter()
            .map(|(block, issued)| {
                serde_json::json!({
                    "block": block,
                    "issued_grains": issued.to_string(),
                    "issued": *issued as f64 / GRAIN as f64,
                    "supply": (supply + issued) as f64 / GRAIN as f64,
                })
            })
            .collect();
        let out = serde_json::json!({
            "rate_per_block": rate.to_string(),
            "start_supply": args.supply,
            "points": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=== ISSUANCE PROJECTION ===");
    println!("rate:   {rate} per block (fixed-point 1e18)");
    println!("supply: {:.4} STRATA", args.supply);
    println!();
    println!("{:>12}  {:>20}  {:>22}", "block", "issued (STRATA)", "supply (STRATA)");
    for (block, issued) in points {
        println!(
            "{:>12}  {:>20.4}  {:>22.4}",
            block,
            issued as f64 / GRAIN as f64,
            (supply + issued) as f64 / GRAIN as f64,
        );
    }
    Ok(())
}
