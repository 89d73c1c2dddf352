//! Developer tasks for slotgen
//!
//! Usage:
//!   cargo xtask layout --total-bits 32 --generation-bits 8   # Print handle masks
//!   cargo xtask stress --ops 100000 --seed 7                 # Randomized table workload
//!   cargo xtask default-config arena.ron                     # Write a default config

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotgen::{ArenaConfig, GenerationalHandle, HandleLayout, HandleTable, Id32, Id64};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Developer tasks for slotgen")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bit layout of a handle type
    Layout {
        /// Handle width: 32 or 64
        #[arg(long, default_value_t = 32)]
        total_bits: u32,
        /// Bits reserved for the generation counter
        #[arg(long, default_value_t = 8)]
        generation_bits: u32,
    },
    /// Run a seeded random insert/remove workload against a handle table
    Stress {
        /// Number of operations
        #[arg(long, default_value_t = 10_000)]
        ops: u32,
        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Use 64-bit handles (32-bit generations) instead of Id32
        #[arg(long)]
        wide: bool,
        /// Arena config (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the default arena config as RON
    DefaultConfig {
        /// Output path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout { total_bits, generation_bits } => print_layout(total_bits, generation_bits),
        Commands::Stress { ops, seed, wide, config } => {
            let config = load_config(config.as_deref())?;
            if wide {
                stress::<Id64>(ops, seed, config)
            } else {
                stress::<Id32>(ops, seed, config)
            }
        }
        Commands::DefaultConfig { path } => {
            ArenaConfig::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ArenaConfig> {
    match path {
        Some(path) => ArenaConfig::load(path).with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(ArenaConfig::default()),
    }
}

/// Print masks and limits for a layout
fn print_layout(total_bits: u32, generation_bits: u32) -> Result<()> {
    let layout = HandleLayout::try_new(total_bits, generation_bits)?;
    let digits = (total_bits / 4) as usize;

    println!("handle width:     {} bits", layout.total_bits());
    println!("index bits:       {}", layout.index_bits());
    println!("generation bits:  {} ({})", layout.generation_bits(), layout.generation_type().name());
    println!("index mask:       {:#0w$x}", layout.index_mask(), w = digits + 2);
    println!("generation mask:  {:#0w$x}", layout.generation_mask(), w = digits + 2);
    println!("invalid handle:   {:#0w$x}", layout.invalid_bits(), w = digits + 2);
    println!("max slots:        {}", layout.max_index() + 1);
    println!("reuses per slot:  {}", layout.max_generation());
    Ok(())
}

/// Random workload that checks every issued handle stays unique while live
/// and dead once removed.
///
/// Narrow handles run out of generations quickly under LIFO reuse; the
/// table retires those slots and the run reports how many.
fn stress<H: GenerationalHandle>(ops: u32, seed: u64, config: ArenaConfig) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table: HandleTable<u64, H> = HandleTable::with_config(config);
    let mut live: Vec<(H, u64)> = Vec::new();
    let mut removed = 0u64;
    let mut compaction_hints = 0u64;

    info!(ops, seed, "starting stress run");

    for tag in 0..ops as u64 {
        if live.is_empty() || rng.gen_bool(0.5) {
            live.push((table.insert(tag), tag));
        } else {
            let (handle, value) = live.swap_remove(rng.gen_range(0..live.len()));
            let got = table.remove(handle);
            anyhow::ensure!(got == Some(value), "handle {:?} returned {:?}, expected {}", handle, got, value);
            anyhow::ensure!(!table.contains(handle), "handle {:?} still live after removal", handle);
            removed += 1;
        }
        if table.wants_compaction() {
            compaction_hints += 1;
        }
        anyhow::ensure!(
            table.capacity() == table.len() + table.free_count() + table.retired_count(),
            "slot accounting broken: {} slots, {} live, {} free, {} retired",
            table.capacity(),
            table.len(),
            table.free_count(),
            table.retired_count()
        );
    }

    for (handle, value) in &live {
        anyhow::ensure!(table.get(*handle) == Some(value), "lost value behind {:?}", handle);
    }

    println!("operations:        {}", ops);
    println!("removed:           {}", removed);
    println!("retired:           {}", table.retired_count());
    println!("live:              {}", table.len());
    println!("slots:             {}", table.capacity());
    println!("free:              {}", table.free_count());
    println!("compaction hints:  {}", compaction_hints);
    Ok(())
}
