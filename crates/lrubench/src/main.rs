//! lrubench - concurrent load driver for LruStore

use std::thread;
use std::time::Instant;

use anyhow::{ensure, Result};
use clap::Parser;
use lrustore::LruStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store capacity (number of entries)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// Worker threads
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Operations per thread
    #[arg(short, long, default_value_t = 100000)]
    ops: u64,

    /// Size of the key space
    #[arg(short, long, default_value_t = 20000)]
    keys: u64,

    /// Fraction of operations that are gets (0.0 to 1.0)
    #[arg(short, long, default_value_t = 0.8)]
    read_ratio: f64,

    /// RNG seed for a reproducible workload
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Args {
    fn validate(&self) -> Result<()> {
        ensure!(self.threads > 0, "--threads must be at least 1");
        ensure!(self.keys > 0, "--keys must be at least 1");
        ensure!(
            (0.0..=1.0).contains(&self.read_ratio),
            "--read-ratio must be between 0.0 and 1.0, got {}",
            self.read_ratio
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    args.validate()?;

    info!("Starting lrubench v{}", env!("CARGO_PKG_VERSION"));
    info!("Store capacity: {}", args.capacity);
    info!(
        "Workload: {} threads x {} ops, {} keys, read ratio {}",
        args.threads, args.ops, args.keys, args.read_ratio
    );

    let store: LruStore<u64, u64> = LruStore::new(args.capacity)?;
    let base_seed = args.seed.unwrap_or_else(rand::random);
    debug!(base_seed, "workload seed");

    let started = Instant::now();
    thread::scope(|s| {
        for t in 0..args.threads {
            let store = &store;
            let args = &args;
            s.spawn(move || run_worker(store, args, base_seed.wrapping_add(t as u64)));
        }
    });
    let elapsed = started.elapsed();

    store.check_invariants()?;

    let total_ops = args.ops * args.threads as u64;
    let ops_per_sec = total_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    let stats = store.stats();

    info!("Finished {} ops in {:.3?}", total_ops, elapsed);
    info!("Throughput: {:.0} ops/sec", ops_per_sec);
    info!(
        "Hits: {}, misses: {}, hit ratio: {:.2}%",
        stats.hits(),
        stats.misses(),
        stats.hit_ratio() * 100.0
    );
    info!(
        "Inserts: {}, updates: {}, evictions: {}",
        stats.inserts(),
        stats.updates(),
        stats.evictions()
    );
    info!("Final size: {}/{}", store.len(), store.capacity());

    Ok(())
}

fn run_worker(store: &LruStore<u64, u64>, args: &Args, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);

    for i in 0..args.ops {
        let key = rng.gen_range(0..args.keys);
        if rng.gen_bool(args.read_ratio) {
            store.get(&key);
        } else {
            store.put(key, i);
        }
    }
}
