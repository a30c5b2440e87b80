//! Handgest
//!
//! Streams labelled, fixed-rate batches from recorded hand-gesture
//! sequences and reports what each epoch produced.

mod app;
mod config;
mod error;

use clap::Parser;
use config::{AppConfig, Overrides};
use handgest_data::DataType;
use std::path::PathBuf;

/// Handgest - gesture training data pipeline
#[derive(Parser, Debug)]
#[command(name = "handgest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset root containing G*/<gesture>/... folders
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Global batch size
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Upper bound on worker threads
    #[arg(long)]
    max_workers: Option<usize>,

    /// Output frame rate
    #[arg(long)]
    target_fps: Option<u32>,

    /// Frame files to read (pcd, proxy)
    #[arg(long)]
    data_type: Option<DataType>,

    /// Seed for shuffles and augmentation
    #[arg(long)]
    seed: Option<u64>,

    /// Number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Stop each pass after this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: Args) -> error::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.apply(Overrides {
        data_dir: args.data_dir,
        batch_size: args.batch_size,
        max_workers: args.max_workers,
        target_fps: args.target_fps,
        data_type: args.data_type,
        seed: args.seed,
        epochs: args.epochs,
        max_batches: args.max_batches,
        log_level: args.log_level,
    });
    Ok(config)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    app::init_logging(&config.logging);

    if let Err(e) = app::run(config) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
