use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use glacier_tiles::cli::{Args, Command};
use glacier_tiles::commands;
use glacier_tiles::Result;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Set thread pool size if specified
    if let Some(n_threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
        {
            warn!("Could not size thread pool ({}), using the default", e);
        } else {
            info!("Using {} threads", n_threads);
        }
    }

    match &args.command {
        Command::Patches(patches) => {
            info!("=== Patch generation ===");
            commands::run_patches(patches)?;
        }
        Command::Predict(predict) => {
            info!("=== Full image inference ===");
            commands::run_predict(predict)?;
        }
        Command::Area(area) => {
            info!("=== Glacier area by year ===");
            commands::run_area(area)?;
        }
    }

    info!("=== Done! ===");
    Ok(())
}
