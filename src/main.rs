//! Entry point for the flowdecomp application.
//! Handles CLI parsing, logging setup, and dispatches to the batch commands.

use clap::Parser;
use flowdecomp::{
    cli::{Args, Command},
    commands, errors::Result,
    parallel::ParallelConfig,
    utils::{init_logging, write_run_log},
};

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("{e}");
    }

    if let Err(e) = run(&args) {
        log::error!("❌ {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if let Some(path) = &args.run_log {
        let argv: Vec<String> = std::env::args().collect();
        write_run_log(path, args.command.name(), &argv)?;
    }

    ParallelConfig::from_cli(args.threads).setup_global_pool()?;

    log::info!("Starting {}", args.command.name());
    match &args.command {
        Command::Decompose(a) => commands::run_decomposition(a)?,
        Command::Interpolate(a) => commands::run_interpolation(a)?,
        Command::Tile(a) => {
            commands::run_tile_conversion(a)?;
        }
        Command::Mask(a) => commands::run_topography_mask(a)?,
    }
    log::info!("Finished {}", args.command.name());

    Ok(())
}
