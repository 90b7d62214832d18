use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nachtt::manager::Manager;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `config.toml`; dataset and output paths are relative to it.
    #[arg(long)]
    analysis_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plot the diurnal cycle figures.
    Diurnal,

    /// Plot the time-series figures.
    Timeseries,

    /// Extract peaks, write reports and plot one figure per peak window.
    Peaks,

    /// Remove every output declared in the configuration.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.analysis_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Diurnal => mgr.plot_diurnal()?,
        Command::Timeseries => mgr.plot_timeseries()?,
        Command::Peaks => mgr.analyze_peaks()?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
