use clap::Parser;
use tracing::info;

use jobdeck::cli::SystemCli;
use jobdeck::config::Config;
use jobdeck::core::error::JobDeckError;
use jobdeck::core::store::FileJobStore;
use jobdeck::{logging, tui};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), JobDeckError> {
    let config = Config::from_cli(SystemCli::parse())?;
    logging::init(&config)?;
    info!(jobs = %config.jobs_path.display(), "starting jobdeck");

    let store = FileJobStore::new(config.jobs_path.clone());
    tui::run(&config, Box::new(store))
}
