mod args;
mod feedback;

use crate::args::{Args, Command};
use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    let res = match args.command {
        Command::Import { xlsx, store, title } => feedback::run_import(&xlsx, &store, title),
        Command::Provision(m) => feedback::run_provision(&m.master, &m.config, &m.store),
        Command::Aggregate {
            master,
            seed,
            out,
            reference,
        } => feedback::run_aggregate(
            &master.master,
            &master.config,
            &master.store,
            seed,
            out,
            reference,
        ),
    };

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
