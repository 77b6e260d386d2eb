//! systemconf CLI: check and install programs from one configuration file.

use clap::Parser;
use systemconf::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Err(e) = systemconf::cli::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
