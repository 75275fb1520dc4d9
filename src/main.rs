use clap::Parser;
use jel::cli::{self, Options};
use log::LevelFilter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let options = Options::parse();

    let mut logger = env_logger::Builder::from_default_env();
    match options.verbose {
        // Messages from the `log` modifier are shown without RUST_LOG.
        0 => logger.filter_module("jel", LevelFilter::Info),
        1 => logger.filter_level(LevelFilter::Debug),
        _ => logger.filter_level(LevelFilter::Trace),
    };
    logger.init();

    match cli::run(&options) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
