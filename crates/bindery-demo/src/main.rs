#![forbid(unsafe_code)]

//! Bindery demo binary entry point.

mod app;
mod cli;

use bindery_core::BindConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = cli::Opts::parse();
    let config = match BindConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    match app::run(&opts, config) {
        Ok(transcript) => {
            for frame in transcript {
                println!("{frame}\n");
            }
        }
        Err(e) => {
            eprintln!("Demo failed: {e}");
            std::process::exit(1);
        }
    }
}
