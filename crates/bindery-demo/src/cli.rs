#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually to keep the binary lean. `BINDERY_DEMO_DELAY_MS`
//! overrides the default delay; an explicit flag wins over the environment.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Bindery Demo: a loading screen bound to an observable view-model

USAGE:
    bindery-demo [OPTIONS]

OPTIONS:
    --delay-ms=N     Virtual delay before loading finishes (default: 250)
    --items=N        Items the simulated fetch returns (default: 3)
    --help, -h       Show this help message
    --version, -V    Show version

ENVIRONMENT:
    BINDERY_DEMO_DELAY_MS      Same as --delay-ms
    BINDERY_REBIND_POLICY      keep | reinit | reject
    BINDERY_MAX_NOTIFY_DEPTH   Nested notify limit
    RUST_LOG                   Log filter (e.g. bindery_runtime=debug)";

/// Parsed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Virtual milliseconds until the simulated fetch completes.
    pub delay_ms: u64,
    /// Number of items the fetch yields.
    pub items: u32,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            delay_ms: 250,
            items: 3,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse the process arguments, exiting on `--help`, `--version` or errors.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match parse_args(&args, |key| env::var(key).ok()) {
            Ok(Action::Run(opts)) => opts,
            Ok(Action::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Action::Version) => {
                println!("bindery-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("error: {msg}\n\n{HELP_TEXT}");
                process::exit(2);
            }
        }
    }
}

/// Parse `args` (without the program name), reading env overrides via `get_env`.
pub fn parse_args<F>(args: &[String], get_env: F) -> Result<Action, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut opts = Opts::default();
    if let Some(raw) = get_env("BINDERY_DEMO_DELAY_MS") {
        opts.delay_ms = parse_number(&raw, "BINDERY_DEMO_DELAY_MS")?;
    }

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Action::Help),
            "--version" | "-V" => return Ok(Action::Version),
            other => {
                if let Some(val) = other.strip_prefix("--delay-ms=") {
                    opts.delay_ms = parse_number(val, "--delay-ms")?;
                } else if let Some(val) = other.strip_prefix("--items=") {
                    opts.items = parse_number(val, "--items")?;
                } else {
                    return Err(format!("unknown argument '{other}'"));
                }
            }
        }
    }
    Ok(Action::Run(opts))
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{name} expects a number, got '{raw}'"))
}
