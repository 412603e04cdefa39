//! sysled CLI: probe and drive phone notification LEDs through sysfs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag, cleared by the Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "sysled",
    version,
    about = "Probe and drive phone notification LEDs through sysfs"
)]
struct Args {
    /// Output as JSON (for probe, set, backends, config)
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Resolve sysfs paths below this directory (fake sysfs trees)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log probing and sysfs writes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    let opts = cli::Options {
        json: args.json,
        config: args.config,
        root: args.root,
    };
    if let Err(e) = cli::run(args.command, &opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
