use clap::Parser;
use std::process::ExitCode;

mod configuration;
mod error;
mod gpu;
mod heartbeat;
mod identity;
mod registry;
mod start;
mod utils;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Full path to the agent TOML config
    #[clap(short, long, value_parser, default_value = "agent.toml")]
    config: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match start::start(&args.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[gridpulse] {err}");
            ExitCode::FAILURE
        }
    }
}
