use clap::Parser;
use statarb::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
