use clap::Parser;
use trendfolio::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
