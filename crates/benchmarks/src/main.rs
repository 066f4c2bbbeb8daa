//! Command-line entry point for PermForge.

use anyhow::Result;
use clap::Parser;
use permforge_compiler::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
