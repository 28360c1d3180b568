use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "xtasks")]
#[command(about = "Run project tasks using rust instead of scripts")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Builds the admintable binary and installs it at the given path
    Install(InstallArgs),
    /// Run formatting, clippy and the test suite
    Lint(LintArgs),
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Directory to install the binary to (defaults to ~/.local/bin)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct LintArgs {
    /// Apply formatting and clippy suggestions instead of only checking
    #[arg(long)]
    pub fix: bool,

    /// Skip cargo fmt
    #[arg(long)]
    pub no_fmt: bool,

    /// Skip cargo clippy
    #[arg(long)]
    pub no_clippy: bool,

    /// Skip cargo test
    #[arg(long)]
    pub no_test: bool,

    /// Print the output of passing steps too
    #[arg(short, long)]
    pub verbose: bool,
}
