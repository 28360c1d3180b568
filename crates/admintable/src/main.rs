use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod error;
mod list;
mod prelude;
mod render;
mod shell;
mod store;
mod views;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Search, filter, sort and paginate admin record tables (pages, articles, blogs)"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Views file (defaults to <config dir>/admintable/views.toml, then the built-in views)
    #[clap(long, env = "ADMINTABLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "ADMINTABLE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List the configured views with their columns and filters
    Views(crate::views::ViewsOptions),

    /// Print one page of a view
    List(crate::list::ListOptions),

    /// Browse a view interactively
    Shell(crate::shell::ShellOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Views(options) => crate::views::run(options, app.global).await,
        SubCommands::List(options) => crate::list::run(options, app.global).await,
        SubCommands::Shell(options) => crate::shell::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
