mod cli;
mod commands;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::Project;
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let project = Project::load(&cli.config)?;

    let level = cli.log_level.as_deref().unwrap_or(&project.settings.logging.level);
    observability::init_tracing_with_level(level);

    match &cli.command {
        Commands::Build(args) => commands::build::build(&project, args)?,
        Commands::Flush(args) => commands::flush::flush(&project, args)?,
        Commands::Status => commands::status::status(&project)?,
        Commands::Sdl(args) => commands::sdl::sdl(&project, args)?,
    }

    Ok(())
}
