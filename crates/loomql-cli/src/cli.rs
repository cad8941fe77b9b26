use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loomql")]
#[command(about = "loomql - compile declarative GraphQL schemas")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Build settings file
    #[arg(short, long, global = true, env = "LOOMQL_CONFIG", default_value = "loomql.toml")]
    pub config: PathBuf,

    /// Log level (overrides [logging] level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile schema documents and persist the artifacts
    Build(BuildArgs),
    /// Remove persisted artifacts
    Flush(FlushArgs),
    /// Show configured and persisted schemas
    Status,
    /// Print the SDL of a persisted schema
    Sdl(SdlArgs),
}

#[derive(clap::Args)]
pub struct BuildArgs {
    /// Only build this schema key
    #[arg(short, long)]
    pub schema: Option<String>,
    /// Rewrite artifacts even when their hash is unchanged
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct FlushArgs {
    /// Schema key (all keys when omitted)
    #[arg(short, long)]
    pub schema: Option<String>,
    /// Only remove artifacts the `current` pointer no longer names
    #[arg(long)]
    pub stale: bool,
}

#[derive(clap::Args)]
pub struct SdlArgs {
    /// Schema key
    #[arg(short, long, default_value = "default")]
    pub schema: String,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
