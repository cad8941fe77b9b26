use anyhow::{Context, Result};
use loomql_schema::print_sdl;

use super::Project;
use crate::cli::SdlArgs;
use crate::output::print_success;

pub fn sdl(project: &Project, args: &SdlArgs) -> Result<()> {
    let artifact = project
        .store()
        .load(&args.schema)
        .with_context(|| format!("Run `loomql build` before printing schema '{}'", args.schema))?;
    let sdl = print_sdl(&artifact.types);

    match &args.output {
        Some(path) => {
            std::fs::write(path, sdl).with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => print!("{sdl}"),
    }
    Ok(())
}
