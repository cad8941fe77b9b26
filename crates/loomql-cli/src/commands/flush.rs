use anyhow::Result;

use super::Project;
use crate::cli::FlushArgs;
use crate::output::print_success;

pub fn flush(project: &Project, args: &FlushArgs) -> Result<()> {
    let store = project.store();
    let keys = match &args.schema {
        Some(key) => vec![key.clone()],
        None => store.keys()?,
    };
    if keys.is_empty() {
        println!("Nothing to flush.");
        return Ok(());
    }

    for key in &keys {
        if args.stale {
            let removed = store.prune(key)?;
            print_success(&format!("Pruned {removed} stale artifact(s) of {key}"));
        } else {
            store.clear(key)?;
            print_success(&format!("Flushed {key}"));
        }
    }
    Ok(())
}
