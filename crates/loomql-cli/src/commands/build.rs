use std::sync::Arc;

use anyhow::{Result, bail};
use loomql_schema::PersistOutcome;
use tracing::info;

use super::Project;
use crate::cli::BuildArgs;
use crate::output::{print_success, print_unchanged, short_hash};

pub fn build(project: &Project, args: &BuildArgs) -> Result<()> {
    let documents = project.documents()?;
    let catalog = Arc::new(project.catalog()?);
    let store = project.store();

    let keys: Vec<String> = match &args.schema {
        Some(key) => {
            if documents.documents(key).is_empty() {
                bail!("No schema documents declare schema '{key}'");
            }
            vec![key.clone()]
        }
        None => documents.schema_keys().map(String::from).collect(),
    };
    if keys.is_empty() {
        bail!("No schema documents found");
    }
    info!(schemas = keys.len(), models = catalog.len(), "Building schemas");

    for key in &keys {
        let schema = project.compile(key, &documents, &catalog)?;
        if args.force {
            store.clear(key)?;
        }
        match store.persist(&schema)? {
            PersistOutcome::Written { hash, path } => print_success(&format!(
                "{key}: {} types written to {} ({})",
                schema.types().len(),
                path.display(),
                short_hash(&hash)
            )),
            PersistOutcome::Unchanged { hash, .. } => {
                print_unchanged(&format!("{key}: unchanged ({})", short_hash(&hash)))
            }
        }
    }
    Ok(())
}
