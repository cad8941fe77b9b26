use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use tracing::warn;

use super::Project;
use crate::output::{print_table, short_hash};

pub fn status(project: &Project) -> Result<()> {
    let documents = project.documents()?;
    let catalog = Arc::new(project.catalog()?);
    let store = project.store();

    let configured: BTreeSet<String> = documents.schema_keys().map(String::from).collect();
    let persisted: BTreeSet<String> = store.keys()?.into_iter().collect();

    let mut rows = Vec::new();
    for key in configured.union(&persisted) {
        let current = store.current_hash(key)?;
        let types = match store.load(key) {
            Ok(artifact) => artifact.types.len().to_string(),
            Err(_) => "-".to_string(),
        };

        let state = if !configured.contains(key) {
            "orphaned".yellow()
        } else {
            match project.compile(key, &documents, &catalog) {
                Err(e) => {
                    warn!(schema = %key, error = %format!("{e:#}"), "Schema does not compile");
                    "error".red()
                }
                Ok(schema) => match (&current, store.artifact(&schema)) {
                    (Some(current), Ok(fresh)) if *current == fresh.hash => "up to date".green(),
                    (Some(_), Ok(_)) => "stale".yellow(),
                    (None, _) => "not built".yellow(),
                    (_, Err(_)) => "error".red(),
                },
            }
        };

        rows.push([
            key.clone(),
            state.to_string(),
            current.as_deref().map(short_hash).unwrap_or_else(|| "-".into()),
            types,
        ]);
    }

    print_table(["Schema", "State", "Hash", "Types"], rows);
    Ok(())
}
