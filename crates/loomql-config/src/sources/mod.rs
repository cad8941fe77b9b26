//! Configuration sources
//!
//! A source yields schema documents in a deterministic order. Files are the
//! only source the CLI uses; embedding applications can implement
//! [`DocumentSource`] to feed documents from elsewhere.

mod file;

pub use file::{DocumentFormat, FileSource};

use crate::Result;
use crate::merger::{SchemaDocument, SchemaDocuments};

/// Trait for schema document sources
pub trait DocumentSource {
    /// Name of this source (for logging and debugging)
    fn name(&self) -> &str;

    /// Load all documents from this source, in application order
    fn load(&self) -> Result<Vec<SchemaDocument>>;
}

/// Load every source in turn and group the documents by schema key.
pub fn collect_documents(sources: &[&dyn DocumentSource]) -> Result<SchemaDocuments> {
    let mut documents = SchemaDocuments::new();
    for source in sources {
        let loaded = source.load()?;
        tracing::debug!(source = source.name(), count = loaded.len(), "Loaded schema documents");
        for document in loaded {
            documents.push(document);
        }
    }
    Ok(documents)
}
