//! On-disk artifact store.
//!
//! Layout:
//!
//! ```text
//! {dir}/{key}/registry_{hash}.json   one artifact per content hash
//! {dir}/{key}/current                hash of the artifact in use
//! ```
//!
//! Both files are written to a temporary file in the same directory and
//! renamed into place, so a reader never sees a partial write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use loomql_config::BuildSettings;
use loomql_core::{Result, SchemaError, content_hash};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::factory::{EncoderRegistry, TypeFactory};
use crate::schema::{SchemaContext, StorableSchema};

pub const CURRENT_POINTER: &str = "current";

const REGISTRY_PREFIX: &str = "registry_";
const REGISTRY_SUFFIX: &str = ".json";

/// A persisted schema: context plus one factory per type, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaArtifact {
    pub key: String,
    pub hash: String,
    pub context: SchemaContext,
    pub types: Vec<TypeFactory>,
}

impl SchemaArtifact {
    pub fn get(&self, name: &str) -> Option<&TypeFactory> {
        self.types.iter().find(|ty| ty.name() == name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(TypeFactory::name)
    }
}

/// Result of [`ArtifactStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Written { hash: String, path: PathBuf },
    /// The current artifact already has this hash
    Unchanged { hash: String, path: PathBuf },
}

impl PersistOutcome {
    pub fn hash(&self) -> &str {
        match self {
            Self::Written { hash, .. } | Self::Unchanged { hash, .. } => hash,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Written { path, .. } | Self::Unchanged { path, .. } => path,
        }
    }
}

#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    salt: String,
    encoders: EncoderRegistry,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, salt: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            salt: salt.into(),
            encoders: EncoderRegistry::default(),
        }
    }

    pub fn from_settings(settings: &BuildSettings) -> Self {
        Self::new(&settings.store.dir, settings.store.salt.clone())
    }

    pub fn with_encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn registry_path(&self, key: &str, hash: &str) -> PathBuf {
        self.schema_dir(key).join(format!("{REGISTRY_PREFIX}{hash}{REGISTRY_SUFFIX}"))
    }

    /// Encodes a finalized schema and computes its content hash.
    pub fn artifact(&self, schema: &StorableSchema) -> Result<SchemaArtifact> {
        let types = self.encoders.encode_all(schema.types())?;
        let mut bytes = serde_json::to_vec(&types)?;
        bytes.extend_from_slice(self.salt.as_bytes());

        Ok(SchemaArtifact {
            key: schema.key().to_string(),
            hash: content_hash(&bytes),
            context: schema.context().clone(),
            types,
        })
    }

    /// Writes the artifact for `schema` and moves the `current` pointer to
    /// it. Older artifacts of the same key stay on disk for readers that
    /// resolved the previous pointer; [`ArtifactStore::prune`] removes them.
    pub fn persist(&self, schema: &StorableSchema) -> Result<PersistOutcome> {
        let artifact = self.artifact(schema)?;
        let key = artifact.key.clone();
        let hash = artifact.hash.clone();
        let path = self.registry_path(&key, &hash);

        if path.exists() && self.current_hash(&key)?.as_deref() == Some(hash.as_str()) {
            debug!(schema = %key, hash = %hash, "Artifact unchanged, skipping write");
            return Ok(PersistOutcome::Unchanged { hash, path });
        }

        let dir = self.schema_dir(&key);
        fs::create_dir_all(&dir)?;
        write_atomic(&dir, &path, &serde_json::to_vec_pretty(&artifact)?)?;
        write_atomic(&dir, &dir.join(CURRENT_POINTER), hash.as_bytes())?;

        info!(
            schema = %key,
            hash = %hash,
            types = artifact.types.len(),
            path = %path.display(),
            "Persisted schema artifact"
        );
        Ok(PersistOutcome::Written { hash, path })
    }

    /// Hash named by the `current` pointer, if one was written.
    pub fn current_hash(&self, key: &str) -> Result<Option<String>> {
        let pointer = self.schema_dir(key).join(CURRENT_POINTER);
        match fs::read_to_string(&pointer) {
            Ok(hash) => Ok(Some(hash.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a loadable artifact exists for `key`.
    pub fn exists(&self, key: &str) -> bool {
        matches!(self.current_hash(key), Ok(Some(hash)) if self.registry_path(key, &hash).is_file())
    }

    pub fn load(&self, key: &str) -> Result<SchemaArtifact> {
        let hash = self
            .current_hash(key)?
            .ok_or_else(|| SchemaError::reference(format!("No persisted schema for '{key}'")))?;
        let path = self.registry_path(key, &hash);
        if !path.is_file() {
            warn!(schema = %key, hash = %hash, "Current pointer names a missing artifact");
            return Err(SchemaError::reference(format!(
                "Persisted schema '{key}' points at missing artifact {}",
                path.display()
            )));
        }

        let artifact: SchemaArtifact = serde_json::from_slice(&fs::read(&path)?)?;
        if artifact.hash != hash || artifact.key != key {
            warn!(schema = %key, expected = %hash, found = %artifact.hash, "Artifact does not match pointer");
            return Err(SchemaError::validation(format!(
                "Artifact {} does not belong to schema '{key}' at hash {hash}",
                path.display()
            )));
        }
        debug!(schema = %key, hash = %hash, types = artifact.types.len(), "Loaded schema artifact");
        Ok(artifact)
    }

    /// Removes every artifact of `key`. Clearing an unknown key is a no-op.
    pub fn clear(&self, key: &str) -> Result<()> {
        let dir = self.schema_dir(key);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            info!(schema = %key, "Cleared persisted schema");
        }
        Ok(())
    }

    /// Schema keys with a `current` pointer, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(CURRENT_POINTER).is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes every artifact of `key` except the one `current` names.
    /// Returns how many files were removed.
    pub fn prune(&self, key: &str) -> Result<usize> {
        let Some(current) = self.current_hash(key)? else {
            return Ok(0);
        };
        let keep = format!("{REGISTRY_PREFIX}{current}{REGISTRY_SUFFIX}");
        let mut removed = 0;
        for entry in fs::read_dir(self.schema_dir(key))? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(REGISTRY_PREFIX) && name.ends_with(REGISTRY_SUFFIX) && name != keep {
                debug!(schema = %key, file = %name, "Removing stale artifact");
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(schema = %key, removed, "Pruned stale artifacts");
        }
        Ok(removed)
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| SchemaError::Io(e.error))?;
    Ok(())
}
