pub mod build;
pub mod flush;
pub mod sdl;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use loomql_config::{BuildSettings, FileSource, SchemaDocuments, collect_documents};
use loomql_schema::models::ModelCreator;
use loomql_schema::{ArtifactStore, ModelCatalog, Schema, StorableSchema};

/// Build settings with every path resolved against the settings file's
/// directory.
pub struct Project {
    pub settings: BuildSettings,
}

impl Project {
    pub fn load(config: &Path) -> Result<Self> {
        let mut settings = BuildSettings::load(config)
            .with_context(|| format!("Failed to load settings from {}", config.display()))?;

        let root = config.parent().unwrap_or_else(|| Path::new(""));
        let resolve = |path: &PathBuf| if path.is_absolute() { path.clone() } else { root.join(path) };
        settings.schema.paths = settings.schema.paths.iter().map(resolve).collect();
        settings.schema.models = settings.schema.models.iter().map(resolve).collect();
        settings.store.dir = resolve(&settings.store.dir);
        Ok(Self { settings })
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::from_settings(&self.settings)
    }

    pub fn documents(&self) -> Result<SchemaDocuments> {
        let source = FileSource::new(self.settings.schema.paths.clone());
        collect_documents(&[&source]).context("Failed to load schema documents")
    }

    pub fn catalog(&self) -> Result<ModelCatalog> {
        let mut catalog = ModelCatalog::default();
        for path in &self.settings.schema.models {
            let loaded = ModelCatalog::from_file(path)
                .with_context(|| format!("Failed to load model catalog {}", path.display()))?;
            catalog.extend(loaded);
        }
        Ok(catalog)
    }

    /// Assembles and validates one schema key.
    pub fn compile(&self, key: &str, documents: &SchemaDocuments, catalog: &Arc<ModelCatalog>) -> Result<StorableSchema> {
        let mut schema = Schema::new(key).with_model_creator(Arc::clone(catalog) as Arc<dyn ModelCreator>);
        schema
            .apply_documents(documents)
            .with_context(|| format!("Failed to configure schema '{key}'"))?;
        schema.build().with_context(|| format!("Failed to build schema '{key}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_resolve_against_settings_dir() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("loomql.toml");
        std::fs::write(
            &config,
            "[schema]\npaths = [\"graphql\"]\nmodels = [\"/abs/models.toml\"]\n\n[store]\ndir = \"out\"\n",
        )
        .unwrap();

        let project = Project::load(&config).unwrap();
        assert_eq!(project.settings.schema.paths, vec![dir.path().join("graphql")]);
        assert_eq!(project.settings.schema.models, vec![PathBuf::from("/abs/models.toml")]);
        assert_eq!(project.store().root(), dir.path().join("out"));
    }

    #[test]
    fn test_compile_from_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("schema")).unwrap();
        std::fs::write(
            dir.path().join("schema/base.toml"),
            "[models.\"app.Article\"]\nfields = \"*\"\noperations = \"*\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("models.toml"),
            "[[model]]\nclass = \"app.Article\"\n\n[model.fields]\nTitle = \"String\"\n",
        )
        .unwrap();
        let config = dir.path().join("loomql.toml");
        std::fs::write(&config, "[schema]\nmodels = [\"models.toml\"]\n").unwrap();

        let project = Project::load(&config).unwrap();
        let documents = project.documents().unwrap();
        let catalog = Arc::new(project.catalog().unwrap());
        let schema = project.compile("default", &documents, &catalog).unwrap();
        assert!(schema.query().unwrap().field("readArticles").is_some());
        assert!(schema.exists("ArticleCreateInputType"));
    }
}
