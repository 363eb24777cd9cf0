//! The TOML configuration of the command line tool.
//!
//! ```toml
//! ontology = "ontology.ttl"
//! ambiguity_threshold = 10
//!
//! [[source]]
//! prefix = "http://ex.org/"
//! database = "KMS"
//!
//! [[source.table]]
//! name = "User"
//! csv = "kms/user.csv"
//! primary_key = "ID"
//! foreign_keys = [{ column = "DEPT_ID", references = "Department" }]
//! ```
//!
//! Relative paths are resolved against the directory of the configuration file.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediatorConfig {
    /// The federated ontology.
    pub ontology: PathBuf,
    /// The serialization format of the ontology. Guessed from the file extension by default.
    #[serde(default)]
    pub ontology_format: Option<String>,
    #[serde(default)]
    pub ambiguity_threshold: Option<usize>,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// The common prefix of all URIs of the source. Must end with `/`.
    pub prefix: String,
    pub database: String,
    #[serde(default, rename = "table")]
    pub tables: Vec<TableConfig>,
}

impl SourceConfig {
    /// The namespace the source is registered under.
    pub fn namespace(&self) -> String {
        format!("{}{}/", self.prefix, self.database)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,
    /// A CSV file with a header row.
    pub csv: PathBuf,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyConfig {
    pub column: String,
    pub references: String,
}

impl MediatorConfig {
    /// Reads the configuration at `path` and resolves its relative paths.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read the configuration {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid configuration {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    fn relative_to(mut self, base: &Path) -> Self {
        self.ontology = base.join(&self.ontology);
        for table in self.sources.iter_mut().flat_map(|s| s.tables.iter_mut()) {
            table.csv = base.join(&table.csv);
        }
        self
    }
}
