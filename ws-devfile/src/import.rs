//! References to devfiles imported through `parent` or `plugin` blocks.

use crate::error::{DevfileError, Result};
use crate::parse::parse_devfile_yaml;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReference {
    /// `uri: <location>`
    Uri(String),
    /// `id: <name>` with optional `registryUrl` and `version`
    Registry {
        id: String,
        registry_url: Option<String>,
        version: Option<String>,
    },
}

impl ImportReference {
    /// Read the reference out of a `parent` or `plugin` block.
    pub fn from_block(block: &Map<String, Value>) -> Result<Self> {
        let uri = block.get("uri").and_then(Value::as_str);
        let id = block.get("id").and_then(Value::as_str);

        match (uri, id) {
            (Some(uri), None) => Ok(ImportReference::Uri(uri.to_string())),
            (None, Some(id)) => Ok(ImportReference::Registry {
                id: id.to_string(),
                registry_url: block
                    .get("registryUrl")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                version: block
                    .get("version")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            (Some(_), Some(_)) => Err(DevfileError::Flatten(
                "Import must declare only one of 'uri' or 'id'".to_string(),
            )),
            (None, None) => Err(DevfileError::Flatten(
                "Import must declare one of 'uri' or 'id'".to_string(),
            )),
        }
    }

    pub fn is_remote(&self) -> bool {
        match self {
            ImportReference::Uri(uri) => uri.starts_with("http://") || uri.starts_with("https://"),
            ImportReference::Registry { .. } => true,
        }
    }
}

impl fmt::Display for ImportReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportReference::Uri(uri) => write!(f, "{}", uri),
            ImportReference::Registry {
                id,
                registry_url,
                version,
            } => {
                write!(f, "{}", id)?;
                if let Some(version) = version {
                    write!(f, ":{}", version)?;
                }
                if let Some(registry_url) = registry_url {
                    write!(f, "@{}", registry_url)?;
                }
                Ok(())
            }
        }
    }
}

/// A document loaded for an import, with the location it was loaded from.
///
/// `location` identifies the document for cycle detection and is the base
/// the document's own relative imports are resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImport {
    pub location: String,
    pub document: Value,
}

/// Loads the document behind an [`ImportReference`].
///
/// `importer` is the location of the importing document, `None` for the
/// root devfile. Returns the parsed but unflattened document; the flattener
/// recurses into it.
pub trait ImportResolver {
    fn resolve(
        &self,
        importer: Option<&str>,
        reference: &ImportReference,
    ) -> std::result::Result<ResolvedImport, String>;

    /// Location of the root devfile, if it has one.
    fn root_location(&self) -> Option<String> {
        None
    }
}

/// Resolver over a fixed set of in-memory documents keyed by reference.
#[derive(Debug, Default, Clone)]
pub struct StaticImportResolver {
    documents: HashMap<String, Value>,
}

impl StaticImportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register YAML under the reference's display form.
    pub fn with_yaml(mut self, reference: &str, yaml: &str) -> Result<Self> {
        self.documents
            .insert(reference.to_string(), parse_devfile_yaml(yaml)?);
        Ok(self)
    }
}

impl ImportResolver for StaticImportResolver {
    fn resolve(
        &self,
        _importer: Option<&str>,
        reference: &ImportReference,
    ) -> std::result::Result<ResolvedImport, String> {
        let location = reference.to_string();
        let document = self
            .documents
            .get(&location)
            .cloned()
            .ok_or_else(|| "document not found".to_string())?;

        Ok(ResolvedImport { location, document })
    }
}
