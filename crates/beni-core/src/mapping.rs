//! PyPI name to conda-forge name resolution.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};
use beni_domain::normalize_name;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::fetch::CachedFetcher;

#[derive(Debug, Deserialize)]
struct GraphDocument {
    nodes: Vec<GraphNode>,
}

#[derive(Debug, Deserialize)]
struct GraphNode {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappingDocument {
    Keyed(BTreeMap<String, MappingEntry>),
    Listed(Vec<MappingEntry>),
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    #[serde(default)]
    pypi_name: Option<String>,
    #[serde(default)]
    conda_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EcosystemMapper {
    cf_pkgs: HashSet<String>,
    pypi2cf: HashMap<String, String>,
}

impl EcosystemMapper {
    /// Fetches the feedstock graph and the PyPI mapping through `fetcher`.
    pub fn build(fetcher: &CachedFetcher<'_>, graph_url: &Url, mapping_url: &Url) -> Result<Self> {
        let graph = fetcher
            .fetch(graph_url)
            .with_context(|| format!("failed to load package graph from {graph_url}"))?;
        let mapping = fetcher
            .fetch(mapping_url)
            .with_context(|| format!("failed to load name mapping from {mapping_url}"))?;
        Self::from_documents(&graph, &mapping)
    }

    pub fn from_documents(graph: &[u8], mapping: &[u8]) -> Result<Self> {
        let graph: GraphDocument =
            serde_json::from_slice(graph).context("invalid package graph document")?;
        let mapping: MappingDocument =
            serde_yaml::from_slice(mapping).context("invalid name mapping document")?;

        let entries: Vec<(String, MappingEntry)> = match mapping {
            MappingDocument::Keyed(map) => map.into_iter().collect(),
            MappingDocument::Listed(list) => list
                .into_iter()
                .filter_map(|entry| entry.pypi_name.clone().map(|name| (name, entry)))
                .collect(),
        };

        let mut pypi2cf = HashMap::with_capacity(entries.len());
        for (key, entry) in entries {
            let Some(conda_name) = entry.conda_name else {
                continue;
            };
            let pypi_name = entry.pypi_name.unwrap_or(key);
            pypi2cf.insert(normalize_name(&pypi_name), conda_name);
        }

        let mapper = Self::new(graph.nodes.into_iter().map(|node| node.id), pypi2cf);
        debug!(
            packages = mapper.cf_pkgs.len(),
            overrides = mapper.pypi2cf.len(),
            "loaded ecosystem mapping"
        );
        Ok(mapper)
    }

    /// `overrides` keys are normalized; target names are kept as given.
    pub fn new(
        targets: impl IntoIterator<Item = String>,
        overrides: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            cf_pkgs: targets.into_iter().map(|id| normalize_name(&id)).collect(),
            pypi2cf: overrides
                .into_iter()
                .map(|(pypi, conda)| (normalize_name(&pypi), conda))
                .collect(),
        }
    }

    /// The conda-forge name for `name`, if there is one.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        let normalized = normalize_name(name);
        if let Some(mapped) = self.pypi2cf.get(&normalized) {
            debug!(%name, target = %mapped, "resolved via mapping");
            return Some(mapped.clone());
        }
        if self.cf_pkgs.contains(&normalized) {
            debug!(%name, "resolved as conda-forge package");
            return Some(normalized);
        }
        debug!(%name, "not found on conda-forge");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "directed": true,
        "graph": {},
        "nodes": [{"id": "numpy"}, {"id": "pyyaml"}, {"id": "typing_extensions"}, {"id": "rdkit"}],
        "links": []
    }"#;

    const MAPPING: &str = "\
pyyaml:
  conda_name: pyyaml
  import_name: yaml
  mapping_source: regro-bot
  pypi_name: PyYAML
typing-extensions:
  conda_name: typing_extensions
  import_name: typing_extensions
  mapping_source: static
  pypi_name: typing-extensions
torch:
  conda_name: pytorch
  import_name: torch
  mapping_source: static
  pypi_name: torch
";

    fn mapper() -> EcosystemMapper {
        EcosystemMapper::from_documents(GRAPH.as_bytes(), MAPPING.as_bytes()).expect("documents")
    }

    #[test]
    fn override_beats_direct_hit() {
        let mapper = mapper();
        assert_eq!(mapper.resolve("typing_extensions").as_deref(), Some("typing_extensions"));
        assert_eq!(mapper.resolve("torch").as_deref(), Some("pytorch"));
        assert_eq!(mapper.resolve("PyYAML").as_deref(), Some("pyyaml"));
    }

    #[test]
    fn direct_hit_returns_normalized_name() {
        let mapper = EcosystemMapper::new(vec!["NumPy".to_string()], Vec::new());
        assert_eq!(mapper.resolve("numpy").as_deref(), Some("numpy"));
        assert_eq!(mapper.resolve("NUMPY").as_deref(), Some("numpy"));
    }

    #[test]
    fn unknown_package_is_not_found() {
        assert_eq!(mapper().resolve("beni"), None);
    }

    #[test]
    fn override_wins_even_when_name_is_a_target() {
        let mapper = EcosystemMapper::new(
            vec!["tables".to_string(), "pytables".to_string()],
            vec![("tables".to_string(), "pytables".to_string())],
        );
        assert_eq!(mapper.resolve("tables").as_deref(), Some("pytables"));
    }

    #[test]
    fn list_shaped_mapping_is_accepted() -> Result<()> {
        let listed = "\
- pypi_name: msgpack
  conda_name: msgpack-python
  import_name: msgpack
  mapping_source: static
- conda_name: orphan
";
        let mapper = EcosystemMapper::from_documents(GRAPH.as_bytes(), listed.as_bytes())?;
        assert_eq!(mapper.resolve("msgpack").as_deref(), Some("msgpack-python"));
        assert_eq!(mapper.resolve("orphan"), None);
        Ok(())
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(EcosystemMapper::from_documents(b"[1, 2", MAPPING.as_bytes()).is_err());
        assert!(EcosystemMapper::from_documents(GRAPH.as_bytes(), b"- [unclosed").is_err());
    }
}
