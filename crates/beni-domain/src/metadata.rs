//! Dependency metadata from flit-style project files.
//!
//! `pyproject.toml` may carry the `[tool.flit.metadata]` table or the PEP 621
//! `[project]` table; older projects keep the same fields in `flit.ini`.
//! Extras are flattened into marker-guarded requirement strings the same way
//! flit writes `Requires-Dist`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use configparser::ini::Ini;
use toml_edit::{DocumentMut, Item, TableLike};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Importable module name of the package.
    pub module: String,
    pub requires_python: Option<String>,
    /// Requirement strings, extras expanded into `extra == "..."` markers.
    pub requires_dist: Vec<String>,
    pub provides_extra: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("{}: no flit metadata or [project] table found", path.display())]
    MissingMetadata { path: PathBuf },
    #[error("{}: `{key}` must be {expected}", path.display())]
    InvalidField {
        path: PathBuf,
        key: String,
        expected: &'static str,
    },
}

/// Reads and parses the metadata declared in `path`.
pub fn read_project_metadata(path: &Path) -> Result<ProjectMetadata> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let metadata = parse_project_metadata(&contents, path)?;
    tracing::trace!(
        path = %path.display(),
        extras = ?metadata.provides_extra,
        "parsed project metadata"
    );
    Ok(metadata)
}

/// Parses metadata from `contents`.
///
/// `path` picks the format (`.ini` files are read as `flit.ini`) and names
/// the file in error messages.
pub fn parse_project_metadata(contents: &str, path: &Path) -> Result<ProjectMetadata> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ini")) {
        return from_flit_ini(contents, path);
    }
    let doc: DocumentMut = contents
        .parse()
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let tool = doc.get("tool").and_then(Item::as_table_like);
    let flit_metadata = tool
        .and_then(|tool| tool.get("flit"))
        .and_then(Item::as_table_like)
        .and_then(|flit| flit.get("metadata"))
        .and_then(Item::as_table_like);
    if let Some(table) = flit_metadata {
        return from_flit_metadata(table, path);
    }

    if let Some(project) = doc.get("project").and_then(Item::as_table_like) {
        let module_override = tool
            .and_then(|tool| tool.get("flit"))
            .and_then(Item::as_table_like)
            .and_then(|flit| flit.get("module"))
            .and_then(Item::as_table_like)
            .and_then(|module| module.get("name"))
            .and_then(Item::as_str)
            .map(ToString::to_string);
        return from_project_table(project, module_override, path);
    }

    Err(MetadataError::MissingMetadata {
        path: path.to_path_buf(),
    }
    .into())
}

fn from_flit_metadata(table: &dyn TableLike, path: &Path) -> Result<ProjectMetadata> {
    let module = required_str(table, "module", path)?;
    let requires = string_list(table, "requires", path)?;
    let mut extras = extras_table(table, "requires-extra", path)?;
    let dev_requires = string_list(table, "dev-requires", path)?;
    if !dev_requires.is_empty() {
        extras.entry("dev".to_string()).or_default().extend(dev_requires);
    }
    Ok(assemble(
        module,
        optional_str(table, "requires-python", path)?,
        requires,
        extras,
    ))
}

type IniSection = HashMap<String, Option<String>>;

fn from_flit_ini(contents: &str, path: &Path) -> Result<ProjectMetadata> {
    let mut ini = Ini::new_cs();
    ini.set_multiline(true);
    // `;` separates requirement markers, so only `#` starts a comment
    ini.set_comment_symbols(&['#']);
    let sections = ini
        .read(contents.to_string())
        .map_err(|err| anyhow!("failed to parse {}: {err}", path.display()))?;

    let Some(metadata) = sections.get("metadata") else {
        return Err(MetadataError::MissingMetadata {
            path: path.to_path_buf(),
        }
        .into());
    };
    let module = ini_value(metadata, "module").ok_or_else(|| invalid(path, "module", "a string"))?;
    let mut extras: BTreeMap<String, Vec<String>> = sections
        .get("metadata.requires-extra")
        .map(|section| {
            section
                .iter()
                .map(|(extra, value)| (extra.clone(), ini_lines(value.as_deref())))
                .collect()
        })
        .unwrap_or_default();
    let dev_requires = ini_lines(ini_value(metadata, "dev-requires").as_deref());
    if !dev_requires.is_empty() {
        extras.entry("dev".to_string()).or_default().extend(dev_requires);
    }
    Ok(assemble(
        module,
        ini_value(metadata, "requires-python"),
        ini_lines(ini_value(metadata, "requires").as_deref()),
        extras,
    ))
}

fn ini_value(section: &IniSection, key: &str) -> Option<String> {
    section
        .get(key)
        .cloned()
        .flatten()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// Multi-line ini values hold one requirement per line.
fn ini_lines(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn from_project_table(
    project: &dyn TableLike,
    module_override: Option<String>,
    path: &Path,
) -> Result<ProjectMetadata> {
    let module = match module_override {
        Some(module) => module,
        None => required_str(project, "name", path)?.replace('-', "_"),
    };
    Ok(assemble(
        module,
        optional_str(project, "requires-python", path)?,
        string_list(project, "dependencies", path)?,
        extras_table(project, "optional-dependencies", path)?,
    ))
}

fn assemble(
    module: String,
    requires_python: Option<String>,
    requires: Vec<String>,
    extras: BTreeMap<String, Vec<String>>,
) -> ProjectMetadata {
    let mut requires_dist = requires;
    for (extra, specs) in &extras {
        requires_dist.extend(specs.iter().map(|spec| gate_on_extra(spec, extra)));
    }
    ProjectMetadata {
        module,
        requires_python,
        requires_dist,
        provides_extra: extras.into_keys().collect(),
    }
}

fn gate_on_extra(spec: &str, extra: &str) -> String {
    match spec.split_once(';') {
        Some((head, marker)) => format!(
            "{} ; extra == \"{extra}\" and ({})",
            head.trim(),
            marker.trim()
        ),
        None => format!("{} ; extra == \"{extra}\"", spec.trim()),
    }
}

fn invalid(path: &Path, key: &str, expected: &'static str) -> anyhow::Error {
    MetadataError::InvalidField {
        path: path.to_path_buf(),
        key: key.to_string(),
        expected,
    }
    .into()
}

fn required_str(table: &dyn TableLike, key: &str, path: &Path) -> Result<String> {
    optional_str(table, key, path)?.ok_or_else(|| invalid(path, key, "a string"))
}

fn optional_str(table: &dyn TableLike, key: &str, path: &Path) -> Result<Option<String>> {
    match table.get(key) {
        None => Ok(None),
        Some(item) => item
            .as_str()
            .map(|value| Some(value.trim().to_string()))
            .ok_or_else(|| invalid(path, key, "a string")),
    }
}

fn string_list(table: &dyn TableLike, key: &str, path: &Path) -> Result<Vec<String>> {
    let Some(item) = table.get(key) else {
        return Ok(Vec::new());
    };
    item_strings(item).ok_or_else(|| invalid(path, key, "an array of strings"))
}

fn item_strings(item: &Item) -> Option<Vec<String>> {
    item.as_array()?
        .iter()
        .map(|value| value.as_str().map(|s| s.trim().to_string()))
        .collect()
}

fn extras_table(
    table: &dyn TableLike,
    key: &str,
    path: &Path,
) -> Result<BTreeMap<String, Vec<String>>> {
    let Some(item) = table.get(key) else {
        return Ok(BTreeMap::new());
    };
    let Some(extras) = item.as_table_like() else {
        return Err(invalid(path, key, "a table of string arrays"));
    };
    let mut map = BTreeMap::new();
    for (extra, specs) in extras.iter() {
        let specs = item_strings(specs)
            .ok_or_else(|| invalid(path, &format!("{key}.{extra}"), "an array of strings"))?;
        map.insert(extra.to_string(), specs);
    }
    Ok(map)
}
