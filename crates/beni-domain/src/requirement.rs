use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use pep508_rs::{Requirement as PepRequirement, VersionOrUrl};

use crate::marker::{self, MarkerEnvironment, MarkerTree};
use crate::normalize::normalize_name;

/// A declared dependency: `name[extras]specifier ; marker`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub specifier: String,
    pub url: Option<String>,
    pub marker: Option<MarkerTree>,
}

impl Requirement {
    /// A requirement with a bare name and nothing else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            specifier: String::new(),
            url: None,
            marker: None,
        }
    }

    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the requirement applies under `active_extras`.
    ///
    /// Unmarked requirements always apply. A marked one applies only when
    /// its marker holds for at least one active extra, so with no active
    /// extras every marked requirement is dropped.
    #[must_use]
    pub fn is_active(&self, active_extras: &BTreeSet<String>, env: &MarkerEnvironment) -> bool {
        let Some(tree) = &self.marker else {
            return true;
        };
        active_extras
            .iter()
            .any(|extra| marker::evaluate_with_extra(tree, env, extra))
    }

    /// Copy of the requirement with any `extra == "..."` clause removed from
    /// its marker.
    #[must_use]
    pub fn strip_extra_clause(&self) -> Requirement {
        Requirement {
            marker: self
                .marker
                .as_ref()
                .and_then(marker::strip_extra_clause),
            ..self.clone()
        }
    }
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    fn from_str(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        let parsed = PepRequirement::from_str(trimmed)
            .map_err(|err| anyhow!("invalid requirement `{trimmed}`: {err}"))?;

        let (specifier, url) = match parsed.version_or_url.as_ref() {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => (
                specifiers
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                None,
            ),
            Some(VersionOrUrl::Url(url)) => (String::new(), Some(url.to_string())),
            None => (String::new(), None),
        };

        Ok(Self {
            name: declared_name(trimmed).unwrap_or_else(|| parsed.name.to_string()),
            extras: parsed.extras.iter().map(ToString::to_string).collect(),
            specifier,
            url,
            marker: parsed.marker,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        f.write_str(&self.specifier)?;
        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
            if let Some(marker) = &self.marker {
                write!(f, " ; {marker}")?;
            }
            return Ok(());
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

// Keeps the name as written, since pep508_rs hands back the normalized form.
fn declared_name(spec: &str) -> Option<String> {
    let end = spec
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        .map_or(spec.len(), |(idx, _)| idx);
    let name = &spec[..end];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
