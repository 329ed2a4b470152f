use std::collections::BTreeSet;
use std::fmt;

/// Extras pulled in by [`DependencyMode::Develop`].
pub const DEVELOP_EXTRAS: [&str; 3] = ["dev", "doc", "test"];

/// Which optional-dependency groups a run should include.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DependencyMode {
    /// Every declared extra.
    All,
    /// No extras, only unconditional requirements.
    Production,
    /// The `dev`, `doc` and `test` extras.
    Develop,
    /// Exactly the requested extras, or all of them when none were requested.
    #[default]
    Extras,
}

impl DependencyMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Production => "production",
            Self::Develop => "develop",
            Self::Extras => "extras",
        }
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the extras whose gated requirements should be included.
///
/// A literal `all` among the requested extras overrides `mode`. Requested
/// extras are passed through even when no group by that name is declared.
pub fn select_extras(
    mode: DependencyMode,
    requested: &[String],
    known: &BTreeSet<String>,
) -> BTreeSet<String> {
    if requested.iter().any(|extra| extra == "all") {
        return known.clone();
    }
    match mode {
        DependencyMode::All => known.clone(),
        DependencyMode::Production => BTreeSet::new(),
        DependencyMode::Develop => DEVELOP_EXTRAS.iter().map(|e| (*e).to_string()).collect(),
        DependencyMode::Extras if requested.is_empty() => known.clone(),
        DependencyMode::Extras => requested.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn list(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn all_mode_returns_known_extras() {
        let known = set(&["dev", "doc", "plot"]);
        assert_eq!(select_extras(DependencyMode::All, &[], &known), known);
    }

    #[test]
    fn production_mode_is_empty_even_with_requests() {
        let known = set(&["dev", "doc"]);
        assert!(select_extras(DependencyMode::Production, &[], &known).is_empty());
        assert!(select_extras(DependencyMode::Production, &list(&["dev"]), &known).is_empty());
    }

    #[test]
    fn develop_mode_is_fixed() {
        let known = set(&["plot"]);
        assert_eq!(
            select_extras(DependencyMode::Develop, &list(&["plot"]), &known),
            set(&["dev", "doc", "test"])
        );
    }

    #[test]
    fn extras_mode_without_requests_matches_all() {
        let known = set(&["dev", "doc", "test"]);
        assert_eq!(
            select_extras(DependencyMode::Extras, &[], &known),
            select_extras(DependencyMode::All, &[], &known)
        );
    }

    #[test]
    fn extras_mode_passes_requests_through() {
        let known = set(&["dev", "doc"]);
        assert_eq!(
            select_extras(DependencyMode::Extras, &list(&["dev", "missing"]), &known),
            set(&["dev", "missing"])
        );
    }

    #[test]
    fn literal_all_overrides_every_mode() {
        let known = set(&["dev", "doc"]);
        for mode in [
            DependencyMode::All,
            DependencyMode::Production,
            DependencyMode::Develop,
            DependencyMode::Extras,
        ] {
            assert_eq!(select_extras(mode, &list(&["all"]), &known), known, "{mode}");
        }
    }

    #[test]
    fn default_mode_is_extras() {
        assert_eq!(DependencyMode::default(), DependencyMode::Extras);
        assert_eq!(DependencyMode::Production.to_string(), "production");
    }
}
