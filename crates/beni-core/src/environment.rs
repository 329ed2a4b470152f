use std::collections::BTreeSet;

use beni_domain::{normalize_name, MarkerEnvironment, Requirement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mapping::EcosystemMapper;

pub const CONDA_FORGE: &str = "conda-forge";

/// A conda `environment.yml` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub name: String,
    pub channels: Vec<String>,
    pub dependencies: Vec<EnvironmentDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentDependency {
    Package(String),
    Pip { pip: Vec<String> },
}

/// Which requirements survive filtering for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct RequirementFilter<'a> {
    pub active_extras: &'a BTreeSet<String>,
    pub marker_env: &'a MarkerEnvironment,
    /// Modules of the projects being converted; never emitted.
    pub own_modules: &'a [String],
    pub ignore: &'a [String],
}

impl RequirementFilter<'_> {
    #[must_use]
    pub fn apply(&self, requirements: &[Requirement]) -> Vec<Requirement> {
        let excluded: BTreeSet<String> = self
            .own_modules
            .iter()
            .chain(self.ignore)
            .map(|name| normalize_name(name))
            .collect();
        requirements
            .iter()
            .filter(|req| {
                let name = req.normalized_name();
                if excluded.contains(&name) {
                    debug!(%name, "skipping excluded requirement");
                    return false;
                }
                let active = req.is_active(self.active_extras, self.marker_env);
                if !active {
                    debug!(requirement = %req, "requirement inactive for selected extras");
                }
                active
            })
            .cloned()
            .collect()
    }
}

/// Builds a conda environment for `requirements`.
///
/// Requirements found on conda-forge become `{target}{specifier}` entries;
/// the rest are installed by pip after `flit`.
pub fn generate_environment(
    name: &str,
    python_version: Option<&str>,
    requirements: &[Requirement],
    mapper: &EcosystemMapper,
) -> EnvironmentSpec {
    let mut packages = BTreeSet::from(["pip".to_string()]);
    packages.insert(match python_version {
        Some(spec) if !spec.trim().is_empty() => format!("python{}", spec.trim()),
        _ => "python".to_string(),
    });

    let mut pip = vec!["flit".to_string()];
    for req in requirements {
        let target = match &req.url {
            Some(_) => None,
            None => mapper.resolve(&req.name),
        };
        match target {
            Some(target) => {
                packages.insert(format!("{target}{}", req.specifier));
            }
            None => {
                let line = match &req.url {
                    Some(url) => format!("{} @ {url}", req.name),
                    None => format!("{}{}", req.name, req.specifier),
                };
                if !pip.contains(&line) {
                    pip.push(line);
                }
            }
        }
    }

    let mut dependencies = Vec::with_capacity(packages.len() + 1);
    dependencies.push(EnvironmentDependency::Pip { pip });
    dependencies.extend(packages.into_iter().map(EnvironmentDependency::Package));
    EnvironmentSpec {
        name: name.to_string(),
        channels: vec![CONDA_FORGE.to_string()],
        dependencies,
    }
}

/// Renders `requirements` as plain PEP 508 lines with extra clauses removed.
#[must_use]
pub fn generate_plain(requirements: &[Requirement]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    requirements
        .iter()
        .map(|req| req.strip_extra_clause().to_string())
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use beni_domain::host_marker_environment;

    use super::*;

    fn req(spec: &str) -> Requirement {
        spec.parse().expect("valid requirement")
    }

    fn marker_env() -> MarkerEnvironment {
        host_marker_environment("3.11").expect("marker environment")
    }

    fn knows(names: &[&str]) -> EcosystemMapper {
        EcosystemMapper::new(names.iter().map(|n| (*n).to_string()), Vec::new())
    }

    fn tail(spec: &EnvironmentSpec) -> BTreeSet<String> {
        spec.dependencies[1..]
            .iter()
            .map(|dep| match dep {
                EnvironmentDependency::Package(name) => name.clone(),
                EnvironmentDependency::Pip { pip } => format!("pip: {pip:?}"),
            })
            .collect()
    }

    fn packages(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn package_known_to_conda_forge_is_a_dependency() {
        let env = generate_environment(
            "wants-rdkit",
            Some("=3.7"),
            &[req("rdkit")],
            &knows(&["rdkit"]),
        );
        assert_eq!(env.name, "wants-rdkit");
        assert_eq!(env.channels, vec!["conda-forge"]);
        assert_eq!(
            env.dependencies[0],
            EnvironmentDependency::Pip {
                pip: vec!["flit".to_string()]
            }
        );
        assert_eq!(tail(&env), packages(&["python=3.7", "pip", "rdkit"]));
    }

    #[test]
    fn unknown_package_is_installed_by_pip() {
        let env = generate_environment("wants-beni", None, &[req("beni")], &knows(&[]));
        assert_eq!(
            env.dependencies[0],
            EnvironmentDependency::Pip {
                pip: vec!["flit".to_string(), "beni".to_string()]
            }
        );
        assert_eq!(tail(&env), packages(&["python", "pip"]));
    }

    #[test]
    fn specifiers_are_carried_verbatim() {
        let mapper = EcosystemMapper::new(
            vec!["numpy".to_string()],
            vec![("torch".to_string(), "pytorch".to_string())],
        );
        let env = generate_environment(
            "demo",
            Some(">=3.8"),
            &[req("numpy>=1.20"), req("torch==2.1.0"), req("left-pad<2")],
            &mapper,
        );
        assert_eq!(
            env.dependencies[0],
            EnvironmentDependency::Pip {
                pip: vec!["flit".to_string(), "left-pad<2".to_string()]
            }
        );
        assert_eq!(
            tail(&env),
            packages(&["pip", "python>=3.8", "numpy>=1.20", "pytorch==2.1.0"])
        );
    }

    #[test]
    fn url_requirements_go_to_pip() {
        let env = generate_environment(
            "demo",
            None,
            &[req("rdkit @ https://example.com/rdkit.whl")],
            &knows(&["rdkit"]),
        );
        assert_eq!(
            env.dependencies[0],
            EnvironmentDependency::Pip {
                pip: vec![
                    "flit".to_string(),
                    "rdkit @ https://example.com/rdkit.whl".to_string()
                ]
            }
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let mapper = knows(&["numpy", "pyyaml"]);
        let reqs = [req("numpy"), req("pyyaml>=5"), req("beni")];
        let first = generate_environment("demo", Some(">=3.7"), &reqs, &mapper);
        let second = generate_environment("demo", Some(">=3.7"), &reqs, &mapper);
        assert_eq!(first, second);
    }

    #[test]
    fn serializes_as_environment_yaml() -> anyhow::Result<()> {
        let env = generate_environment("wants-beni", None, &[req("beni")], &knows(&[]));
        let yaml = serde_yaml::to_string(&env)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml)?;
        assert_eq!(value["name"].as_str(), Some("wants-beni"));
        assert_eq!(value["channels"][0].as_str(), Some("conda-forge"));
        assert_eq!(value["dependencies"][0]["pip"][1].as_str(), Some("beni"));
        assert_eq!(value["dependencies"][1].as_str(), Some("pip"));
        let back: EnvironmentSpec = serde_yaml::from_str(&yaml)?;
        assert_eq!(back, env);
        Ok(())
    }

    #[test]
    fn filter_excludes_own_modules_and_ignored_names() {
        let reqs = [
            req("Beni_Core>=1"),
            req("numpy"),
            req("PyYAML"),
            req(r#"pytest ; extra == "test""#),
        ];
        let extras = BTreeSet::from(["test".to_string()]);
        let env = marker_env();
        let own = ["beni_core".to_string()];
        let ignore = ["pyyaml".to_string()];
        let kept = RequirementFilter {
            active_extras: &extras,
            marker_env: &env,
            own_modules: &own,
            ignore: &ignore,
        }
        .apply(&reqs);
        let names: Vec<_> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["numpy", "pytest"]);
    }

    #[test]
    fn filter_drops_inactive_extras() {
        let reqs = [
            req("numpy"),
            req(r#"sphinx ; extra == "doc""#),
            req(r#"importlib-metadata ; python_version >= "3.8""#),
        ];
        let env = marker_env();
        let none = BTreeSet::new();
        let kept = RequirementFilter {
            active_extras: &none,
            marker_env: &env,
            own_modules: &[],
            ignore: &[],
        }
        .apply(&reqs);
        assert_eq!(kept, vec![req("numpy")]);
    }

    #[test]
    fn plain_output_strips_extra_clauses() {
        let lines = generate_plain(&[
            req("numpy>=1.20"),
            req(r#"sphinx>=3 ; extra == "doc""#),
            req(r#"pywin32 ; extra == "dev" and (sys_platform == "win32")"#),
            req("numpy>=1.20"),
        ]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "numpy>=1.20");
        assert_eq!(lines[1], "sphinx>=3");
        assert_eq!(
            lines[2],
            req(r#"pywin32 ; sys_platform == "win32""#).to_string()
        );
    }
}
