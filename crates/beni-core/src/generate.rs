use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use beni_domain::{read_project_metadata, select_extras, DependencyMode, Requirement};
use tracing::{debug, info};

use crate::context::CommandContext;
use crate::environment::{generate_environment, generate_plain, RequirementFilter};
use crate::mapping::EcosystemMapper;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Conda,
    Pip,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conda => "conda",
            Self::Pip => "pip",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub deps: DependencyMode,
    pub extras: Vec<String>,
    pub ignore: Vec<String>,
}

/// Metadata merged across every input document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectSet {
    /// Module of the first document; names the environment.
    pub name: String,
    /// Python constraint of the last document that declares one.
    pub python: Option<String>,
    pub requirements: Vec<Requirement>,
    pub own_modules: Vec<String>,
    pub extras: BTreeSet<String>,
}

pub fn load_projects(ctx: &CommandContext<'_>, paths: &[PathBuf]) -> Result<ProjectSet> {
    if paths.is_empty() {
        bail!("no project files given");
    }
    let mut progress = ctx.bar("Parsing configs", paths.len());
    let mut set = ProjectSet::default();
    for path in paths {
        let metadata = read_project_metadata(path)?;
        debug!(
            path = %path.display(),
            module = %metadata.module,
            requirements = metadata.requires_dist.len(),
            "loaded project metadata"
        );
        if set.own_modules.is_empty() {
            set.name.clone_from(&metadata.module);
        }
        set.own_modules.push(metadata.module);
        if metadata.requires_python.is_some() {
            set.python = metadata.requires_python;
        }
        for spec in &metadata.requires_dist {
            let requirement = spec
                .parse::<Requirement>()
                .with_context(|| format!("invalid requirement in {}", path.display()))?;
            set.requirements.push(requirement);
        }
        set.extras.extend(metadata.provides_extra);
        progress.increment();
    }
    progress.finish();
    Ok(set)
}

/// Runs a whole invocation and returns the document to print.
pub fn generate(ctx: &CommandContext<'_>, request: &GenerateRequest) -> Result<String> {
    let projects = load_projects(ctx, &request.paths)?;
    let active_extras = select_extras(request.deps, &request.extras, &projects.extras);
    debug!(
        deps = %request.deps,
        extras = ?active_extras,
        "selected extras"
    );

    let selected = RequirementFilter {
        active_extras: &active_extras,
        marker_env: ctx.marker_environment()?,
        own_modules: &projects.own_modules,
        ignore: &request.ignore,
    }
    .apply(&projects.requirements);

    match request.format {
        OutputFormat::Pip => {
            let mut lines = generate_plain(&selected).join("\n");
            if !lines.is_empty() {
                lines.push('\n');
            }
            Ok(lines)
        }
        OutputFormat::Conda => {
            let progress = ctx.bar("Resolving packages", 0);
            let sources = ctx.config().sources();
            let mapper =
                EcosystemMapper::build(&ctx.fetcher(), &sources.graph_url, &sources.mapping_url)?;
            let environment = generate_environment(
                &projects.name,
                projects.python.as_deref(),
                &selected,
                &mapper,
            );
            progress.finish();
            info!(
                name = %environment.name,
                dependencies = environment.dependencies.len(),
                "generated environment"
            );
            serde_yaml::to_string(&environment).context("failed to render environment.yml")
        }
    }
}
