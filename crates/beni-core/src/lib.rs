#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod config;
mod context;
mod effects;
mod environment;
mod fetch;
mod generate;
mod mapping;
mod net;
mod progress;
mod python_sys;
mod store;

pub use crate::config::{
    CacheConfig, Config, ConfigOverrides, GlobalOptions, NetworkConfig, PythonConfig,
    SourceConfig, DEFAULT_GRAPH_URL, DEFAULT_MAPPING_URL, DEFAULT_MAX_AGE_SECS,
};
pub use crate::context::CommandContext;
pub use crate::effects::{Effects, PythonRuntime, SharedEffects, SystemEffects};
pub use crate::environment::{
    generate_environment, generate_plain, EnvironmentDependency, EnvironmentSpec,
    RequirementFilter, CONDA_FORGE,
};
pub use crate::fetch::{CachedFetcher, DocumentSource, FetchError, HttpDocumentSource};
pub use crate::generate::{generate, load_projects, GenerateRequest, OutputFormat, ProjectSet};
pub use crate::mapping::EcosystemMapper;
pub use crate::progress::ProgressReporter;
pub use crate::python_sys::{detect_interpreter, detect_marker_environment};
pub use crate::store::CacheLocation;

pub use beni_domain::{DependencyMode, Requirement};
