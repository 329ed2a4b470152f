#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Pure dependency-metadata logic for beni: package-name normalization,
//! PEP 508 requirements and markers, extras selection, and flit/PEP 621
//! metadata loading. Nothing in this crate touches the network.

pub mod extras;
pub mod marker;
pub mod metadata;
pub mod normalize;
pub mod requirement;

pub use extras::{select_extras, DependencyMode, DEVELOP_EXTRAS};
pub use marker::{
    evaluate_with_extra, host_marker_environment, is_extra_clause, strip_extra_clause,
    InterpreterEnv, MarkerEnvironment, MarkerTree, FALLBACK_PYTHON_VERSION,
};
pub use metadata::{
    parse_project_metadata, read_project_metadata, MetadataError, ProjectMetadata,
};
pub use normalize::normalize_name;
pub use requirement::Requirement;
