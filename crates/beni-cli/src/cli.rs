use std::path::PathBuf;

use beni_core::{DependencyMode, OutputFormat};
use clap::{value_parser, ArgAction, Parser, ValueEnum};

pub const BENI_AFTER_HELP: &str = concat!(
    "Examples:\n",
    "  beni pyproject.toml > environment.yml\n",
    "  beni pyproject.toml --deps production\n",
    "  beni pyproject.toml --extras dev,test --ignore pytest-mypy\n",
    "  beni pyproject.toml --format pip > requirements.txt\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "beni",
    author,
    version,
    about = "Generate a conda environment.yml from flit/pyproject metadata",
    after_help = BENI_AFTER_HELP
)]
pub struct BeniCli {
    #[arg(
        value_name = "PYPROJECT",
        required = true,
        num_args = 1..,
        help = "pyproject.toml files with flit or [project] metadata"
    )]
    pub paths: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Conda, help = "Output format")]
    pub format: FormatArg,
    #[arg(
        long,
        value_enum,
        default_value_t = DepsArg::Extras,
        help = "Which dependency groups to include"
    )]
    pub deps: DepsArg,
    #[arg(
        long,
        value_name = "EXTRA",
        value_delimiter = ',',
        help = "Comma-separated extras to include with --deps extras (`all` selects every extra)"
    )]
    pub extras: Vec<String>,
    #[arg(
        long,
        value_name = "NAME",
        num_args = 1..,
        action = ArgAction::Append,
        help = "Package names to leave out of the output"
    )]
    pub ignore: Vec<String>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for cached conda-forge documents (overrides BENI_CACHE_PATH)"
    )]
    pub cache_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = value_parser!(u64),
        help = "Refetch cached documents older than this (default 3600)"
    )]
    pub max_age: Option<u64>,
    #[arg(long, help = "Only use cached documents; fail if one is missing")]
    pub offline: bool,
    #[arg(short, long, help = "Only log errors")]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Conda,
    Pip,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Conda => OutputFormat::Conda,
            FormatArg::Pip => OutputFormat::Pip,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsArg {
    All,
    Production,
    Develop,
    Extras,
}

impl From<DepsArg> for DependencyMode {
    fn from(value: DepsArg) -> Self {
        match value {
            DepsArg::All => DependencyMode::All,
            DepsArg::Production => DependencyMode::Production,
            DepsArg::Develop => DependencyMode::Develop,
            DepsArg::Extras => DependencyMode::Extras,
        }
    }
}
