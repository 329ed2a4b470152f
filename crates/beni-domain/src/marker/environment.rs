use std::env::consts;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use pep508_rs::{MarkerEnvironment, StringVersion};
use serde::Deserialize;

/// Python version assumed when no interpreter can be probed.
pub const FALLBACK_PYTHON_VERSION: &str = "3.12";

/// Marker variables as an interpreter reports them, before version parsing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InterpreterEnv {
    pub implementation_name: String,
    pub implementation_version: String,
    pub os_name: String,
    pub platform_machine: String,
    pub platform_python_implementation: String,
    pub platform_release: String,
    pub platform_system: String,
    pub platform_version: String,
    pub python_full_version: String,
    pub python_version: String,
    pub sys_platform: String,
}

impl InterpreterEnv {
    /// Approximates the interpreter from the compiled target when no python
    /// is available to report the real values.
    #[must_use]
    pub fn from_host(python_version: &str) -> Self {
        let (os_name, sys_platform, platform_system) = match consts::OS {
            "windows" => ("nt", "win32", "Windows"),
            "macos" => ("posix", "darwin", "Darwin"),
            "linux" => ("posix", "linux", "Linux"),
            other => ("posix", other, other),
        };
        let platform_machine = match (consts::OS, consts::ARCH) {
            ("windows", "x86_64") => "AMD64",
            ("macos", "aarch64") => "arm64",
            (_, arch) => arch,
        };
        let python_full_version = if python_version.matches('.').count() >= 2 {
            python_version.to_string()
        } else {
            format!("{python_version}.0")
        };
        let python_version = python_version
            .splitn(3, '.')
            .take(2)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            implementation_name: "cpython".to_string(),
            implementation_version: python_full_version.clone(),
            os_name: os_name.to_string(),
            platform_machine: platform_machine.to_string(),
            platform_python_implementation: "CPython".to_string(),
            platform_release: String::new(),
            platform_system: platform_system.to_string(),
            platform_version: String::new(),
            python_full_version,
            python_version,
            sys_platform: sys_platform.to_string(),
        }
    }

    pub fn to_marker_environment(&self) -> Result<MarkerEnvironment> {
        Ok(MarkerEnvironment {
            implementation_name: self.implementation_name.clone(),
            implementation_version: string_version(
                &self.implementation_version,
                "implementation_version",
            )?,
            os_name: self.os_name.clone(),
            platform_machine: self.platform_machine.clone(),
            platform_python_implementation: self.platform_python_implementation.clone(),
            platform_release: self.platform_release.clone(),
            platform_system: self.platform_system.clone(),
            platform_version: self.platform_version.clone(),
            python_full_version: string_version(&self.python_full_version, "python_full_version")?,
            python_version: string_version(&self.python_version, "python_version")?,
            sys_platform: self.sys_platform.clone(),
        })
    }
}

/// Host-derived marker environment for `python_version`.
pub fn host_marker_environment(python_version: &str) -> Result<MarkerEnvironment> {
    InterpreterEnv::from_host(python_version).to_marker_environment()
}

fn string_version(value: &str, field: &str) -> Result<StringVersion> {
    StringVersion::from_str(value)
        .map_err(|err| anyhow!("`{value}` is not a valid PEP 440 version for `{field}`: {err}"))
}
