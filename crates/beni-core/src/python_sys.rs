use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use beni_domain::{InterpreterEnv, MarkerEnvironment};
use serde::de::DeserializeOwned;
use serde_json::from_slice;
use which::which;

const MARKER_SCRIPT: &str = r#"import json, os, platform, sys
impl_name = getattr(sys.implementation, "name", "cpython")
python_full = platform.python_version()
data = {
    "implementation_name": impl_name,
    "implementation_version": python_full,
    "os_name": os.name,
    "platform_machine": platform.machine(),
    "platform_python_implementation": platform.python_implementation(),
    "platform_release": platform.release(),
    "platform_system": platform.system(),
    "platform_version": platform.version(),
    "python_full_version": python_full,
    "python_version": f"{sys.version_info[0]}.{sys.version_info[1]}",
    "sys_platform": sys.platform,
}
print(json.dumps(data))
"#;

/// Finds the interpreter whose marker environment should be used.
///
/// `explicit` (from `BENI_RUNTIME_PYTHON`) is returned as-is; otherwise
/// `python3` then `python` are looked up on `PATH`.
pub fn detect_interpreter(explicit: Option<&str>) -> Result<String> {
    if let Some(explicit) = explicit {
        return Ok(explicit.to_string());
    }

    for candidate in ["python3", "python"] {
        if let Ok(path) = which(candidate) {
            return path
                .into_os_string()
                .into_string()
                .map_err(|_| anyhow!("non-utf8 path"));
        }
    }

    bail!("no python interpreter found; set BENI_RUNTIME_PYTHON")
}

/// Probes the marker environment reported by `python`.
pub fn detect_marker_environment(python: &str) -> Result<MarkerEnvironment> {
    probe_interpreter_env(python)?.to_marker_environment()
}

fn probe_interpreter_env(python: &str) -> Result<InterpreterEnv> {
    probe_python(python, MARKER_SCRIPT, "marker environment")
}

fn probe_python<T>(python: &str, script: &str, guide: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let cmd = Command::new(python)
        .arg("-c")
        .arg(script)
        .output()
        .with_context(|| format!("failed to probe {guide} via {python}"))?;
    if !cmd.status.success() {
        let stderr = String::from_utf8_lossy(&cmd.stderr);
        bail!("python {guide} probe failed: {stderr}");
    }
    from_slice(&cmd.stdout).context(format!("invalid {guide} payload"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_interpreter_is_trusted() -> Result<()> {
        assert_eq!(
            detect_interpreter(Some("/opt/python/bin/python3.11"))?,
            "/opt/python/bin/python3.11"
        );
        Ok(())
    }

    #[test]
    fn missing_interpreter_fails_to_probe() {
        let err = detect_marker_environment("/nonexistent/python").expect_err("no such binary");
        assert!(err.to_string().contains("failed to probe marker environment"));
    }

    #[test]
    fn probes_real_interpreter_when_available() -> Result<()> {
        let Ok(python) = detect_interpreter(None) else {
            return Ok(());
        };
        let Ok(probed) = probe_interpreter_env(&python) else {
            return Ok(());
        };
        assert!(probed.python_version.starts_with(char::is_numeric));
        assert!(probed.python_full_version.starts_with(&probed.python_version));
        let env = probed.to_marker_environment()?;
        assert_eq!(env.sys_platform, probed.sys_platform);
        Ok(())
    }
}
