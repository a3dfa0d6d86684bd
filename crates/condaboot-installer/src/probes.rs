use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use condaboot_core::PythonVersion;

pub fn detect_python_version(interpreter: &Path) -> Result<PythonVersion> {
    let output = Command::new(interpreter)
        .arg("-c")
        .arg("import sys; print('{}.{}'.format(sys.version_info[0], sys.version_info[1]))")
        .output()
        .with_context(|| format!("failed to run host interpreter: {}", interpreter.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "host interpreter version probe failed: status={} stderr='{}'",
            output.status,
            stderr.trim()
        ));
    }

    parse_version_probe_output(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_version_probe_output(raw: &str) -> Result<PythonVersion> {
    PythonVersion::parse(raw.trim())
        .with_context(|| format!("host interpreter reported an unexpected version: '{raw}'"))
}
